use rox::ast::{Expr, Stmt};
use rox::ast_printer::AstPrinter;
use rox::parser::Parser;
use rox::scanner::Scanner;

fn parse(source: &str) -> (Vec<Stmt>, Vec<String>) {
    let (tokens, lex_errors) = Scanner::scan_all(source);
    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

    let (statements, errors) = Parser::new(tokens).parse();
    (statements, errors.iter().map(|e| e.to_string()).collect())
}

fn expr(source: &str) -> Expr {
    let (tokens, _) = Scanner::scan_all(source);
    Parser::new(tokens)
        .parse_expression()
        .unwrap_or_else(|errors| panic!("parse failed: {:?}", errors))
}

fn prefix(source: &str) -> String {
    AstPrinter::print(&expr(source))
}

#[test]
fn binary_precedence_and_associativity() {
    assert_eq!(prefix("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
    assert_eq!(prefix("1 - 2 - 3"), "(- (- 1.0 2.0) 3.0)");
    assert_eq!(prefix("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
    assert_eq!(prefix("1 < 2 == 3 >= 4"), "(== (< 1.0 2.0) (>= 3.0 4.0))");
    assert_eq!(prefix("-!x"), "(- (! x))");
}

#[test]
fn logical_operators_bind_looser_than_equality() {
    assert_eq!(
        prefix("a or b and c == d"),
        "(or a (and b (== c d)))"
    );
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(prefix("a = b = 3"), "(= a (= b 3.0))");
}

#[test]
fn calls_and_property_chains() {
    assert_eq!(
        prefix("obj.method(1, \"two\").field"),
        "(. (call (. obj method) 1.0 two) field)"
    );
    assert_eq!(prefix("a.b.c = 1"), "(set (. a b) c 1.0)");
    assert_eq!(prefix("f()()"), "(call (call f))");
    assert_eq!(prefix("super.cook"), "(super cook)");
}

#[test]
fn for_loop_is_desugared_into_while() {
    let (statements, errors) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
    assert!(errors.is_empty());
    assert_eq!(statements.len(), 1);

    let Stmt::Block(outer) = &statements[0] else {
        panic!("expected block, got {:?}", statements[0]);
    };
    assert!(matches!(outer[0], Stmt::Var { .. }));

    let Stmt::While { condition, body } = &outer[1] else {
        panic!("expected while, got {:?}", outer[1]);
    };
    assert_eq!(AstPrinter::print(condition), "(< i 3.0)");

    let Stmt::Block(inner) = body.as_ref() else {
        panic!("expected body block, got {:?}", body);
    };
    assert!(matches!(inner[0], Stmt::Print(_)));
    assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
}

#[test]
fn empty_for_clauses_loop_forever_on_true() {
    let (statements, errors) = parse("for (;;) print 1;");
    assert!(errors.is_empty());

    let Stmt::While { condition, body } = &statements[0] else {
        panic!("expected bare while, got {:?}", statements[0]);
    };
    assert_eq!(AstPrinter::print(condition), "true");
    assert!(matches!(body.as_ref(), Stmt::Print(_)));
}

#[test]
fn class_declaration_with_superclass() {
    let (statements, errors) = parse("class B < A { init(x) { this.x = x; } get() { return this.x; } }");
    assert!(errors.is_empty());

    let Stmt::Class {
        name,
        superclass,
        methods,
    } = &statements[0]
    else {
        panic!("expected class");
    };

    assert_eq!(name.lexeme, "B");
    assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
    let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
    assert_eq!(names, vec!["init", "get"]);
    assert_eq!(methods[0].params.len(), 1);
}

#[test]
fn invalid_assignment_target_is_reported_without_unwinding() {
    let (statements, errors) = parse("a + b = c; print 1;");

    assert_eq!(errors, vec!["[line 1] Error at '=': Invalid assignment target."]);
    // Both statements still come out of the parser.
    assert_eq!(statements.len(), 2);
}

#[test]
fn recovers_and_reports_every_independent_error() {
    let source = "var = 1;\nprint ;\nvar ok = 2;\nfun (x) {}\n";
    let (statements, errors) = parse(source);

    assert_eq!(
        errors,
        vec![
            "[line 1] Error at '=': Expect variable name.",
            "[line 2] Error at ';': Expect expression.",
            "[line 4] Error at '(': Expect function name.",
        ]
    );
    assert_eq!(statements.len(), 1);
    assert!(matches!(&statements[0], Stmt::Var { name, .. } if name.lexeme == "ok"));
}

#[test]
fn error_at_end_of_input() {
    let (_, errors) = parse("print 1");
    assert_eq!(errors, vec!["[line 1] Error at end: Expect ';' after value."]);
}

#[test]
fn missing_brace_inside_block_is_reported() {
    let (_, errors) = parse("{ print 1;");
    assert_eq!(errors, vec!["[line 1] Error at end: Expect '}' after block."]);
}

#[test]
fn super_requires_a_method_name() {
    let (_, errors) = parse("super;");
    assert_eq!(errors, vec!["[line 1] Error at ';': Expect '.' after 'super'."]);
}

#[test]
fn too_many_arguments_is_reported_but_parsing_continues() {
    let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
    let source = format!("f({});\nprint 1;", args.join(", "));
    let (statements, errors) = parse(&source);

    assert_eq!(
        errors,
        vec!["[line 1] Error at '255': Can't have more than 255 arguments."]
    );
    assert_eq!(statements.len(), 2);
}

#[test]
fn too_many_parameters_is_reported() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));
    let (statements, errors) = parse(&source);

    assert_eq!(
        errors,
        vec!["[line 1] Error at 'p255': Can't have more than 255 parameters."]
    );
    assert_eq!(statements.len(), 1);
}

#[test]
fn identical_references_get_distinct_ids() {
    let (statements, _) = parse("a; a;");

    let ids: Vec<_> = statements
        .iter()
        .map(|stmt| match stmt {
            Stmt::Expression(Expr::Variable { id, .. }) => *id,
            other => panic!("unexpected {:?}", other),
        })
        .collect();

    assert_ne!(ids[0], ids[1]);
}

#[test]
fn parse_expression_rejects_trailing_tokens() {
    let (tokens, _) = Scanner::scan_all("1 + 2 3");
    let errors = Parser::new(tokens).parse_expression().unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[line 1] Error at '3': Expect end of expression."
    );
}
