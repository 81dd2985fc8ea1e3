use crate::ast::{Expr, LiteralValue, Stmt};

/// Debug renderings of the AST.
///
/// * [`AstPrinter::print`] gives the Crafting‑Interpreters prefix form,
///   `(* (- 123) (group 45.67))`.
/// * [`AstPrinter::source`] gives Lox source text. Printing an expression that
///   came out of the parser and parsing the text again yields the same tree:
///   every parenthesis the precedence rules need is already a `Grouping`.
/// * [`AstPrinter::program`] renders statements as indented Lox source.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3.0 stays 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(set {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }

    pub fn source(expr: &Expr) -> String {
        match expr {
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),
                LiteralValue::False => "false".into(),
                LiteralValue::Nil => "nil".into(),
                LiteralValue::Str(s) => format!("\"{}\"", s),
                // Shortest text that reads back as the same f64.
                LiteralValue::Number(n) => n.to_string(),
            },

            Expr::Grouping(inner) => format!("({})", Self::source(inner)),

            Expr::Unary { operator, right } => {
                format!("{}{}", operator.lexeme, Self::source(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "{} {} {}",
                Self::source(left),
                operator.lexeme,
                Self::source(right)
            ),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("{} = {}", name.lexeme, Self::source(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let args: Vec<String> = arguments.iter().map(Self::source).collect();
                format!("{}({})", Self::source(callee), args.join(", "))
            }

            Expr::Get { object, name } => format!("{}.{}", Self::source(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "{}.{} = {}",
                Self::source(object),
                name.lexeme,
                Self::source(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("super.{}", method.lexeme),
        }
    }

    pub fn program(statements: &[Stmt]) -> String {
        let mut out = String::new();
        for stmt in statements {
            Self::write_stmt(&mut out, stmt, 0);
        }
        out
    }

    fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
        let pad = "  ".repeat(depth);

        match stmt {
            Stmt::Expression(expr) => {
                out.push_str(&format!("{}{};\n", pad, Self::source(expr)));
            }

            Stmt::Print(expr) => {
                out.push_str(&format!("{}print {};\n", pad, Self::source(expr)));
            }

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => out.push_str(&format!(
                    "{}var {} = {};\n",
                    pad,
                    name.lexeme,
                    Self::source(expr)
                )),
                None => out.push_str(&format!("{}var {};\n", pad, name.lexeme)),
            },

            Stmt::Block(statements) => {
                out.push_str(&format!("{}{{\n", pad));
                for inner in statements {
                    Self::write_stmt(out, inner, depth + 1);
                }
                out.push_str(&format!("{}}}\n", pad));
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push_str(&format!("{}if ({})\n", pad, Self::source(condition)));
                Self::write_stmt(out, then_branch, depth + 1);
                if let Some(else_branch) = else_branch {
                    out.push_str(&format!("{}else\n", pad));
                    Self::write_stmt(out, else_branch, depth + 1);
                }
            }

            Stmt::While { condition, body } => {
                out.push_str(&format!("{}while ({})\n", pad, Self::source(condition)));
                Self::write_stmt(out, body, depth + 1);
            }

            Stmt::Function(function) => {
                let params: Vec<&str> = function.params.iter().map(|p| p.lexeme.as_str()).collect();
                out.push_str(&format!(
                    "{}fun {}({}) {{\n",
                    pad,
                    function.name.lexeme,
                    params.join(", ")
                ));
                for inner in &function.body {
                    Self::write_stmt(out, inner, depth + 1);
                }
                out.push_str(&format!("{}}}\n", pad));
            }

            Stmt::Return { value, .. } => match value {
                Some(expr) => out.push_str(&format!("{}return {};\n", pad, Self::source(expr))),
                None => out.push_str(&format!("{}return;\n", pad)),
            },

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                match superclass {
                    Some(superclass) => out.push_str(&format!(
                        "{}class {} < {} {{\n",
                        pad,
                        name.lexeme,
                        Self::source(superclass)
                    )),
                    None => out.push_str(&format!("{}class {} {{\n", pad, name.lexeme)),
                }

                for method in methods {
                    let params: Vec<&str> =
                        method.params.iter().map(|p| p.lexeme.as_str()).collect();
                    out.push_str(&format!(
                        "{}  {}({}) {{\n",
                        pad,
                        method.name.lexeme,
                        params.join(", ")
                    ));
                    for inner in &method.body {
                        Self::write_stmt(out, inner, depth + 2);
                    }
                    out.push_str(&format!("{}  }}\n", pad));
                }

                out.push_str(&format!("{}}}\n", pad));
            }
        }
    }
}
