//! Tree‑walking evaluator.
//!
//! Statements run against a chain of [`Environment`] frames. Variable access
//! uses the distances computed by the resolver: a resolved reference walks
//! exactly that many links from the current frame, an unresolved one goes
//! straight to the globals.
//!
//! Two outcomes travel up from statement execution and they never mix:
//! `Ok(Exec::Return(v))` unwinds to the nearest call boundary, while
//! `Err(LoxError::Runtime { .. })` aborts the whole top‑level run.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::environment::{self, EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, Value};

/// Nesting budget shared by statements, expressions and calls. A call made
/// this deep reports a stack overflow instead of exhausting the host stack.
const MAX_DEPTH: usize = 4096;

/// Per‑run evaluation settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    /// Echo the value of every bare expression statement (REPL mode).
    pub print_expressions: bool,
}

/// Result of executing one statement.
#[derive(Debug)]
pub enum Exec {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    config: Config,
    /// Statements and expressions currently being run, outermost included.
    depth: usize,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates a new Interpreter whose `print` output goes to `out`, and
    /// defines native functions such as `clock`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            },
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            config: Config::default(),
            depth: 0,
            out,
        }
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Merge a resolver's distance table. Tables accumulate across runs so
    /// functions defined on earlier REPL lines keep their bindings.
    pub fn note_locals(&mut self, locals: Locals) {
        debug!("Recording {} resolved reference(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Interprets a list of statements (a "program"). Stops at the first
    /// runtime error.
    pub fn interpret(&mut self, statements: &[Stmt], config: Config) -> Result<()> {
        info!("Interpreting {} statements", statements.len());

        self.config = config;
        self.environment = Rc::clone(&self.globals);
        self.depth = 0;

        for stmt in statements {
            self.execute(stmt)?;
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Evaluates a standalone expression against the globals.
    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value> {
        self.environment = Rc::clone(&self.globals);
        self.depth = 0;
        self.evaluate(expr)
    }

    // ─────────────────────────────── statements ──────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Exec> {
        self.depth += 1;
        let result = self.execute_stmt(stmt);
        self.depth -= 1;
        result
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Exec> {
        match stmt {
            Stmt::Expression(expr) => {
                let value = self.evaluate(expr)?;
                if self.config.print_expressions {
                    writeln!(self.out, "{}", value)?;
                }
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let env = Environment::child_of(&self.environment);
                return self.execute_block(statements, env);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Exec::Return(value) = self.execute(body)? {
                        return Ok(Exec::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function =
                    LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                return Ok(Exec::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.declare_class(name, superclass.as_ref(), methods)?;
            }
        }

        Ok(Exec::Normal)
    }

    /// Run `statements` inside `env`, restoring the previous frame on every
    /// exit path (normal, `return`, or runtime error).
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<Exec> {
        let previous = std::mem::replace(&mut self.environment, env);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Exec> {
        for stmt in statements {
            if let Exec::Return(value) = self.execute(stmt)? {
                return Ok(Exec::Return(value));
            }
        }
        Ok(Exec::Normal)
    }

    fn declare_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let token = match expr {
                        Expr::Variable {
                            name: super_name, ..
                        } => super_name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(token, "Superclass must be a class."));
                }
            },
            None => None,
        };

        // Pre‑declared so methods can refer to the class by name.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let method_env = match &superclass {
            Some(class) => {
                let env = Environment::child_of(&self.environment);
                env.borrow_mut()
                    .define("super", Value::Class(Rc::clone(class)));
                env
            }
            None => Rc::clone(&self.environment),
        };

        let methods = methods
            .iter()
            .map(|method| {
                let is_initializer = method.name.lexeme == "init";
                let function =
                    LoxFunction::new(Rc::clone(method), Rc::clone(&method_env), is_initializer);
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), superclass, methods);
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Class(Rc::new(class)));

        Ok(())
    }

    // ────────────────────────────── expressions ──────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        self.depth += 1;
        let result = self.evaluate_expr(expr);
        self.depth -= 1;
        result
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::string(s),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                self.evaluate_unary(operator, right)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                evaluate_binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id).copied() {
                    Some(distance) => {
                        environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(callee, paren, args)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => get_property(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.set_field(&name.lexeme, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&self, operator: &Token, right: Value) -> Result<Value> {
        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(distance) => environment::get_at(&self.environment, *distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// `super` sits one frame outside the frame binding `this`.
    fn evaluate_super(&self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance = self.locals.get(&id).copied().ok_or_else(|| {
            LoxError::runtime(keyword, "Can't use 'super' outside of a class.")
        })?;

        let Value::Class(superclass) = environment::get_at(&self.environment, distance, keyword)?
        else {
            return Err(LoxError::runtime(keyword, "Superclass must be a class."));
        };

        let this = Token::identifier("this", keyword.line);
        let Value::Instance(instance) =
            environment::get_at(&self.environment, distance.saturating_sub(1), &this)?
        else {
            return Err(LoxError::runtime(keyword, "Can't use 'this' outside of a class."));
        };

        let bound = superclass
            .find_method(&method.lexeme)
            .map(|m| m.bind(instance))
            .ok_or_else(|| {
                LoxError::runtime(
                    method,
                    format!("Undefined property '{}'.", method.lexeme),
                )
            })?;

        Ok(Value::Function(Rc::new(bound)))
    }

    // ───────────────────────────────── calls ─────────────────────────────────

    fn call_value(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> Result<Value> {
        let Some(arity) = callee.arity() else {
            return Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if args.len() != arity {
            return Err(LoxError::runtime(
                paren,
                format!("Expected {} arguments but got {}.", arity, args.len()),
            ));
        }

        if self.depth >= MAX_DEPTH {
            debug!("Nesting depth {} reached at line {}", self.depth, paren.line);
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        match callee {
            Value::Function(function) => self.call_function(&function, args),
            Value::Class(class) => self.instantiate(class, args),
            Value::NativeFunction { name, func, .. } => {
                debug!("Calling native function '{}'", name);
                func(&args).map_err(|message| LoxError::runtime(paren, message))
            }
            _ => Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }

    /// Fresh frame under the closure (never the caller's frame), parameters
    /// bound in order, body run as a block.
    fn call_function(&mut self, function: &LoxFunction, args: Vec<Value>) -> Result<Value> {
        debug!("Calling user-defined function '{}'", function.name());

        let env = Environment::child_of(&function.closure);
        {
            let mut frame = env.borrow_mut();
            for (param, arg) in function.declaration.params.iter().zip(args) {
                frame.define(&param.lexeme, arg);
            }
        }

        let exec = self.execute_block(&function.declaration.body, env)?;

        // An initializer always hands back `this`, however it returned.
        if function.is_initializer {
            let this = Token::identifier("this", function.declaration.name.line);
            return environment::get_at(&function.closure, 0, &this);
        }

        Ok(match exec {
            Exec::Return(value) => value,
            Exec::Normal => Value::Nil,
        })
    }

    fn instantiate(&mut self, class: Rc<LoxClass>, args: Vec<Value>) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance = Rc::new(LoxInstance::new(Rc::clone(&class)));

        if let Some(initializer) = class.find_method("init") {
            let bound = initializer.bind(Rc::clone(&instance));
            self.call_function(&bound, args)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// Field first, then a method bound to the instance.
fn get_property(instance: &Rc<LoxInstance>, name: &Token) -> Result<Value> {
    if let Some(value) = instance.field(&name.lexeme) {
        return Ok(value);
    }

    if let Some(method) = instance.class.find_method(&name.lexeme) {
        return Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance)))));
    }

    Err(LoxError::runtime(
        name,
        format!("Undefined property '{}'.", name.lexeme),
    ))
}

fn evaluate_binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    use Value::{Bool, Number};

    match (&operator.token_type, left, right) {
        (TokenType::EQUAL_EQUAL, l, r) => Ok(Bool(l == r)),
        (TokenType::BANG_EQUAL, l, r) => Ok(Bool(l != r)),

        (TokenType::PLUS, Number(a), Number(b)) => Ok(Number(a + b)),
        (TokenType::PLUS, Value::String(a), Value::String(b)) => {
            Ok(Value::string(format!("{}{}", a, b)))
        }
        (TokenType::PLUS, l @ Value::String(_), r @ Number(_))
        | (TokenType::PLUS, l @ Number(_), r @ Value::String(_)) => {
            Ok(Value::string(format!("{}{}", l, r)))
        }
        (TokenType::PLUS, _, _) => Err(LoxError::runtime(
            operator,
            "Operands must be two numbers or two strings.",
        )),

        (TokenType::MINUS, Number(a), Number(b)) => Ok(Number(a - b)),
        (TokenType::STAR, Number(a), Number(b)) => Ok(Number(a * b)),
        // Division by zero follows IEEE‑754: inf, -inf or NaN.
        (TokenType::SLASH, Number(a), Number(b)) => Ok(Number(a / b)),
        (TokenType::GREATER, Number(a), Number(b)) => Ok(Bool(a > b)),
        (TokenType::GREATER_EQUAL, Number(a), Number(b)) => Ok(Bool(a >= b)),
        (TokenType::LESS, Number(a), Number(b)) => Ok(Bool(a < b)),
        (TokenType::LESS_EQUAL, Number(a), Number(b)) => Ok(Bool(a <= b)),

        (
            TokenType::MINUS
            | TokenType::STAR
            | TokenType::SLASH
            | TokenType::GREATER
            | TokenType::GREATER_EQUAL
            | TokenType::LESS
            | TokenType::LESS_EQUAL,
            _,
            _,
        ) => Err(LoxError::runtime(operator, "Operands must be numbers.")),

        _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
    }
}

/// Seconds since the UNIX epoch.
fn clock(_args: &[Value]) -> std::result::Result<Value, String> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| Value::Number(elapsed.as_secs_f64()))
        .map_err(|e| format!("Clock error: {}", e))
}
