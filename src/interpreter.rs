use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::class::{Class, Instance};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::function::Function;
use crate::token::{Token, TokenType};
use crate::value::{NativeFunction, Value};

/// How a statement finished.  `Return` unwinds statement sequences up to the
/// nearest call boundary; it is never an error.
#[derive(Debug, Clone)]
pub enum Completion {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an Interpreter printing to stdout, with native functions such as `clock`.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// Creates an Interpreter whose `print` output goes to `out`.
    pub fn with_output<W: Write + 'static>(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: |_args: &[Value]| {
                    let micros = Utc::now().timestamp_micros();
                    Value::Number(micros as f64 / 1_000_000.0)
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out: Box::new(out),
        }
    }

    /// Record the hop count for a resolved variable, `this` or `super` node.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  The first runtime error
    /// abandons the remaining statements and is returned.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Runs `statements` with `environment` as the current scope, restoring the
    /// previous scope on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Completion> {
        let previous = mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Completion> {
        for stmt in statements {
            if let Completion::Return(value) = self.execute(stmt)? {
                return Ok(Completion::Return(value));
            }
        }
        Ok(Completion::Normal)
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Completion> {
        match stmt {
            Stmt::Expression(expr) => {
                let value = self.evaluate(expr)?;
                check_initialized(&value, expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                check_initialized(&value, expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {:?}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let environment = Environment::new_child(&self.environment);
                return self.execute_block(statements, environment);
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
                    if let Completion::Return(value) = self.execute(body)? {
                        return Ok(Completion::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Ok(Completion::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods)?,
        }

        Ok(Completion::Normal)
    }

    fn execute_class(
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
                    let at = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(at, "Superclass must be a class."));
                }
            },
            None => None,
        };

        // Lets method bodies refer to the class before it exists.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        let class_scope = Rc::clone(&self.environment);
        let method_scope = match &superclass {
            Some(parent) => {
                let scope = Environment::new_child(&class_scope);
                scope
                    .borrow_mut()
                    .define("super", Value::Class(Rc::clone(parent)));
                scope
            }
            None => Rc::clone(&class_scope),
        };

        let methods: HashMap<String, Rc<Function>> = methods
            .iter()
            .map(|decl| {
                let is_initializer = decl.name.lexeme == "init";
                let function = Function::new(Rc::clone(decl), Rc::clone(&method_scope), is_initializer);
                (decl.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = Class::new(name.lexeme.clone(), superclass, methods);
        class_scope
            .borrow_mut()
            .define(&name.lexeme, Value::Class(Rc::new(class)));

        info!("Class '{}' defined", name.lexeme);
        Ok(())
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let short_circuits = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())
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
                let arguments = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument))
                    .collect::<Result<Vec<_>>>()?;

                let Some(callable) = callee.as_callable() else {
                    return Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };

                if arguments.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            arguments.len()
                        ),
                    ));
                }

                debug!("Calling {} with {} argument(s)", callee, arguments.len());
                callable.call(self, arguments)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
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
                instance.set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    /// `super.method`: look up from the superclass recorded for the enclosing
    /// class and bind the result to the current `this`, one scope nearer.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let Some(&distance) = self.locals.get(&id) else {
            return Err(LoxError::runtime(keyword, "Can't use 'super' here."));
        };

        let Value::Class(superclass) = Environment::get_at(&self.environment, distance, "super")
        else {
            return Err(LoxError::runtime(keyword, "Superclass must be a class."));
        };

        let Value::Instance(object) = Environment::get_at(&self.environment, distance - 1, "this")
        else {
            return Err(LoxError::runtime(keyword, "Can't use 'this' here."));
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                debug!("Variable '{}' resolved {} hops out", name.lexeme, distance);
                Ok(Environment::get_at(&self.environment, distance, &name.lexeme))
            }
            None => self.globals.borrow().get(name),
        }
    }
}

/// Arithmetic, comparison and equality on two evaluated operands.
fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    let numbers = |op: fn(f64, f64) -> Value| match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => Ok(op(*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    };

    match operator.token_type {
        TokenType::MINUS => numbers(|a, b| Value::Number(a - b)),
        TokenType::STAR => numbers(|a, b| Value::Number(a * b)),
        TokenType::SLASH => numbers(|a, b| Value::Number(a / b)),
        TokenType::GREATER => numbers(|a, b| Value::Bool(a > b)),
        TokenType::GREATER_EQUAL => numbers(|a, b| Value::Bool(a >= b)),
        TokenType::LESS => numbers(|a, b| Value::Bool(a < b)),
        TokenType::LESS_EQUAL => numbers(|a, b| Value::Bool(a <= b)),
        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left.lox_equals(&right))),
        TokenType::BANG_EQUAL => Ok(Value::Bool(!left.lox_equals(&right))),
        TokenType::PLUS => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            (Value::String(_), Value::Number(_)) | (Value::Number(_), Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            _ => Err(LoxError::runtime(
                operator,
                "Operands must be two numbers or two strings.",
            )),
        },
        _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
    }
}

/// A bare variable read that yields `nil` cannot stand alone as a statement
/// or be printed.  Other `nil`-valued expressions are fine.
fn check_initialized(value: &Value, expr: &Expr) -> Result<()> {
    match (value, expr) {
        (Value::Nil, Expr::Variable { name, .. }) => Err(LoxError::runtime(
            name,
            format!("Cannot use uninitialized variable '{}'.", name.lexeme),
        )),
        _ => Ok(()),
    }
}
