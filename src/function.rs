use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::Instance;
use crate::environment::{EnvRef, Environment};
use crate::error::Result;
use crate::interpreter::{Completion, Interpreter};
use crate::value::{Callable, Value};

/// A user-defined function or method together with the scope it closes over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// Same body, closed over a new scope in which `this` is `instance`.
    pub fn bind(&self, instance: Rc<Instance>) -> Function {
        let environment = Environment::new_child(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling function '{}'", self.name());

        // Chained to the closure, not the caller: scoping is lexical.
        let environment = Environment::new_child(&self.closure);
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let completion = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return Ok(Environment::get_at(&self.closure, 0, "this"));
        }

        Ok(match completion {
            Completion::Return(value) => value,
            Completion::Normal => Value::Nil,
        })
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}
