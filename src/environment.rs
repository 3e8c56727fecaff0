use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Blocks, call frames and every closure created
/// inside a scope hold the same handle, so a write through one is seen by all.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Fresh shared child scope of `enclosing`.
    pub fn new_child(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    /// Insert or overwrite `name` in this scope only.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Walk exactly `distance` enclosing links.
    ///
    /// # Panics
    /// If the chain is shorter than `distance`: the resolver computed a hop
    /// count that does not match the runtime scope structure.
    pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut current = Rc::clone(env);
        for hop in 0..distance {
            let next = current.borrow().enclosing.clone();
            current = next.unwrap_or_else(|| {
                panic!(
                    "scope chain ended after {} of {} resolved hops",
                    hop, distance
                )
            });
        }
        current
    }

    /// Read a resolved binding `distance` scopes out.
    ///
    /// # Panics
    /// If the binding is missing, which means resolver and interpreter disagree.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Value {
        let scope = Self::ancestor(env, distance);
        let value = scope.borrow().values.get(name).cloned();
        value.unwrap_or_else(|| panic!("resolved binding '{}' missing {} hops out", name, distance))
    }

    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) {
        Self::ancestor(env, distance)
            .borrow_mut()
            .define(&name.lexeme, value);
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn assignment_through_one_handle_is_visible_through_another() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("count", Value::Number(0.0));

        let first = Environment::new_child(&globals);
        let second = Environment::new_child(&globals);

        first
            .borrow_mut()
            .assign(&ident("count"), Value::Number(5.0))
            .unwrap();

        assert_eq!(second.borrow().get(&ident("count")).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn get_at_skips_shadowing_scopes() {
        let outer: EnvRef = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::new_child(&outer);
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(Environment::get_at(&inner, 0, "a"), Value::Number(2.0));
        assert_eq!(Environment::get_at(&inner, 1, "a"), Value::Number(1.0));

        Environment::assign_at(&inner, 1, &ident("a"), Value::Number(3.0));
        assert_eq!(outer.borrow().get(&ident("a")).unwrap(), Value::Number(3.0));
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let env = Environment::new();
        let err = env.get(&ident("missing")).unwrap_err();

        assert_eq!(err.to_string(), "Undefined variable 'missing'.\n[line 1]");
    }

    #[test]
    #[should_panic(expected = "scope chain ended")]
    fn hop_count_beyond_chain_panics() {
        let env: EnvRef = Rc::new(RefCell::new(Environment::new()));
        Environment::ancestor(&env, 2);
    }
}
