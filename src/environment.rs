use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// A single scope: name bindings plus an optional link to the enclosing
/// scope. Shared ownership is the norm; every closure and instance that
/// captures a scope keeps it alive.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn enclosing(&self) -> Option<Rc<RefCell<Environment>>> {
        self.enclosing.clone()
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Chain-walking lookup, used for globals and unresolved names.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Chain-walking assignment; defining never happens here.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Walk exactly `distance` links outward. The resolver guarantees the
    /// chain is at least that long wherever a depth was recorded.
    pub fn ancestor(
        this: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Rc<RefCell<Environment>> {
        let mut environment = Rc::clone(this);

        for _ in 0..distance {
            let enclosing = environment
                .borrow()
                .enclosing
                .clone()
                .expect("environment chain shorter than resolved depth");
            environment = enclosing;
        }

        environment
    }

    /// Depth-addressed read: no outward search past the `distance`-th link.
    pub fn get_at(
        this: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
    ) -> Option<Value> {
        Environment::ancestor(this, distance)
            .borrow()
            .values
            .get(name)
            .cloned()
    }

    /// Depth-addressed write.
    pub fn assign_at(
        this: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) {
        Environment::ancestor(this, distance)
            .borrow_mut()
            .values
            .insert(name.to_string(), value);
    }
}
