use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a frame. Closures keep frames alive by holding one of
/// these; every holder sees every other holder's writes.
pub type EnvRef = Rc<RefCell<Environment>>;

/// A single scope frame: its own bindings plus a link to the enclosing frame.
/// The global frame is the only one without an enclosing link.
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

    /// Convenience: a fresh child frame already wrapped for sharing.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in this frame, overwriting any previous binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup along the chain. Only used for globals.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Lookup in this frame only.
    pub fn get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// Walk exactly `distance` enclosing links from `env`.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut frame = Rc::clone(env);

    for _ in 0..distance {
        let next = frame.borrow().enclosing()?;
        frame = next;
    }

    Some(frame)
}

/// Read `name` from the frame `distance` links out.
pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
    ancestor(env, distance)
        .and_then(|frame| frame.borrow().get_here(&name.lexeme))
        .ok_or_else(|| {
            LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
        })
}

/// Overwrite `name` in the frame `distance` links out.
pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
    match ancestor(env, distance) {
        Some(frame) => {
            frame.borrow_mut().define(&name.lexeme, value);
            Ok(())
        }
        None => Err(LoxError::runtime(
            name,
            format!("Undefined variable '{}'.", name.lexeme),
        )),
    }
}
