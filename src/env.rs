//! Lexical-scope environments.

use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

use crate::eval::RuntimeError;
use crate::value::Value;

/// A frame of name bindings with an optional link to the enclosing frame.
///
/// Frames are shared (`Rc`) and interior-mutable: closures keep a live
/// reference to the frame that was current when they were declared, so a
/// frame may outlive the call that created it.
#[derive(Debug)]
pub struct Environment {
    enclosing: Option<Rc<Environment>>,
    values: RefCell<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Rc<Environment> {
        Self::with_enclosing(None)
    }

    pub fn with_enclosing(enclosing: Option<Rc<Environment>>) -> Rc<Environment> {
        Rc::new(Environment {
            enclosing,
            values: RefCell::new(HashMap::new()),
        })
    }

    /// Add or overwrite a binding in this frame.
    pub fn define(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_owned(), value);
    }

    /// Look `name` up in this frame, then outward through the enclosing
    /// frames.
    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.borrow().get(name) {
            return Ok(value.clone());
        }
        match &self.enclosing {
            Some(enclosing) => enclosing.get(name),
            None => Err(RuntimeError::UndefinedVariable(name.to_owned())),
        }
    }

    /// Overwrite `name` in the innermost frame that contains it.  Unlike
    /// `define`, assignment never creates a binding.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if let Entry::Occupied(mut entry) = self.values.borrow_mut().entry(name.to_owned()) {
            entry.insert(value);
            return Ok(());
        }
        match &self.enclosing {
            Some(enclosing) => enclosing.assign(name, value),
            None => Err(RuntimeError::UndefinedVariable(name.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_get() -> Result<(), RuntimeError> {
        let env = Environment::new();
        env.define("foo", Value::Number(42.0));
        assert_eq!(env.get("foo")?, Value::Number(42.0));
        Ok(())
    }

    #[test]
    fn redefining_overwrites_silently() -> Result<(), RuntimeError> {
        let env = Environment::new();
        env.define("foo", Value::Number(1.0));
        env.define("foo", Value::Number(2.0));
        assert_eq!(env.get("foo")?, Value::Number(2.0));
        Ok(())
    }

    #[test]
    fn get_walks_outward() -> Result<(), RuntimeError> {
        let outer = Environment::new();
        outer.define("foo", Value::Bool(true));
        let inner = Environment::with_enclosing(Some(outer));
        assert_eq!(inner.get("foo")?, Value::Bool(true));
        Ok(())
    }

    #[test]
    fn inner_definition_shadows_outer() -> Result<(), RuntimeError> {
        let outer = Environment::new();
        outer.define("foo", Value::Number(1.0));
        let inner = Environment::with_enclosing(Some(outer.clone()));
        inner.define("foo", Value::Number(2.0));
        assert_eq!(inner.get("foo")?, Value::Number(2.0));
        assert_eq!(outer.get("foo")?, Value::Number(1.0));
        Ok(())
    }

    #[test]
    fn assign_updates_the_defining_frame() -> Result<(), RuntimeError> {
        let outer = Environment::new();
        outer.define("foo", Value::Number(1.0));
        let inner = Environment::with_enclosing(Some(outer.clone()));
        inner.assign("foo", Value::Number(2.0))?;
        assert_eq!(outer.get("foo")?, Value::Number(2.0));
        Ok(())
    }

    #[test]
    fn get_unknown_variable() {
        let env = Environment::new();
        match env.get("foo") {
            Err(RuntimeError::UndefinedVariable(name)) if name == "foo" => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn assign_never_creates_a_binding() {
        let env = Environment::new();
        match env.assign("foo", Value::Nil) {
            Err(RuntimeError::UndefinedVariable(name)) if name == "foo" => (),
            out => panic!("unexpected output: {:?}", out),
        }
    }
}
