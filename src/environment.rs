use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{error::Error, object::Object, token::Token};

/// One lexical scope: a name→value map plus a parent pointer forming the
/// scope chain. Closures hold an `Rc` to the scope they captured, so
/// mutations stay visible through every handle.
pub struct Environment {
    values: HashMap<String, Object>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn from(enclosing: &Rc<RefCell<Environment>>) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }
    }

    // Installs or overwrites in this scope only; the resolver is the layer
    // that rejects re-declarations in nested scopes.
    pub fn define(&mut self, name: String, value: Object) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &Token) -> Result<Object, Error> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(ref enclosing) = self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(Self::undefined(name))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), Error> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(ref enclosing) = self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(Self::undefined(name))
        }
    }

    /// Removes the binding from the nearest scope that holds it.
    pub fn delete(&mut self, name: &Token) -> Result<(), Error> {
        if self.values.remove(&name.lexeme).is_some() {
            Ok(())
        } else if let Some(ref enclosing) = self.enclosing {
            enclosing.borrow_mut().delete(name)
        } else {
            Err(Self::undefined(name))
        }
    }

    /// Reads `name` in the scope exactly `distance` links up the chain.
    /// Distance 0 is the current scope; the ancestor's own map is the only
    /// one consulted.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &Token) -> Result<Object, Error> {
        match Self::ancestor(env, distance) {
            Some(scope) => {
                let scope = scope.borrow();
                scope
                    .values
                    .get(&name.lexeme)
                    .cloned()
                    .ok_or_else(|| Self::undefined(name))
            }
            None => Err(Self::undefined(name)),
        }
    }

    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Object,
    ) -> Result<(), Error> {
        match Self::ancestor(env, distance) {
            Some(scope) => {
                scope.borrow_mut().values.insert(name.lexeme.clone(), value);
                Ok(())
            }
            None => Err(Self::undefined(name)),
        }
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut scope = Rc::clone(env);
        for _ in 0..distance {
            let enclosing = scope.borrow().enclosing.clone();
            scope = enclosing?;
        }
        Some(scope)
    }

    fn undefined(name: &Token) -> Error {
        Error::Runtime {
            token: name.clone(),
            message: format!("Undefined name '{}'", name.lexeme),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::ID, name, None, 1)
    }

    fn number(env: &Rc<RefCell<Environment>>, name: &str) -> f64 {
        match env.borrow().get(&ident(name)).unwrap() {
            Object::Number(n) => n,
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn lookup_walks_the_chain_and_the_first_binding_wins() {
        let root = Rc::new(RefCell::new(Environment::new()));
        root.borrow_mut().define("x".to_string(), Object::Number(1.0));
        let child = Rc::new(RefCell::new(Environment::from(&root)));
        assert_eq!(number(&child, "x"), 1.0);

        child
            .borrow_mut()
            .define("x".to_string(), Object::Number(2.0));
        assert_eq!(number(&child, "x"), 2.0);
        assert_eq!(number(&root, "x"), 1.0);
    }

    #[test]
    fn assign_mutates_the_nearest_holding_scope() {
        let root = Rc::new(RefCell::new(Environment::new()));
        root.borrow_mut().define("x".to_string(), Object::Number(1.0));
        let child = Rc::new(RefCell::new(Environment::from(&root)));

        child
            .borrow_mut()
            .assign(&ident("x"), Object::Number(5.0))
            .unwrap();
        assert_eq!(number(&root, "x"), 5.0);

        assert!(child
            .borrow_mut()
            .assign(&ident("missing"), Object::Null)
            .is_err());
    }

    #[test]
    fn delete_removes_the_nearest_binding_only() {
        let root = Rc::new(RefCell::new(Environment::new()));
        root.borrow_mut().define("x".to_string(), Object::Number(1.0));
        let child = Rc::new(RefCell::new(Environment::from(&root)));
        child
            .borrow_mut()
            .define("x".to_string(), Object::Number(2.0));

        child.borrow_mut().delete(&ident("x")).unwrap();
        assert_eq!(number(&child, "x"), 1.0); // outer binding now visible

        child.borrow_mut().delete(&ident("x")).unwrap();
        assert!(child.borrow().get(&ident("x")).is_err());
        assert!(child.borrow_mut().delete(&ident("x")).is_err());
    }

    #[test]
    fn get_at_skips_exactly_distance_scopes() {
        let root = Rc::new(RefCell::new(Environment::new()));
        root.borrow_mut().define("x".to_string(), Object::Number(1.0));
        let mid = Rc::new(RefCell::new(Environment::from(&root)));
        mid.borrow_mut().define("x".to_string(), Object::Number(2.0));
        let leaf = Rc::new(RefCell::new(Environment::from(&mid)));

        let x = ident("x");
        assert!(Environment::get_at(&leaf, 0, &x).is_err()); // current map only
        assert!(std::matches!(
            Environment::get_at(&leaf, 1, &x),
            Ok(Object::Number(n)) if n == 2.0
        ));
        assert!(std::matches!(
            Environment::get_at(&leaf, 2, &x),
            Ok(Object::Number(n)) if n == 1.0
        ));

        Environment::assign_at(&leaf, 2, &x, Object::Number(9.0)).unwrap();
        assert_eq!(number(&root, "x"), 9.0);
        assert!(std::matches!(
            Environment::get_at(&leaf, 1, &x),
            Ok(Object::Number(n)) if n == 2.0
        ));
    }
}
