use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::object::Object;
use crate::syntax::Stmt;
use crate::token::{Token, TokenType};

#[derive(Clone)]
pub enum Function {
    // Intrinsics implemented in the host language and registered in the
    // globals at interpreter construction.
    Native {
        name: &'static str,
        arity: usize,
        body: fn(&[Object]) -> Object,
    },

    // A user function is its declaration plus the environment that was
    // active where it was declared; that pairing is what makes closures
    // observe later mutations of captured variables.
    User {
        name: Token,
        params: Vec<Token>,
        body: Vec<Stmt>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    },
}

impl Function {
    /// Runs the callable. User functions execute their body in a fresh
    /// child of the closure with parameters bound to arguments; the
    /// `Return` unwind carries the result, and falling off the end yields
    /// nil. Initializers are special: they always yield the bound `this`.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: &[Object]) -> Result<Object, Error> {
        match self {
            Function::Native { body, .. } => Ok(body(arguments)),
            Function::User {
                params,
                body,
                closure,
                is_initializer,
                ..
            } => {
                // Each call gets its own environment, otherwise recursion
                // would share locals between live activations.
                let environment = Rc::new(RefCell::new(Environment::from(closure)));
                for (param, argument) in params.iter().zip(arguments.iter()) {
                    environment
                        .borrow_mut()
                        .define(param.lexeme.clone(), argument.clone());
                }
                match interpreter.execute_block(body, environment) {
                    Err(Error::Return { value }) => {
                        if *is_initializer {
                            self.bound_this()
                        } else {
                            Ok(value)
                        }
                    }
                    Err(other) => Err(other),
                    Ok(()) => {
                        if *is_initializer {
                            self.bound_this()
                        } else {
                            Ok(Object::Null)
                        }
                    }
                }
            }
        }
    }

    /// Returns a copy of this function whose closure is extended with
    /// `this` bound to the given instance.
    pub fn bind(&self, instance: Object) -> Self {
        match self {
            Function::Native { .. } => unreachable!("native functions are never methods"),
            Function::User {
                name,
                params,
                body,
                closure,
                is_initializer,
            } => {
                let environment = Rc::new(RefCell::new(Environment::from(closure)));
                environment.borrow_mut().define("this".to_string(), instance);
                Function::User {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: environment,
                    is_initializer: *is_initializer,
                }
            }
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Native { arity, .. } => *arity,
            Function::User { params, .. } => params.len(),
        }
    }

    // An initializer's closure always has 'this' at distance 0: bind()
    // put it there before the class could invoke init.
    fn bound_this(&self) -> Result<Object, Error> {
        match self {
            Function::Native { .. } => unreachable!("native functions are never initializers"),
            Function::User { name, closure, .. } => {
                let this = Token::new(TokenType::THIS, "this", None, name.line);
                Environment::get_at(closure, 0, &this)
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native { name, .. } => write!(f, "<built-in function {}>", name),
            Function::User { name, .. } => write!(f, "<function {}>", name.lexeme),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
