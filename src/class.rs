use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Error;
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::object::Object;
use crate::token::Token;

// The instance stores the state, the class stores the behaviour.
#[derive(Debug)]
pub struct JaplClass {
    pub name: String,
    pub methods: HashMap<String, Function>,
    pub superclass: Option<Rc<JaplClass>>,
}

impl JaplClass {
    pub fn new(
        name: String,
        methods: HashMap<String, Function>,
        superclass: Option<Rc<JaplClass>>,
    ) -> Self {
        Self {
            name,
            methods,
            superclass,
        }
    }

    /// Looks the method up on this class, then walks the superclass chain.
    pub fn get_method(&self, name: &str) -> Option<Function> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }
        let mut superclass = self.superclass.as_deref();
        while let Some(class) = superclass {
            if let Some(method) = class.methods.get(name) {
                return Some(method.clone());
            }
            superclass = class.superclass.as_deref();
        }
        None
    }

    /// A class called as a function constructs an instance: the arity is
    /// `init`'s arity when one is defined, zero otherwise.
    pub fn arity(&self) -> usize {
        self.get_method("init").map_or(0, |init| init.arity())
    }

    pub fn call(
        class: &Rc<JaplClass>,
        interpreter: &mut Interpreter,
        arguments: &[Object],
    ) -> Result<Object, Error> {
        let instance = JaplInstance::new(class);
        if let Some(initializer) = class.get_method("init") {
            initializer.bind(instance.clone()).call(interpreter, arguments)?;
        }
        Ok(instance)
    }
}

#[derive(Debug)]
pub struct JaplInstance {
    pub class: Rc<JaplClass>,
    fields: HashMap<String, Object>,
}

impl JaplInstance {
    /// Allocates a fresh instance, already wrapped as an `Object`.
    pub fn new(class: &Rc<JaplClass>) -> Object {
        let instance = JaplInstance {
            class: Rc::clone(class),
            fields: HashMap::new(),
        };

        Object::Instance(Rc::new(RefCell::new(instance)))
    }

    // Fields shadow methods; a method is returned bound to the instance
    // the access went through.
    pub fn get(&self, name: &Token, instance: &Object) -> Result<Object, Error> {
        if let Some(field) = self.fields.get(&name.lexeme) {
            Ok(field.clone())
        } else if let Some(method) = self.class.get_method(&name.lexeme) {
            Ok(Object::Callable(method.bind(instance.clone())))
        } else {
            Err(Error::Runtime {
                token: name.clone(),
                message: format!("Undefined property '{}'", name.lexeme),
            })
        }
    }

    // Fields can be created freely, so there is no existence check.
    pub fn set(&mut self, name: &Token, value: Object) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}
