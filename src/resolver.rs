use std::collections::HashMap;
use std::mem;

use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::syntax::{expr, stmt, Expr, LiteralValue, Stmt};
use crate::token::Token;

// The resolver tracks what kind of function, class and loop the node it is
// visiting sits inside, so placement rules are enforced before anything
// runs.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Method,
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopType {
    None,
    While,
}

/// A preorder pass over the AST that records, for every variable-like
/// expression, how many scopes separate its use from its definition. The
/// interpreter later uses those distances instead of searching by name, so
/// closures keep observing the binding they captured.
///
/// The scope stack only models local scopes; globals stay dynamic, and a
/// name found in no scope is assumed global.
pub struct Resolver<'i> {
    interpreter: &'i mut Interpreter,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    current_loop: LoopType,
}

impl<'i> Resolver<'i> {
    pub fn new(interpreter: &'i mut Interpreter) -> Self {
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            current_loop: LoopType::None,
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<(), Error> {
        for statement in statements {
            self.resolve_stmt(statement)?;
        }
        Ok(())
    }

    fn resolve_stmt(&mut self, statement: &Stmt) -> Result<(), Error> {
        statement.accept(self)
    }

    fn resolve_expr(&mut self, expression: &Expr) -> Result<(), Error> {
        expression.accept(self)
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    // Declaring installs the name as not-ready-yet; the flag flips once the
    // initializer has been resolved, which is what catches `var a = a;`.
    fn declare(&mut self, name: &Token) -> Result<(), Error> {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                return Err(Self::error(
                    name,
                    "Cannot re-declare the same variable in local scope, use assignment instead",
                ));
            }
            scope.insert(name.lexeme.clone(), false);
        }
        Ok(())
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // Walk from the innermost scope outwards; the first scope holding the
    // name fixes the distance. No match means the variable is global.
    fn resolve_local(&mut self, id: usize, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, depth);
                return;
            }
        }
    }

    // Unlike the interpreter, which defers a function body until the call,
    // resolution traverses the body immediately, in a fresh scope holding
    // the parameters. The loop kind resets as well: a 'break' cannot cross
    // a function boundary to reach an enclosing loop.
    fn resolve_function(
        &mut self,
        params: &[Token],
        body: &[Stmt],
        tpe: FunctionType,
    ) -> Result<(), Error> {
        let enclosing_function = mem::replace(&mut self.current_function, tpe);
        let enclosing_loop = mem::replace(&mut self.current_loop, LoopType::None);

        self.begin_scope();
        for param in params {
            self.declare(param)?;
            self.define(param);
        }
        let result = self.resolve(body);
        self.end_scope();

        self.current_function = enclosing_function;
        self.current_loop = enclosing_loop;
        result
    }

    fn error(token: &Token, message: &str) -> Error {
        Error::Resolve {
            token: token.clone(),
            message: message.to_string(),
        }
    }
}

impl<'i> expr::Visitor<()> for Resolver<'i> {
    fn visit_variable_expr(&mut self, id: usize, name: &Token) -> Result<(), Error> {
        // present-but-not-ready means the variable is being read inside its
        // own initializer
        if let Some(scope) = self.scopes.last() {
            if scope.get(&name.lexeme) == Some(&false) {
                return Err(Self::error(
                    name,
                    "Cannot read local variable in its own initializer",
                ));
            }
        }
        self.resolve_local(id, name);
        Ok(())
    }

    fn visit_assign_expr(&mut self, id: usize, name: &Token, value: &Expr) -> Result<(), Error> {
        self.resolve_expr(value)?;
        self.resolve_local(id, name);
        Ok(())
    }

    fn visit_binary_expr(
        &mut self,
        left: &Expr,
        _operator: &Token,
        right: &Expr,
    ) -> Result<(), Error> {
        self.resolve_expr(left)?;
        self.resolve_expr(right)
    }

    // no short-circuiting during static analysis, so logical operators
    // resolve like any other binary operator
    fn visit_logical_expr(
        &mut self,
        left: &Expr,
        _operator: &Token,
        right: &Expr,
    ) -> Result<(), Error> {
        self.resolve_expr(left)?;
        self.resolve_expr(right)
    }

    fn visit_call_expr(
        &mut self,
        callee: &Expr,
        _paren: &Token,
        arguments: &[Expr],
    ) -> Result<(), Error> {
        self.resolve_expr(callee)?;
        for argument in arguments {
            self.resolve_expr(argument)?;
        }
        Ok(())
    }

    // the property name is looked up dynamically, only the object resolves
    fn visit_get_expr(&mut self, object: &Expr, _name: &Token) -> Result<(), Error> {
        self.resolve_expr(object)
    }

    fn visit_set_expr(&mut self, object: &Expr, _name: &Token, value: &Expr) -> Result<(), Error> {
        self.resolve_expr(value)?;
        self.resolve_expr(object)
    }

    fn visit_grouping_expr(&mut self, expression: &Expr) -> Result<(), Error> {
        self.resolve_expr(expression)
    }

    fn visit_literal_expr(&mut self, _value: &LiteralValue) -> Result<(), Error> {
        Ok(())
    }

    fn visit_unary_expr(&mut self, _operator: &Token, right: &Expr) -> Result<(), Error> {
        self.resolve_expr(right)
    }

    fn visit_this_expr(&mut self, id: usize, keyword: &Token) -> Result<(), Error> {
        if self.current_class == ClassType::None {
            return Err(Self::error(keyword, "'this' outside class"));
        }
        self.resolve_local(id, keyword);
        Ok(())
    }

    fn visit_super_expr(&mut self, id: usize, keyword: &Token, _method: &Token) -> Result<(), Error> {
        if self.current_class == ClassType::None {
            return Err(Self::error(keyword, "'super' outside class"));
        }
        self.resolve_local(id, keyword);
        Ok(())
    }
}

impl<'i> stmt::Visitor<()> for Resolver<'i> {
    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> Result<(), Error> {
        self.begin_scope();
        let result = self.resolve(statements);
        self.end_scope();
        result
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> Result<(), Error> {
        self.declare(name)?;
        if let Some(init) = initializer {
            self.resolve_expr(init)?;
        }
        self.define(name);
        Ok(())
    }

    // the name is defined eagerly so a function can recurse into itself
    fn visit_function_stmt(
        &mut self,
        name: &Token,
        params: &[Token],
        body: &[Stmt],
    ) -> Result<(), Error> {
        self.declare(name)?;
        self.define(name);

        self.resolve_function(params, body, FunctionType::Function)
    }

    // Methods resolve inside two implicit scopes: one holding 'super' (only
    // when there is a superclass) and one holding 'this'. Their relative
    // order is what the interpreter's depth arithmetic for 'super' relies
    // on.
    fn visit_class_stmt(
        &mut self,
        name: &Token,
        methods: &[Stmt],
        superclass: Option<&Expr>,
    ) -> Result<(), Error> {
        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(name)?;
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable {
                name: superclass_name,
                ..
            } = superclass
            {
                if superclass_name.lexeme == name.lexeme {
                    return Err(Self::error(name, "A class cannot inherit from itself"));
                }
            }
            self.resolve_expr(superclass)?;
            self.begin_scope();
            self.scopes
                .last_mut()
                .expect("scope was just opened")
                .insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes
            .last_mut()
            .expect("scope was just opened")
            .insert("this".to_string(), true);

        let mut result = Ok(());
        for method in methods {
            if let Stmt::Function {
                name: method_name,
                params,
                body,
            } = method
            {
                let tpe = if method_name.lexeme == "init" {
                    FunctionType::Init
                } else {
                    FunctionType::Method
                };
                result = self.resolve_function(params, body, tpe);
                if result.is_err() {
                    break;
                }
            }
        }

        self.end_scope();
        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
        result
    }

    fn visit_expression_stmt(&mut self, expression: &Expr) -> Result<(), Error> {
        self.resolve_expr(expression)
    }

    fn visit_if_stmt(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), Error> {
        self.resolve_expr(condition)?;
        self.resolve_stmt(then_branch)?;
        if let Some(else_stmt) = else_branch {
            self.resolve_stmt(else_stmt)?;
        }
        Ok(())
    }

    fn visit_return_stmt(&mut self, keyword: &Token, value: Option<&Expr>) -> Result<(), Error> {
        if self.current_function == FunctionType::None {
            return Err(Self::error(keyword, "'return' outside function"));
        }

        if let Some(return_value) = value {
            if self.current_function == FunctionType::Init {
                return Err(Self::error(
                    keyword,
                    "Cannot return a value from a constructor",
                ));
            }
            self.resolve_expr(return_value)?;
        }
        Ok(())
    }

    // the body resolves exactly once, whatever the runtime iteration count
    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> Result<(), Error> {
        let enclosing_loop = mem::replace(&mut self.current_loop, LoopType::While);
        let result = self
            .resolve_expr(condition)
            .and_then(|()| self.resolve_stmt(body));
        self.current_loop = enclosing_loop;
        result
    }

    fn visit_break_stmt(&mut self, token: &Token) -> Result<(), Error> {
        if self.current_loop == LoopType::None {
            return Err(Self::error(token, "'break' outside loop"));
        }
        Ok(())
    }

    // the binding a 'del' removes is found dynamically, scope by scope
    fn visit_del_stmt(&mut self, _name: &Token) -> Result<(), Error> {
        Ok(())
    }
}
