use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::class::JaplClass;
use crate::environment::Environment;
use crate::error::Error;
use crate::function::Function;
use crate::native;
use crate::object::Object;
use crate::syntax::{expr, stmt, Expr, LiteralValue, Stmt};
use crate::token::{Token, TokenType};

pub struct Interpreter {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    // expression id → number of scopes to skip; absence means global
    pub(crate) locals: HashMap<usize, usize>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        native::install(&globals);
        let environment = Rc::clone(&globals);

        Interpreter {
            globals,
            environment,
            locals: HashMap::new(),
        }
    }

    /// Executes a program. The value of the final top-level expression
    /// statement (if the program ends in one) is handed back so the REPL
    /// can echo it; scripts ignore it.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<Option<Object>, Error> {
        let mut value = None;
        for statement in statements {
            if let Stmt::Expression { expression } = statement {
                value = Some(self.evaluate(expression)?);
            } else {
                self.execute(statement)?;
                value = None;
            }
        }
        Ok(value)
    }

    /// Called by the resolver for every variable-like expression it
    /// resolves to a local scope.
    pub fn resolve(&mut self, id: usize, depth: usize) {
        self.locals.insert(id, depth);
    }

    fn execute(&mut self, statement: &Stmt) -> Result<(), Error> {
        statement.accept(self)
    }

    /// Runs `statements` in the given environment, restoring the previous
    /// one on every exit path: normal completion, break, return and
    /// runtime errors all travel through the same `Result`.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<(), Error> {
        let previous = Rc::clone(&self.environment);
        self.environment = environment;
        let mut result = Ok(());
        for statement in statements {
            result = self.execute(statement);
            if result.is_err() {
                break;
            }
        }
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expression: &Expr) -> Result<Object, Error> {
        expression.accept(self)
    }

    fn lookup_variable(&self, name: &Token, id: usize) -> Result<Object, Error> {
        if let Some(distance) = self.locals.get(&id) {
            Environment::get_at(&self.environment, *distance, name)
        } else {
            self.globals.borrow().get(name)
        }
    }

    fn runtime_error(&self, token: &Token, message: String) -> Error {
        Error::Runtime {
            token: token.clone(),
            message,
        }
    }

    // Both operands are numbers; apply the arithmetic or ordering operator.
    fn numeric_op(&self, operator: &Token, left: f64, right: f64) -> Result<Object, Error> {
        match operator.token_type {
            TokenType::PLUS => Ok(Object::Number(left + right)),
            TokenType::MINUS => Ok(Object::Number(left - right)),
            TokenType::STAR => Ok(Object::Number(left * right)),
            TokenType::SLASH | TokenType::MOD if right == 0.0 => {
                Err(self.runtime_error(operator, "Cannot divide by 0".to_string()))
            }
            TokenType::SLASH => Ok(Object::Number(left / right)),
            // the result takes the sign of the divisor
            TokenType::MOD => Ok(Object::Number(left - right * (left / right).floor())),
            TokenType::POW => Ok(Object::Number(left.powf(right))),
            TokenType::GT => Ok(Object::Boolean(left > right)),
            TokenType::GE => Ok(Object::Boolean(left >= right)),
            TokenType::LT => Ok(Object::Boolean(left < right)),
            TokenType::LE => Ok(Object::Boolean(left <= right)),
            _ => unreachable!("parser only feeds binary operators here"),
        }
    }

    fn binary_op(&self, operator: &Token, left: Object, right: Object) -> Result<Object, Error> {
        match operator.token_type {
            // equality is total over all type pairs
            TokenType::DEQ => return Ok(Object::Boolean(left.equals(&right))),
            TokenType::NE => return Ok(Object::Boolean(!left.equals(&right))),
            _ => (),
        }

        match (&left, &right) {
            (Object::Number(l), Object::Number(r)) => self.numeric_op(operator, *l, *r),
            (Object::String(l), Object::String(r)) if operator.token_type == TokenType::PLUS => {
                Ok(Object::String(format!("{}{}", l, r)))
            }
            // string repetition: integer-valued count on the right only
            (Object::String(s), Object::Number(n))
                if operator.token_type == TokenType::STAR && n.fract() == 0.0 =>
            {
                let count = if *n < 0.0 { 0 } else { *n as usize };
                Ok(Object::String(s.repeat(count)))
            }
            _ => Err(self.runtime_error(
                operator,
                format!(
                    "Unsupported binary operator '{}' for objects of type '{}' and '{}'",
                    operator.lexeme,
                    left.type_name(),
                    right.type_name()
                ),
            )),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl expr::Visitor<Object> for Interpreter {
    fn visit_literal_expr(&mut self, value: &LiteralValue) -> Result<Object, Error> {
        Ok(match value {
            LiteralValue::Boolean(b) => Object::Boolean(*b),
            LiteralValue::Null => Object::Null,
            LiteralValue::Number(n) => Object::Number(*n),
            LiteralValue::String(s) => Object::String(s.clone()),
        })
    }

    fn visit_grouping_expr(&mut self, expression: &Expr) -> Result<Object, Error> {
        self.evaluate(expression)
    }

    fn visit_unary_expr(&mut self, operator: &Token, right: &Expr) -> Result<Object, Error> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Object::Number(n) => Ok(Object::Number(-n)),
                _ => Err(self.runtime_error(
                    operator,
                    format!(
                        "Unsupported unary operator '{}' for object of type '{}'",
                        operator.lexeme,
                        right.type_name()
                    ),
                )),
            },
            TokenType::NEG => Ok(Object::Boolean(!right.is_truthy())),
            _ => unreachable!("parser only feeds unary operators here"),
        }
    }

    fn visit_binary_expr(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Object, Error> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;
        self.binary_op(operator, left, right)
    }

    // The result of a logical operator is the deciding operand itself, not
    // a coerced boolean, and the right side only runs when needed.
    fn visit_logical_expr(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Object, Error> {
        let left = self.evaluate(left)?;

        if operator.token_type == TokenType::OR {
            if left.is_truthy() {
                return Ok(left);
            }
        } else if !left.is_truthy() {
            return Ok(left);
        }

        self.evaluate(right)
    }

    fn visit_variable_expr(&mut self, id: usize, name: &Token) -> Result<Object, Error> {
        self.lookup_variable(name, id)
    }

    fn visit_assign_expr(&mut self, id: usize, name: &Token, value: &Expr) -> Result<Object, Error> {
        let value = self.evaluate(value)?;
        if let Some(distance) = self.locals.get(&id) {
            Environment::assign_at(&self.environment, *distance, name, value.clone())?;
        } else {
            self.globals.borrow_mut().assign(name, value.clone())?;
        }
        // assignment is an expression
        Ok(value)
    }

    fn visit_call_expr(
        &mut self,
        callee: &Expr,
        paren: &Token,
        arguments: &[Expr],
    ) -> Result<Object, Error> {
        let callee = self.evaluate(callee)?;

        let mut evaluated: Vec<Object> = Vec::with_capacity(arguments.len());
        for argument in arguments {
            evaluated.push(self.evaluate(argument)?);
        }

        let arity = match &callee {
            Object::Callable(function) => function.arity(),
            Object::Class(class) => class.arity(),
            _ => {
                return Err(self.runtime_error(
                    paren,
                    format!("'{}' is not callable", callee.type_name()),
                ))
            }
        };

        if arity != evaluated.len() {
            return Err(self.runtime_error(
                paren,
                format!("Expecting {} arguments, got {}", arity, evaluated.len()),
            ));
        }

        match callee {
            Object::Callable(function) => function.call(self, &evaluated),
            Object::Class(class) => JaplClass::call(&class, self, &evaluated),
            _ => unreachable!("checked above"),
        }
    }

    fn visit_get_expr(&mut self, object: &Expr, name: &Token) -> Result<Object, Error> {
        let object = self.evaluate(object)?;
        if let Object::Instance(ref instance) = object {
            instance.borrow().get(name, &object)
        } else {
            Err(self.runtime_error(name, "Only instances have properties".to_string()))
        }
    }

    fn visit_set_expr(&mut self, object: &Expr, name: &Token, value: &Expr) -> Result<Object, Error> {
        let object = self.evaluate(object)?;
        let instance = match object {
            Object::Instance(instance) => instance,
            _ => return Err(self.runtime_error(name, "Only instances have fields".to_string())),
        };
        let value = self.evaluate(value)?;
        instance.borrow_mut().set(name, value.clone());
        Ok(value)
    }

    fn visit_this_expr(&mut self, id: usize, keyword: &Token) -> Result<Object, Error> {
        self.lookup_variable(keyword, id)
    }

    // 'super' lives in the auxiliary class environment at the recorded
    // depth; 'this' sits one scope closer in the method's own scope.
    fn visit_super_expr(&mut self, id: usize, keyword: &Token, method: &Token) -> Result<Object, Error> {
        let distance = match self.locals.get(&id) {
            Some(distance) => *distance,
            None => {
                return Err(
                    self.runtime_error(keyword, "'super' outside a subclass method".to_string())
                )
            }
        };

        let superclass = Environment::get_at(&self.environment, distance, keyword)?;
        let this = Token::new(TokenType::THIS, "this", None, keyword.line);
        let instance = Environment::get_at(&self.environment, distance - 1, &this)?;

        match superclass {
            Object::Class(class) => match class.get_method(&method.lexeme) {
                Some(found) => Ok(Object::Callable(found.bind(instance))),
                None => Err(self.runtime_error(
                    method,
                    format!("Undefined property '{}'", method.lexeme),
                )),
            },
            _ => Err(self.runtime_error(keyword, "Superclass must be a class".to_string())),
        }
    }
}

impl stmt::Visitor<()> for Interpreter {
    fn visit_expression_stmt(&mut self, expression: &Expr) -> Result<(), Error> {
        self.evaluate(expression)?;
        Ok(())
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> Result<(), Error> {
        let value = match initializer {
            Some(init) => self.evaluate(init)?,
            None => Object::Null,
        };
        self.environment
            .borrow_mut()
            .define(name.lexeme.clone(), value);
        Ok(())
    }

    fn visit_del_stmt(&mut self, name: &Token) -> Result<(), Error> {
        self.environment.borrow_mut().delete(name)
    }

    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> Result<(), Error> {
        let environment = Rc::new(RefCell::new(Environment::from(&self.environment)));
        self.execute_block(statements, environment)
    }

    fn visit_if_stmt(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), Error> {
        if self.evaluate(condition)?.is_truthy() {
            self.execute(then_branch)
        } else if let Some(else_branch) = else_branch {
            self.execute(else_branch)
        } else {
            Ok(())
        }
    }

    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> Result<(), Error> {
        while self.evaluate(condition)?.is_truthy() {
            match self.execute(body) {
                // the loop owns the break unwind
                Err(Error::Break) => break,
                other => other?,
            }
        }
        Ok(())
    }

    fn visit_break_stmt(&mut self, _token: &Token) -> Result<(), Error> {
        Err(Error::Break)
    }

    fn visit_return_stmt(&mut self, _keyword: &Token, value: Option<&Expr>) -> Result<(), Error> {
        let value = match value {
            Some(expression) => self.evaluate(expression)?,
            None => Object::Null,
        };
        Err(Error::Return { value })
    }

    fn visit_function_stmt(
        &mut self,
        name: &Token,
        params: &[Token],
        body: &[Stmt],
    ) -> Result<(), Error> {
        let function = Function::User {
            name: name.clone(),
            params: params.to_vec(),
            body: body.to_vec(),
            closure: Rc::clone(&self.environment),
            is_initializer: false,
        };
        self.environment
            .borrow_mut()
            .define(name.lexeme.clone(), Object::Callable(function));
        Ok(())
    }

    fn visit_class_stmt(
        &mut self,
        name: &Token,
        methods: &[Stmt],
        superclass: Option<&Expr>,
    ) -> Result<(), Error> {
        let superclass = match superclass {
            Some(expression) => match self.evaluate(expression)? {
                Object::Class(class) => Some(class),
                _ => {
                    let token = match expression {
                        Expr::Variable { name, .. } => name.clone(),
                        _ => name.clone(),
                    };
                    return Err(self.runtime_error(&token, "Superclass must be a class".to_string()));
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(name.lexeme.clone(), Object::Null);

        // With a superclass, every method closes over one shared auxiliary
        // environment holding 'super'; it outlives this statement only
        // through those closures.
        let method_closure = match superclass {
            Some(ref class) => {
                let environment = Rc::new(RefCell::new(Environment::from(&self.environment)));
                environment
                    .borrow_mut()
                    .define("super".to_string(), Object::Class(Rc::clone(class)));
                environment
            }
            None => Rc::clone(&self.environment),
        };

        let mut method_table: HashMap<String, Function> = HashMap::new();
        for method in methods {
            if let Stmt::Function {
                name: method_name,
                params,
                body,
            } = method
            {
                let function = Function::User {
                    name: method_name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: Rc::clone(&method_closure),
                    is_initializer: method_name.lexeme == "init",
                };
                method_table.insert(method_name.lexeme.clone(), function);
            }
        }

        let class = Object::Class(Rc::new(JaplClass::new(
            name.lexeme.clone(),
            method_table,
            superclass,
        )));
        self.environment.borrow_mut().assign(name, class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn run_in(interpreter: &mut Interpreter, source: &str) -> Result<Option<Object>, Error> {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens()?.clone();
        let statements = Parser::new(&tokens).parse()?;
        Resolver::new(interpreter).resolve(&statements)?;
        interpreter.interpret(&statements)
    }

    fn run(source: &str) -> Result<Option<Object>, Error> {
        run_in(&mut Interpreter::new(), source)
    }

    fn eval(source: &str) -> Object {
        run(source)
            .expect("program failed")
            .expect("program has no final expression")
    }

    fn eval_number(source: &str) -> f64 {
        match eval(source) {
            Object::Number(n) => n,
            other => panic!("expected a number, got {:?}", other),
        }
    }

    fn eval_string(source: &str) -> String {
        match eval(source) {
            Object::String(s) => s,
            other => panic!("expected a string, got {:?}", other),
        }
    }

    fn runtime_message(source: &str) -> (String, usize) {
        match run(source) {
            Err(Error::Runtime { token, message }) => (message, token.line),
            other => panic!("expected a runtime error, got {:?}", other),
        }
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval_number("1 + 2 * 3;"), 7.0);
        assert_eq!(eval_number("(1 + 2) * 3;"), 9.0);
        assert_eq!(eval_number("2 ** 10;"), 1024.0);
        assert_eq!(eval_number("2 * 3 ** 2;"), 18.0);
        assert_eq!(eval_number("7 / 2;"), 3.5);
        assert_eq!(eval_number("-2 ** 2;"), 4.0); // unary binds tighter than **
    }

    #[test]
    fn modulo_takes_the_sign_of_the_divisor() {
        assert_eq!(eval_number("7 % 3;"), 1.0);
        assert_eq!(eval_number("-7 % 3;"), 2.0);
        assert_eq!(eval_number("7 % -3;"), -2.0);
    }

    #[test]
    fn division_by_zero_raises_at_the_operator() {
        let (message, line) = runtime_message("var x = 1;\nx / 0;");
        assert_eq!(message, "Cannot divide by 0");
        assert_eq!(line, 2);

        let (message, _) = runtime_message("1 % 0;");
        assert_eq!(message, "Cannot divide by 0");
    }

    #[test]
    fn string_concatenation_and_repetition() {
        assert_eq!(eval_string("'foo' + \"bar\";"), "foobar");
        assert_eq!(eval_string("'ab' * 3;"), "ababab");
        assert_eq!(eval_string("'ab' * 0;"), "");
        assert_eq!(eval_string("'ab' * -2;"), "");

        let (message, _) = runtime_message("3 * 'ab';");
        assert!(message.contains("Unsupported binary operator '*'"));
        let (message, _) = runtime_message("'ab' + 3;");
        assert!(message.contains("Unsupported binary operator '+'"));
        let (message, _) = runtime_message("'ab' * 1.5;");
        assert!(message.contains("Unsupported binary operator '*'"));
    }

    #[test]
    fn equality_is_total_and_cross_type() {
        assert!(std::matches!(eval("1 == 1;"), Object::Boolean(true)));
        assert!(std::matches!(eval("1 == '1';"), Object::Boolean(false)));
        assert!(std::matches!(eval("1 != '1';"), Object::Boolean(true)));
        assert!(std::matches!(eval("nil == nil;"), Object::Boolean(true)));
        assert!(std::matches!(eval("nil == false;"), Object::Boolean(false)));
    }

    #[test]
    fn comparison_requires_numbers() {
        let (message, _) = runtime_message("'a' < 'b';");
        assert!(message.contains("Unsupported binary operator '<'"));
    }

    #[test]
    fn unary_operators() {
        assert_eq!(eval_number("-(3 + 4);"), -7.0);
        assert!(std::matches!(eval("!nil;"), Object::Boolean(true)));
        assert!(std::matches!(eval("!0;"), Object::Boolean(false))); // 0 is truthy
        let (message, _) = runtime_message("-'x';");
        assert!(message.contains("Unsupported unary operator '-'"));
    }

    #[test]
    fn logical_operators_return_the_deciding_operand() {
        assert_eq!(eval_number("nil or 3;"), 3.0);
        assert_eq!(eval_number("2 or 3;"), 2.0);
        assert_eq!(eval_number("2 and 3;"), 3.0);
        assert!(std::matches!(eval("false and 3;"), Object::Boolean(false)));
    }

    #[test]
    fn logical_operators_short_circuit() {
        let source = "
            var called = false;
            fun touch() { called = true; return true; }
            true or touch();
            false and touch();
            called;
        ";
        assert!(std::matches!(eval(source), Object::Boolean(false)));
    }

    #[test]
    fn closures_capture_by_reference() {
        let source = "
            fun make() {
                var x = 0;
                fun inc() { x = x + 1; return x; }
                return inc;
            }
            var f = make();
            f(); f();
            f();
        ";
        assert_eq!(eval_number(source), 3.0);
    }

    #[test]
    fn while_loops_consume_break() {
        let source = "
            var i = 0;
            while (true) {
                if (i == 2) break;
                i = i + 1;
            }
            i;
        ";
        assert_eq!(eval_number(source), 2.0);
    }

    #[test]
    fn for_loops_run_the_desugared_while() {
        let source = "
            var total = 0;
            for (var i = 1; i <= 4; i = i + 1) total = total + i;
            total;
        ";
        assert_eq!(eval_number(source), 10.0);
    }

    #[test]
    fn shadowing_reads_the_innermost_binding() {
        let source = "
            var x = 'outer';
            var seen = '';
            {
                var x = 'inner';
                seen = seen + x;
            }
            seen + x;
        ";
        assert_eq!(eval_string(source), "innerouter");
    }

    #[test]
    fn inheritance_dispatches_through_super() {
        let source = "
            class A { greet() { return 'A'; } }
            class B < A { greet() { return super.greet() + 'B'; } }
            B().greet();
        ";
        assert_eq!(eval_string(source), "AB");
    }

    #[test]
    fn methods_are_inherited_when_not_overridden() {
        let source = "
            class A { greet() { return 'A'; } }
            class B < A { }
            B().greet();
        ";
        assert_eq!(eval_string(source), "A");
    }

    #[test]
    fn initializers_bind_and_return_this() {
        let source = "
            class P { init(n) { this.n = n; } }
            var p = P(7);
            p.n;
        ";
        assert_eq!(eval_number(source), 7.0);

        // an initializer invoked directly yields the instance again
        let source = "
            class P { init(n) { this.n = n; } }
            var p = P(1);
            p.init(2) == p;
        ";
        assert!(std::matches!(eval(source), Object::Boolean(true)));

        // a bare return exits early but still yields this
        let source = "
            class Q { init() { return; this.unreached = 1; } }
            isinstance(Q(), Q);
        ";
        assert!(std::matches!(eval(source), Object::Boolean(true)));
    }

    #[test]
    fn class_relations_via_natives() {
        let source = "
            class A { }
            class B < A { }
            var b = B();
            isinstance(b, B) and !isinstance(b, A)
                and issubclass(B, A) and issuperclass(A, B);
        ";
        assert!(std::matches!(eval(source), Object::Boolean(true)));
    }

    #[test]
    fn fields_are_per_instance() {
        let source = "
            class P { init(n) { this.n = n; } }
            var a = P(1);
            var b = P(2);
            a.n = 10;
            a.n + b.n;
        ";
        assert_eq!(eval_number(source), 12.0);
    }

    #[test]
    fn superclass_must_be_a_class() {
        let (message, _) = runtime_message("var NotAClass = 1; class B < NotAClass { }");
        assert_eq!(message, "Superclass must be a class");
    }

    #[test]
    fn calling_a_non_callable_raises() {
        let (message, _) = runtime_message("'hello'();");
        assert_eq!(message, "'string' is not callable");
    }

    #[test]
    fn arity_is_checked_exactly() {
        let (message, _) = runtime_message("fun f(a, b) { return a; } f(1);");
        assert_eq!(message, "Expecting 2 arguments, got 1");
        let (message, _) = runtime_message("clock(1);");
        assert_eq!(message, "Expecting 0 arguments, got 1");
    }

    #[test]
    fn properties_require_instances() {
        let (message, _) = runtime_message("1 .x;");
        assert_eq!(message, "Only instances have properties");
        let (message, _) = runtime_message("1 .x = 2;");
        assert_eq!(message, "Only instances have fields");
    }

    #[test]
    fn undefined_names_raise() {
        let (message, _) = runtime_message("missing;");
        assert_eq!(message, "Undefined name 'missing'");
    }

    #[test]
    fn del_removes_a_binding() {
        assert!(run("var x = 1; del x;").is_ok());
        let (message, _) = runtime_message("var x = 1; del x; x;");
        assert_eq!(message, "Undefined name 'x'");
        let (message, _) = runtime_message("del never_defined;");
        assert_eq!(message, "Undefined name 'never_defined'");
    }

    #[test]
    fn functions_without_return_yield_nil() {
        assert!(std::matches!(
            eval("fun f() { 1 + 1; } f() == nil;"),
            Object::Boolean(true)
        ));
    }

    #[test]
    fn recursion_gets_a_fresh_environment_per_call() {
        let source = "
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            fib(10);
        ";
        assert_eq!(eval_number(source), 55.0);
    }

    #[test]
    fn environment_is_restored_after_every_program() {
        let mut interpreter = Interpreter::new();
        run_in(&mut interpreter, "{ var x = 1; { var y = 2; } }").unwrap();
        assert!(Rc::ptr_eq(&interpreter.environment, &interpreter.globals));

        // even when a runtime error unwinds out of nested blocks
        let result = run_in(&mut interpreter, "{ var x = 1; { x / 0; } }");
        assert!(result.is_err());
        assert!(Rc::ptr_eq(&interpreter.environment, &interpreter.globals));
    }

    #[test]
    fn repl_state_persists_across_runs() {
        let mut interpreter = Interpreter::new();
        run_in(&mut interpreter, "var x = 40;").unwrap();
        let value = run_in(&mut interpreter, "x + 2;").unwrap();
        assert!(std::matches!(value, Some(Object::Number(n)) if n == 42.0));
    }

    #[test]
    fn interpret_returns_the_final_expression_value_only() {
        assert!(run("var x = 1;").unwrap().is_none());
        assert!(std::matches!(
            run("var x = 1; x;").unwrap(),
            Some(Object::Number(n)) if n == 1.0
        ));
        assert!(run("var x = 1; x; var y = 2;").unwrap().is_none());
    }

    #[test]
    fn partial_side_effects_survive_errors() {
        let mut interpreter = Interpreter::new();
        let result = run_in(&mut interpreter, "var x = 1; x = 2; x / 0;");
        assert!(result.is_err());
        let value = run_in(&mut interpreter, "x;").unwrap();
        assert!(std::matches!(value, Some(Object::Number(n)) if n == 2.0));
    }

    #[test]
    fn stringify_native_round_trips_through_the_scanner() {
        let source = "stringify('round trip');";
        let text = match eval(source) {
            Object::String(s) => s,
            other => panic!("expected a string, got {:?}", other),
        };
        let mut scanner = Scanner::new(&format!("'{}'", text));
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!(
            tokens[0].literal,
            Some(crate::token::Literal::Str("round trip".to_string()))
        );
    }
}
