use crate::error::Error;
use crate::syntax::{Expr, LiteralValue, Stmt};
use crate::token::{Literal, Token, TokenType};

pub struct Parser<'t> {
    tokens: &'t [Token],
    current: usize,
    next_id: usize,
}

macro_rules! matches {
    ( $sel:ident, $( $x:expr ),* ) => {
        {
            if $( $sel.check($x) )||* {
                $sel.advance();
                true
            } else {
                false
            }
        }
    };
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self::with_ids_from(tokens, 0)
    }

    // Expression ids key the resolver's depth map, so they must stay unique
    // for the lifetime of an interpreter. A REPL session hands each new
    // parser the watermark of the previous one.
    pub fn with_ids_from(tokens: &'t [Token], first_id: usize) -> Self {
        Self {
            tokens,
            current: 0,
            next_id: first_id,
        }
    }

    /// The first id a later parser may hand out.
    pub fn id_watermark(&self) -> usize {
        self.next_id
    }

    // program        → declaration* EOF ;
    //
    // The first syntax error synchronizes to a statement boundary and then
    // propagates, so a single diagnostic is produced per invocation and no
    // partially-parsed program ever reaches the resolver.
    pub fn parse(&mut self) -> Result<Vec<Stmt>, Error> {
        let mut statements: Vec<Stmt> = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(statement) => statements.push(statement),
                Err(err) => {
                    self.synchronize();
                    return Err(err);
                }
            }
        }
        Ok(statements)
    }

    // declaration    → classDecl | funDecl | varDecl | statement ;
    fn declaration(&mut self) -> Result<Stmt, Error> {
        if matches!(self, TokenType::CLASS) {
            self.class_declaration()
        } else if matches!(self, TokenType::FUN) {
            self.function("function")
        } else if matches!(self, TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    // classDecl      → "class" IDENT ( "<" IDENT )? "{" function* "}" ;
    fn class_declaration(&mut self) -> Result<Stmt, Error> {
        let name = self.consume(TokenType::ID, "Expecting class name")?;
        let superclass = if matches!(self, TokenType::LT) {
            self.consume(TokenType::ID, "Expecting superclass name")?;
            Some(Expr::Variable {
                id: self.fresh_id(),
                name: self.previous().clone(),
            })
        } else {
            None
        };
        self.consume(TokenType::LB, "Expecting '{' before class body")?;

        let mut methods: Vec<Stmt> = Vec::new();
        while !self.check(TokenType::RB) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RB, "Expecting '}' after class body")?;

        Ok(Stmt::Class {
            name,
            methods,
            superclass,
        })
    }

    // funDecl        → "fun" function ;
    // function       → IDENT "(" parameters? ")" block ;
    // Instances are loose bags of data, so there is no field list in class
    // declarations and this rule serves both functions and methods.
    fn function(&mut self, kind: &str) -> Result<Stmt, Error> {
        let name = self.consume(TokenType::ID, &format!("Expecting {} name", kind))?;

        self.consume(
            TokenType::LP,
            &format!("Expecting parenthesis after {} name", kind),
        )?;
        let mut params: Vec<Token> = Vec::new();
        if !self.check(TokenType::RP) {
            loop {
                if params.len() >= 255 {
                    return Err(self.error(self.peek(), "Cannot have more than 255 parameters"));
                }

                let param = self.consume(TokenType::ID, "Expecting parameter name")?;
                if params.iter().any(|p| p.lexeme == param.lexeme) {
                    return Err(self.error(
                        &param,
                        "Multiple parameters with the same name in function declaration are not allowed",
                    ));
                }
                params.push(param);

                if !matches!(self, TokenType::COMMA) {
                    break;
                }
            }
        }
        self.consume(TokenType::RP, "Expecting ')' after parameters")?;

        self.consume(
            TokenType::LB,
            &format!("Expecting '{{' before {} body", kind),
        )?;
        let body = self.block()?;
        Ok(Stmt::Function { name, params, body })
    }

    // statement      → exprStmt | ifStmt | whileStmt | forStmt
    //                | returnStmt | breakStmt | delStmt | block ;
    fn statement(&mut self) -> Result<Stmt, Error> {
        if matches!(self, TokenType::FOR) {
            self.for_statement()
        } else if matches!(self, TokenType::IF) {
            self.if_statement()
        } else if matches!(self, TokenType::RETURN) {
            self.return_statement()
        } else if matches!(self, TokenType::WHILE) {
            self.while_statement()
        } else if matches!(self, TokenType::BREAK) {
            self.break_statement()
        } else if matches!(self, TokenType::DEL) {
            self.del_statement()
        } else if matches!(self, TokenType::LB) {
            Ok(Stmt::Block {
                statements: self.block()?,
            })
        } else {
            self.expression_statement()
        }
    }

    // returnStmt     → "return" expression? ";" ;
    fn return_statement(&mut self) -> Result<Stmt, Error> {
        let keyword = self.previous().clone();
        let value = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Missing semicolon after statement")?;
        Ok(Stmt::Return { keyword, value })
    }

    // breakStmt      → "break" ";" ;
    fn break_statement(&mut self) -> Result<Stmt, Error> {
        let token = self.previous().clone();
        self.consume(TokenType::SEMICOLON, "Missing semicolon after statement")?;
        Ok(Stmt::Break { token })
    }

    // delStmt        → "del" IDENT ";" ;
    fn del_statement(&mut self) -> Result<Stmt, Error> {
        let name = self.consume(TokenType::ID, "Expecting a variable name after 'del'")?;
        self.consume(TokenType::SEMICOLON, "Missing semicolon after statement")?;
        Ok(Stmt::Del { name })
    }

    // the else binds to the nearest preceding if
    // ifStmt         → "if" "(" expression ")" statement ( "else" statement )? ;
    fn if_statement(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenType::LP, "The if condition must be parenthesized")?;
        let condition = self.expression()?;
        self.consume(TokenType::RP, "The if condition must be parenthesized")?;

        let then_branch = Box::new(self.statement()?);

        let else_branch = if matches!(self, TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    // block          → "{" declaration* "}" ;
    fn block(&mut self) -> Result<Vec<Stmt>, Error> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RB) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RB, "Unexpected end of block")?;
        Ok(statements)
    }

    // whileStmt      → "while" "(" expression ")" statement ;
    fn while_statement(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenType::LP, "The while condition must be parenthesized")?;
        let condition = self.expression()?;
        self.consume(TokenType::RP, "The while condition must be parenthesized")?;
        let body = self.statement()?;

        Ok(Stmt::While {
            condition,
            body: Box::new(body),
        })
    }

    // forStmt        → "for" "(" ( varDecl | exprStmt | ";" ) expression? ";"
    //                  expression? ")" statement ;
    // Desugars to { init; while (cond) { body; incr; } } with an omitted
    // condition defaulting to true.
    fn for_statement(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenType::LP, "The for condition must be parenthesized")?;

        let initializer = if matches!(self, TokenType::SEMICOLON) {
            None
        } else if matches!(self, TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Missing semicolon after loop condition")?;

        let increment = if !self.check(TokenType::RP) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::RP, "The for condition must be parenthesized")?;

        let mut body = self.statement()?;

        if let Some(incr) = increment {
            body = Stmt::Block {
                statements: vec![body, Stmt::Expression { expression: incr }],
            }
        }

        body = Stmt::While {
            condition: condition.unwrap_or(Expr::Literal {
                value: LiteralValue::Boolean(true),
            }),
            body: Box::new(body),
        };

        if let Some(init) = initializer {
            body = Stmt::Block {
                statements: vec![init, body],
            };
        }

        Ok(body)
    }

    // varDecl        → "var" IDENT ( "=" expression )? ";" ;
    fn var_declaration(&mut self) -> Result<Stmt, Error> {
        let name = self.consume(TokenType::ID, "Expecting a variable name")?;
        let initializer = if matches!(self, TokenType::EQ) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Missing semicolon after declaration")?;

        Ok(Stmt::Var { name, initializer })
    }

    // expression     → assignment ;
    fn expression(&mut self) -> Result<Expr, Error> {
        self.assignment()
    }

    // The left side is parsed as an ordinary expression first and converted
    // to an assignment target if an '=' follows; every valid target is also
    // valid expression syntax.
    //
    // assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
    fn assignment(&mut self) -> Result<Expr, Error> {
        let expr = self.logic_or()?;

        if matches!(self, TokenType::EQ) {
            let equals = self.previous().clone();
            // assignment is right-associative, so recurse instead of looping
            let value = Box::new(self.assignment()?);

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.fresh_id(),
                    name,
                    value,
                }),
                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value,
                }),
                _ => Err(self.error(&equals, "Invalid assignment target")),
            };
        }

        Ok(expr)
    }

    // logic_or       → logic_and ( "or" logic_and )* ;
    fn logic_or(&mut self) -> Result<Expr, Error> {
        let mut expr = self.logic_and()?;

        while matches!(self, TokenType::OR) {
            let operator = self.previous().clone();
            let right = self.logic_and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    // logic_and      → equality ( "and" equality )* ;
    fn logic_and(&mut self) -> Result<Expr, Error> {
        let mut expr = self.equality()?;

        while matches!(self, TokenType::AND) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    // equality       → comparison ( ( "==" | "!=" ) comparison )* ;
    fn equality(&mut self) -> Result<Expr, Error> {
        let mut expr: Expr = self.comparison()?;

        while matches!(self, TokenType::NE, TokenType::DEQ) {
            let operator = self.previous().clone();
            let right: Expr = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }
        Ok(expr)
    }

    // comparison     → addition ( ( ">" | ">=" | "<" | "<=" ) addition )* ;
    fn comparison(&mut self) -> Result<Expr, Error> {
        let mut expr: Expr = self.addition()?;

        while matches!(self, TokenType::GT, TokenType::GE, TokenType::LT, TokenType::LE) {
            let operator = self.previous().clone();
            let right: Expr = self.addition()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    // addition       → multiplication ( ( "+" | "-" ) multiplication )* ;
    fn addition(&mut self) -> Result<Expr, Error> {
        let mut expr: Expr = self.multiplication()?;

        while matches!(self, TokenType::PLUS, TokenType::MINUS) {
            let operator = self.previous().clone();
            let right: Expr = self.multiplication()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }
        Ok(expr)
    }

    // multiplication → power ( ( "*" | "/" | "%" ) power )* ;
    fn multiplication(&mut self) -> Result<Expr, Error> {
        let mut expr: Expr = self.power()?;

        while matches!(self, TokenType::STAR, TokenType::SLASH, TokenType::MOD) {
            let operator = self.previous().clone();
            let right: Expr = self.power()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    // power          → unary ( "**" unary )* ;
    fn power(&mut self) -> Result<Expr, Error> {
        let mut expr: Expr = self.unary()?;

        while matches!(self, TokenType::POW) {
            let operator = self.previous().clone();
            let right: Expr = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            }
        }

        Ok(expr)
    }

    // unary          → ( "!" | "-" ) unary | call ;
    fn unary(&mut self) -> Result<Expr, Error> {
        if matches!(self, TokenType::NEG, TokenType::MINUS) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    // call           → primary ( "(" arguments? ")" | "." IDENT )* ;
    fn call(&mut self) -> Result<Expr, Error> {
        let mut expr = self.primary()?;

        loop {
            if matches!(self, TokenType::LP) {
                expr = self.finish_call(expr)?;
            } else if matches!(self, TokenType::DOT) {
                let name = self.consume(TokenType::ID, "Expecting property name after '.'")?;
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                }
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, Error> {
        let mut arguments: Vec<Expr> = Vec::new();
        if !self.check(TokenType::RP) {
            loop {
                if arguments.len() >= 255 {
                    return Err(self.error(self.peek(), "Cannot have more than 255 arguments"));
                }

                arguments.push(self.expression()?);

                if !matches!(self, TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RP, "Expecting ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    // primary        → NUMBER | STRING | "true" | "false" | "nil"
    //                | "(" expression ")" | IDENT
    //                | "this" | "super" "." IDENT ;
    fn primary(&mut self) -> Result<Expr, Error> {
        let expr = match self.peek().token_type {
            TokenType::FALSE => Expr::Literal {
                value: LiteralValue::Boolean(false),
            },
            TokenType::TRUE => Expr::Literal {
                value: LiteralValue::Boolean(true),
            },
            TokenType::NIL => Expr::Literal {
                value: LiteralValue::Null,
            },
            TokenType::NUM => {
                let value = match self.peek().literal {
                    Some(Literal::Number(n)) => LiteralValue::Number(n),
                    _ => return Err(self.error(self.peek(), "Invalid syntax")),
                };
                Expr::Literal { value }
            }
            TokenType::STR => {
                let value = match &self.peek().literal {
                    Some(Literal::Str(s)) => LiteralValue::String(s.clone()),
                    _ => return Err(self.error(self.peek(), "Invalid syntax")),
                };
                Expr::Literal { value }
            }
            TokenType::LP => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenType::RP, "Expecting ')' after expression")?;
                return Ok(Expr::Grouping {
                    expression: Box::new(expr),
                });
            }
            TokenType::ID => Expr::Variable {
                id: self.fresh_id(),
                name: self.peek().clone(),
            },
            TokenType::THIS => Expr::This {
                id: self.fresh_id(),
                keyword: self.peek().clone(),
            },
            TokenType::SUPER => {
                let keyword = self.advance().clone();
                self.consume(TokenType::DOT, "Expecting '.' after 'super'")?;
                let method = self.consume(TokenType::ID, "Expecting superclass method name")?;
                return Ok(Expr::Super {
                    id: self.fresh_id(),
                    keyword,
                    method,
                });
            }
            _ => return Err(self.error(self.peek(), "Invalid syntax")),
        };

        self.advance();

        Ok(expr)
    }

    // exprStmt       → expression ";" ;
    fn expression_statement(&mut self) -> Result<Stmt, Error> {
        let value = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Missing semicolon after statement")?;
        Ok(Stmt::Expression { expression: value })
    }

    // Skip tokens until a statement boundary or a keyword that begins a new
    // declaration, so the parser is in a sane state when it hands back the
    // error.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::RETURN => return,
                _ => self.advance(),
            };
        }
    }

    // returns true if the current token is of the given type without
    // consuming it
    fn check(&self, token_type: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek().token_type == token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.current)
            .expect("token stream ends with EOF")
    }

    fn previous(&self) -> &Token {
        self.tokens
            .get(self.current - 1)
            .expect("no token has been consumed yet")
    }

    fn consume(&mut self, token_type: TokenType, msg: &str) -> Result<Token, Error> {
        if self.check(token_type) {
            Ok(self.advance().clone())
        } else {
            Err(self.error(self.peek(), msg))
        }
    }

    fn error(&self, token: &Token, msg: &str) -> Error {
        Error::Parse {
            token: token.clone(),
            message: msg.to_string(),
        }
    }

    fn fresh_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id - 1
    }
}
