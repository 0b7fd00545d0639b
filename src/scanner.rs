// A lexeme is the raw sequence of characters that represents a meaningful
// unit; a token pairs it with its kind and, for numbers and strings, the
// already-decoded value.

use crate::error::Error;
use crate::token::{Literal, Token, TokenType, KEYWORDS};

pub struct Scanner {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(&mut self) -> Result<&Vec<Token>, Error> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens
            .push(Token::new(TokenType::EOF, "", None, self.line));
        Ok(&self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), Error> {
        let c: char = self.advance();
        match c {
            // single char
            '(' => self.add_token(TokenType::LP),
            ')' => self.add_token(TokenType::RP),
            '{' => self.add_token(TokenType::LB),
            '}' => self.add_token(TokenType::RB),
            ',' => self.add_token(TokenType::COMMA),
            '.' => self.add_token(TokenType::DOT),
            '-' => self.add_token(TokenType::MINUS),
            '+' => self.add_token(TokenType::PLUS),
            ';' => self.add_token(TokenType::SEMICOLON),
            '%' => self.add_token(TokenType::MOD),

            // can be double char
            '*' => {
                if self.matches('*') {
                    self.add_token(TokenType::POW);
                } else {
                    self.add_token(TokenType::STAR);
                }
            }
            '!' => {
                if self.matches('=') {
                    self.add_token(TokenType::NE);
                } else {
                    self.add_token(TokenType::NEG);
                }
            }
            '=' => {
                if self.matches('=') {
                    self.add_token(TokenType::DEQ);
                } else {
                    self.add_token(TokenType::EQ);
                }
            }
            '<' => {
                if self.matches('=') {
                    self.add_token(TokenType::LE);
                } else {
                    self.add_token(TokenType::LT);
                }
            }
            '>' => {
                if self.matches('=') {
                    self.add_token(TokenType::GE);
                } else {
                    self.add_token(TokenType::GT);
                }
            }

            // can be a comment
            '/' => {
                if self.matches('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.matches('*') {
                    self.block_comment()?;
                } else {
                    self.add_token(TokenType::SLASH);
                }
            }

            // ignore whitespace
            ' ' | '\t' | '\r' => (),

            '\n' => {
                self.line += 1;
            }

            // either delimiter opens a string, the same one closes it
            '\'' | '"' => self.string(c)?,

            c => {
                if c.is_ascii_digit() {
                    self.number();
                } else if c.is_alphabetic() || c == '_' {
                    self.identifier();
                } else {
                    return Err(Error::Lex {
                        line: self.line,
                        message: format!("unexpected character '{}'", c),
                    });
                }
            }
        }
        Ok(())
    }

    // Consume characters until the closing delimiter. Strings may span
    // newlines; an unterminated literal is reported at its opening line.
    fn string(&mut self, delimiter: char) -> Result<(), Error> {
        let opening_line = self.line;
        while self.peek() != delimiter && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::Lex {
                line: opening_line,
                message: "unterminated string literal".to_string(),
            });
        }

        // the closing delimiter
        self.advance();

        let literal: String = self.source[(self.start + 1)..(self.current - 1)]
            .iter()
            .collect();
        self.add_literal_token(TokenType::STR, Literal::Str(literal));
        Ok(())
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // consume the '.' only when a fractional part follows
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme: String = self.source[self.start..self.current].iter().collect();
        let literal: f64 = lexeme.parse().expect("scanned number is parseable");

        self.add_literal_token(TokenType::NUM, Literal::Number(literal));
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let tpe = KEYWORDS.get(text.as_str()).copied().unwrap_or(TokenType::ID);

        self.add_token(tpe);
    }

    // Block comments nest: every '/*' bumps the depth, every '*/' closes
    // one level, and the whole comment must reach depth zero before EOF.
    fn block_comment(&mut self) -> Result<(), Error> {
        let opening_line = self.line;
        let mut depth = 1;
        while depth > 0 {
            if self.is_at_end() {
                return Err(Error::Lex {
                    line: opening_line,
                    message: "unterminated block comment".to_string(),
                });
            }
            if self.peek() == '/' && self.peek_next() == '*' {
                self.advance();
                self.advance();
                depth += 1;
            } else if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                depth -= 1;
            } else {
                if self.peek() == '\n' {
                    self.line += 1;
                }
                self.advance();
            }
        }
        Ok(())
    }

    fn advance(&mut self) -> char {
        self.current += 1;
        self.source[self.current - 1]
    }

    // like advance but doesn't consume the character
    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.add_literal(token_type, None);
    }

    fn add_literal_token(&mut self, token_type: TokenType, literal: Literal) {
        self.add_literal(token_type, Some(literal));
    }

    fn add_literal(&mut self, token_type: TokenType, literal: Option<Literal>) {
        let text: String = self.source[self.start..self.current].iter().collect();
        self.tokens
            .push(Token::new(token_type, &text, literal, self.line));
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    // only consume the current character if it is the expected one
    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() {
            return false;
        }

        if self.source[self.current] != expected {
            return false;
        }

        self.current += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenType> {
        let mut scanner = Scanner::new(source);
        scanner
            .scan_tokens()
            .expect("scan failed")
            .iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn single_and_double_char_operators() {
        assert_eq!(
            kinds("+ - * / % ** < <= > >= == != = !"),
            vec![
                TokenType::PLUS,
                TokenType::MINUS,
                TokenType::STAR,
                TokenType::SLASH,
                TokenType::MOD,
                TokenType::POW,
                TokenType::LT,
                TokenType::LE,
                TokenType::GT,
                TokenType::GE,
                TokenType::DEQ,
                TokenType::NE,
                TokenType::EQ,
                TokenType::NEG,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("var del break fun whileish _x1"),
            vec![
                TokenType::VAR,
                TokenType::DEL,
                TokenType::BREAK,
                TokenType::FUN,
                TokenType::ID,
                TokenType::ID,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn numbers_decode_eagerly() {
        let mut scanner = Scanner::new("12 3.5");
        let tokens = scanner.scan_tokens().expect("scan failed");
        assert_eq!(tokens[0].literal, Some(Literal::Number(12.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(3.5)));
        // '12.' does not swallow the dot
        assert_eq!(
            kinds("12."),
            vec![TokenType::NUM, TokenType::DOT, TokenType::EOF]
        );
    }

    #[test]
    fn strings_accept_both_delimiters() {
        let mut scanner = Scanner::new("'it\"s' \"a 'b'\"");
        let tokens = scanner.scan_tokens().expect("scan failed");
        assert_eq!(tokens[0].literal, Some(Literal::Str("it\"s".to_string())));
        assert_eq!(tokens[1].literal, Some(Literal::Str("a 'b'".to_string())));
    }

    #[test]
    fn unterminated_string_pins_the_opening_line() {
        let mut scanner = Scanner::new("\n\n\"abc\ndef");
        match scanner.scan_tokens() {
            Err(Error::Lex { line, message }) => {
                assert_eq!(line, 3);
                assert_eq!(message, "unterminated string literal");
            }
            other => panic!("expected a lex error, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn block_comments_nest() {
        assert_eq!(
            kinds("1 /* a /* b */ c */ 2"),
            vec![TokenType::NUM, TokenType::NUM, TokenType::EOF]
        );
    }

    #[test]
    fn unterminated_block_comment_pins_the_opening_line() {
        let mut scanner = Scanner::new("1;\n/* open /* closed */\n");
        match scanner.scan_tokens() {
            Err(Error::Lex { line, message }) => {
                assert_eq!(line, 2);
                assert_eq!(message, "unterminated block comment");
            }
            other => panic!("expected a lex error, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn line_comments_and_newlines_advance_lines() {
        let mut scanner = Scanner::new("1 // trailing\n'two\nlines'\n3");
        let tokens = scanner.scan_tokens().expect("scan failed").clone();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 3); // string closed on line 3
        assert_eq!(tokens[2].line, 4);
        assert_eq!(tokens.last().map(|t| t.line), Some(4));
    }

    #[test]
    fn unexpected_character_is_a_lex_error() {
        let mut scanner = Scanner::new("var x = @;");
        assert!(matches!(
            scanner.scan_tokens(),
            Err(Error::Lex { line: 1, .. })
        ));
    }
}
