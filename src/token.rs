use std::fmt;

// Token kind names follow the language's own vocabulary (NEG is '!',
// DEQ is '==', LB/RB are braces).
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Single-character tokens.
    LP,
    RP,
    LB,
    RB,
    COMMA,
    DOT,
    PLUS,
    MINUS,
    SLASH,
    SEMICOLON,
    STAR,

    // One or two character tokens.
    NEG,
    NE,
    EQ,
    DEQ,
    GT,
    LT,
    GE,
    LE,
    MOD,
    POW,

    // Literals.
    ID,
    STR,
    NUM,

    // Keywords.
    AND,
    CLASS,
    ELSE,
    FOR,
    FUN,
    FALSE,
    IF,
    NIL,
    OR,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,
    DEL,
    BREAK,

    EOF,
}

// The reserved-word map is built at compile time by build.rs.
include!(concat!(env!("OUT_DIR"), "/keywords.rs"));

/// The decoded value of a literal token. Numbers and strings are the only
/// token kinds that carry one.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: &str, literal: Option<Literal>, line: usize) -> Self {
        Self {
            token_type,
            lexeme: lexeme.to_string(),
            literal,
            line,
        }
    }

    /// The "at ..." fragment of a diagnostic pinned to this token.
    pub fn location(&self) -> String {
        if self.token_type == TokenType::EOF {
            "at end".to_string()
        } else {
            format!("at '{}'", self.lexeme)
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} '{}'", self.token_type, self.lexeme)
    }
}
