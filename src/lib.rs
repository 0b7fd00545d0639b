//! A tree-walking interpreter for the JAPL programming language.
//!
//! The pipeline is `Scanner` → `Parser` → `Resolver` → `Interpreter`: the
//! scanner turns source text into tokens, the parser builds the AST, the
//! resolver pre-computes the lexical depth of every variable reference and
//! enforces the static placement rules, and the interpreter walks the tree.
//! [`Japl`] ties the stages together for the `jpl` binary.

pub mod class;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod native;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod syntax;
pub mod token;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use error::Error;
use interpreter::Interpreter;
use object::Object;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// One interpreter session. The REPL feeds it successive inputs and the
/// globals (and resolved depths) persist between them.
pub struct Japl {
    interpreter: Interpreter,
    // closures keep earlier ASTs alive, so expression ids must never be
    // reused within a session
    next_expr_id: usize,
}

impl Japl {
    pub fn new() -> Self {
        Japl {
            interpreter: Interpreter::new(),
            next_expr_id: 0,
        }
    }

    /// Lexes, parses, resolves and interprets `source` against the current
    /// session state. Returns the value of the final top-level expression
    /// statement, if the program ended in one.
    pub fn run(&mut self, source: &str) -> Result<Option<Object>, Error> {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens()?;

        let mut parser = Parser::with_ids_from(tokens, self.next_expr_id);
        let parsed = parser.parse();
        self.next_expr_id = parser.id_watermark();
        let statements = parsed?;

        // A program that failed to resolve never starts executing, so the
        // interpreter state stays valid for the next REPL input.
        Resolver::new(&mut self.interpreter).resolve(&statements)?;

        self.interpreter.interpret(&statements)
    }

    pub fn run_file(&mut self, path: &Path) -> Result<(), Error> {
        let source = fs::read_to_string(path)?;
        self.run(&source).map(|_| ())
    }

    /// The interactive prompt: reads a line, runs it, echoes the resulting
    /// value (unless nil) and keeps going. Errors are printed and the
    /// session continues with its state intact.
    pub fn run_prompt(&mut self) -> Result<(), Error> {
        println!("[JAPL {} - Interactive REPL]", env!("CARGO_PKG_VERSION"));

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        write!(stdout, ">>> ")?;
        stdout.flush()?;
        for line in stdin.lock().lines() {
            match self.run(&line?) {
                Ok(Some(value)) if !matches!(value, Object::Null) => println!("{}", value),
                Ok(_) => (),
                Err(err) => eprintln!("{}", err),
            }
            write!(stdout, ">>> ")?;
            stdout.flush()?;
        }
        println!();

        Ok(())
    }
}

impl Default for Japl {
    fn default() -> Self {
        Self::new()
    }
}
