use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn main() {
    let path = Path::new(&env::var("OUT_DIR").unwrap()).join("keywords.rs");
    let mut file = BufWriter::new(File::create(&path).unwrap());

    write!(
        &mut file,
        "pub static KEYWORDS: phf::Map<&'static str, TokenType> = {}",
        phf_codegen::Map::new()
            .entry("and", "TokenType::AND")
            .entry("break", "TokenType::BREAK")
            .entry("class", "TokenType::CLASS")
            .entry("del", "TokenType::DEL")
            .entry("else", "TokenType::ELSE")
            .entry("false", "TokenType::FALSE")
            .entry("for", "TokenType::FOR")
            .entry("fun", "TokenType::FUN")
            .entry("if", "TokenType::IF")
            .entry("nil", "TokenType::NIL")
            .entry("or", "TokenType::OR")
            .entry("return", "TokenType::RETURN")
            .entry("super", "TokenType::SUPER")
            .entry("this", "TokenType::THIS")
            .entry("true", "TokenType::TRUE")
            .entry("var", "TokenType::VAR")
            .entry("while", "TokenType::WHILE")
            .build()
    )
    .unwrap();
    writeln!(&mut file, ";").unwrap();
}
