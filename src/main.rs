use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use japl::error::Error;
use japl::Japl;

#[derive(Parser)]
#[command(name = "jpl")]
#[command(about = "The JAPL programming language", long_about = None)]
#[command(version)]
struct Cli {
    /// Script to run; omit it to start the interactive REPL
    script: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let mut japl = Japl::new();

    match cli.script {
        Some(path) => {
            if let Err(err) = japl.run_file(&path) {
                eprintln!("{}", err);
                exit(match err {
                    Error::Io(_) => 74,
                    Error::Runtime { .. } => 70,
                    // an unwind this far out is an interpreter bug, but it
                    // still has to fail loudly
                    Error::Break | Error::Return { .. } => 70,
                    _ => 65,
                });
            }
        }
        None => {
            if let Err(err) = japl.run_prompt() {
                eprintln!("{}", err);
                exit(74);
            }
        }
    }
}
