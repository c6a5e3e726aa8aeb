//! Flux command-line.
//!
//! When called without argument it drops into an interactive
//! read-evaluate-print loop.  When called with a single path it runs the
//! corresponding file once.

use std::env;
use std::fs;
use std::io;
use std::process;

use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use flux::interpreter::Interpreter;

fn main() -> anyhow::Result<()> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.len() > 1 {
        print_usage();
        process::exit(1);
    }

    match args.first() {
        Some(path) => run_file(path),
        None => run_prompt(),
    }
}

fn print_usage() {
    println!("Usage: flux [script]");
    println!("  script: Path to a .flux file to execute");
    println!("  (no args): Start interactive REPL");
}

fn run_file(path: &str) -> anyhow::Result<()> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Could not open file {}", path))?;

    let mut stdout = io::stdout();
    let mut interp = Interpreter::new(&mut stdout);
    if let Err(e) = interp.run(&source) {
        eprintln!("{}", e);
    }
    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    println!("Flux Programming Language v1.0");
    println!("Type 'exit' to quit the REPL");
    println!();

    let mut stdout = io::stdout();
    let mut interp = Interpreter::new(&mut stdout);
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline("flux> ") {
            Ok(line) => {
                if line == "exit" || line == "quit" {
                    break;
                }
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);

                // Diagnostics go to stderr; globals survive the error.
                if let Err(e) = interp.run(&line) {
                    eprintln!("{}", e);
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    println!("Goodbye!");
    Ok(())
}
