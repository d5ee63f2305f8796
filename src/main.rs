use std::fs;
use std::io;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser as ClapParser;

use loxide::lox::Lox;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to execute; the interactive prompt starts when omitted
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.script {
        Some(path) => run_file(&path),

        None => run_prompt(),
    }
}

fn run_file(path: &Path) -> anyhow::Result<ExitCode> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut lox = Lox::new(io::stdout(), io::stderr());
    lox.run(&source);

    if lox.had_error() {
        return Ok(ExitCode::from(65));
    }

    if lox.had_runtime_error() {
        return Ok(ExitCode::from(70));
    }

    Ok(ExitCode::SUCCESS)
}

fn run_prompt() -> anyhow::Result<ExitCode> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let mut lox = Lox::new(io::stdout(), io::stderr());

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = match lines.next() {
            Some(line) => line?,
            None => break,
        };

        if line.trim() == "exit" {
            break;
        }

        // A trailing backslash continues the statement on the next line.
        while line.ends_with('\\') {
            line.pop();

            print!("> ");
            io::stdout().flush()?;

            match lines.next() {
                Some(next) => line.push_str(&next?),
                None => break,
            }
        }

        lox.run(&line);
        lox.reset();
    }

    Ok(ExitCode::SUCCESS)
}
