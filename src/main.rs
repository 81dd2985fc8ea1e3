use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::interpreter::{Config, Interpreter};
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::session::{Lox, Outcome};

/// Deeply recursive Lox programs recurse deeply in the evaluator too.
const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Emit tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a program and prints it back
    Parse {
        filename: PathBuf,

        /// Emit the syntax tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program, or starts a prompt without one
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file as UTF‑8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let source = std::fs::read_to_string(filename)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

/// Like [`read_file`] but exits with 74 (I/O error) on failure.
fn read_or_exit(filename: &Path) -> String {
    match read_file(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(74);
        }
    }
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report(outcome: &Outcome) {
    for error in outcome.errors() {
        eprintln!("{}", error);
    }
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let source = read_or_exit(filename);
    let mut tokens = Vec::new();
    let mut tokenized = true;

    for result in Scanner::new(&source) {
        match result {
            Ok(token) => {
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    }

    Ok(if tokenized { 0 } else { 65 })
}

fn parse(filename: &Path, json: bool) -> Result<i32> {
    let source = read_or_exit(filename);
    let (tokens, mut errors) = Scanner::scan_all(&source);
    let (statements, parse_errors) = Parser::new(tokens).parse();
    errors.extend(parse_errors);

    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{}", e);
        }
        return Ok(65);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&statements)?);
    } else {
        print!("{}", AstPrinter::program(&statements));
    }

    Ok(0)
}

fn evaluate(filename: &Path) -> Result<i32> {
    let source = read_or_exit(filename);
    let (tokens, errors) = Scanner::scan_all(&source);

    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{}", e);
        }
        return Ok(65);
    }

    let expr = match Parser::new(tokens).parse_expression() {
        Ok(expr) => expr,
        Err(errors) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            return Ok(65);
        }
    };

    debug!("AST: {}", AstPrinter::print(&expr));

    let mut interpreter = Interpreter::new();
    match interpreter.evaluate_expression(&expr) {
        Ok(value) => {
            println!("{}", value);
            Ok(0)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(70)
        }
    }
}

fn run_file(filename: &Path) -> Result<i32> {
    let source = read_or_exit(filename);
    let mut lox = Lox::new();

    let outcome = lox.run(&source, Config::default());
    report(&outcome);

    Ok(outcome.exit_code())
}

/// Read‑eval‑print loop. Each line is its own run; errors never end the session.
fn run_prompt() -> Result<i32> {
    let mut lox = Lox::new();
    let config = Config {
        print_expressions: true,
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };

        let outcome = lox.run(&line?, config);
        report(&outcome);
    }

    Ok(0)
}

fn real_main(args: Cli) -> Result<i32> {
    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(&filename, json),
        Commands::Parse { filename, json } => parse(&filename, json),
        Commands::Evaluate { filename } => evaluate(&filename),
        Commands::Run { filename: Some(filename) } => run_file(&filename),
        Commands::Run { filename: None } => run_prompt(),
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    }

    info!("CLI arguments: {:?}", args);

    let code = thread::Builder::new()
        .name("lox".into())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || real_main(args))
        .context("Failed to spawn interpreter thread")?
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))??;

    if code != 0 {
        debug!("Exiting with code {}", code);
        process::exit(code);
    }

    Ok(())
}
