//! gridcalc - run spreadsheet command scripts or evaluate a single formula

mod config;
mod error;
mod script;

use anyhow::Context;
use gridcalc_core::{CellValue, Sheet};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: gridcalc [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Command script to run (default: stdin)");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  set <CELL> <TEXT>         Set a literal or =formula");
    eprintln!("  clear <CELL>              Clear a cell");
    eprintln!("  get <CELL>                Print the computed value");
    eprintln!("  text <CELL>               Print the input text");
    eprintln!("  refs <CELL>               Print the cells a formula reads");
    eprintln!("  size                      Print the printable size (rows cols)");
    eprintln!("  values | texts            Print the sheet, tab separated");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula and print its value");
    eprintln!("  --config <path>           Load settings from TOML file");
    eprintln!("  -h, --help                Print help");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut file_path: Option<PathBuf> = None;
    let mut formula: Option<String> = None;
    let mut config_file: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires a formula");
                    std::process::exit(1);
                }
                formula = Some(args[i].to_string());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                config_file = Some(PathBuf::from(&args[i]));
            }
            arg if arg.starts_with('-') && arg != "-" => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if file_path.is_none() {
                    file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    init_logging();

    let (config, warnings) = config::load_config(config_file.as_ref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    debug!(?config, "loaded sheet configuration");
    let mut sheet = Sheet::with_config(&config);

    let result = match formula {
        Some(formula) => run_formula(&mut sheet, &formula),
        None => run_file(&mut sheet, file_path),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run_formula(sheet: &mut Sheet, formula: &str) -> anyhow::Result<i32> {
    let value = script::evaluate_formula(sheet, formula)?;
    println!("{}", value);
    Ok(if matches!(value, CellValue::Error(_)) { 1 } else { 0 })
}

fn run_file(sheet: &mut Sheet, file_path: Option<PathBuf>) -> anyhow::Result<i32> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut err = io::stderr();

    let failures = match file_path.filter(|path| path.as_os_str() != "-") {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            script::run_script(sheet, BufReader::new(file), &mut out, &mut err)?
        }
        None => script::run_script(sheet, io::stdin().lock(), &mut out, &mut err)?,
    };

    Ok(if failures > 0 { 1 } else { 0 })
}
