//! LAH9000 interpreter.
//!
//! Reads a program up to its `END` line and runs it, writing `PRINT` output and the
//! closing diagnostic line to stdout.
//!
//! # Usage
//! ```text
//! lah9000 [FILE] [OPTIONS]
//! ```
//!
//! # Arguments
//! - `FILE`: Program source (defaults to stdin)
//!
//! # Options
//! - `--step-limit <n>`: Fault once the step counter passes `n` (defaults to 1000000)
//! - `--skip-unknown`: Step over unknown instructions instead of faulting
//! - `--check`: Decode every line and report problems without running
//! - `--profile`: Print per-instruction dispatch counts after the run
//! - `-v`, `-vv`: Log at info / debug level
//!
//! The process exit code reports how the run ended: 0 completed, 2 `HALT`, 10 address,
//! 11 overflow, 12 division by zero, 13 step limit, 14 decode, 1 I/O or usage error.

use lah9000::utils::log::{self, Level};
use lah9000::virtual_machine::config::{MachineConfig, UnknownOpcodePolicy};
use lah9000::virtual_machine::decoder::{check_program, render_diagnostic};
use lah9000::virtual_machine::errors::Fault;
use lah9000::virtual_machine::program::{Program, SENTINEL, read_until_sentinel};
use lah9000::virtual_machine::vm::{VM, exit_code, render_profile};
use lah9000::{error, info, warn};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::process;

/// Exit code for `--check` when any line fails to decode.
const CHECK_FAILED_EXIT: i32 = 14;

fn main() {
    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map(String::as_str).unwrap_or("lah9000");

    let mut input_path: Option<String> = None;
    let mut config = MachineConfig::default();
    let mut check = false;
    let mut profile = false;
    let mut verbosity = 0u8;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print!("{}", USAGE.replace("{program}", program_name));
                process::exit(0);
            }
            "--step-limit" => {
                i += 1;
                if i >= args.len() {
                    error!("--step-limit requires an argument");
                    process::exit(1);
                }
                let limit = args[i].parse::<u64>().unwrap_or_else(|_| {
                    error!("Invalid step limit: '{}' is not a valid number", args[i]);
                    process::exit(1);
                });
                config = config.with_step_limit(limit);
                i += 1;
            }
            "--skip-unknown" => {
                config = config.with_unknown_opcode(UnknownOpcodePolicy::Skip);
                i += 1;
            }
            "--check" => {
                check = true;
                i += 1;
            }
            "--profile" => {
                profile = true;
                i += 1;
            }
            "-v" => {
                verbosity = verbosity.max(1);
                i += 1;
            }
            "-vv" => {
                verbosity = 2;
                i += 1;
            }
            other if !other.starts_with('-') && input_path.is_none() => {
                input_path = Some(other.to_string());
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                eprint!("{}", USAGE.replace("{program}", program_name));
                process::exit(1);
            }
        }
    }

    match verbosity {
        0 => {
            if let Err(e) = log::init_from_env() {
                warn!("Ignoring {}: {}", log::LOG_ENV, e);
            }
        }
        1 => log::set_threshold(Level::Info),
        _ => log::set_threshold(Level::Debug),
    }

    let source_name = input_path.as_deref().unwrap_or("<stdin>");
    let program = load_program(input_path.as_deref()).unwrap_or_else(|e| {
        error!("Failed to read {}: {}", source_name, e);
        process::exit(1);
    });
    info!("Loaded {} line(s) from {}", program.len(), source_name);

    if check {
        let diagnostics = check_program(&program, config.unknown_opcode);
        for diag in &diagnostics {
            eprint!("{}", render_diagnostic(source_name, &program, diag));
        }
        if diagnostics.is_empty() {
            info!("{}: no problems found", source_name);
            process::exit(0);
        }
        error!("{}: {} problem(s) found", source_name, diagnostics.len());
        process::exit(CHECK_FAILED_EXIT);
    }

    let mut vm = VM::with_config(program, config);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = vm.execute(&mut out);

    if let Err(e) = out.flush() {
        error!("Failed to write output: {}", e);
        process::exit(1);
    }
    if let Err(Fault::Io(e)) = &result {
        error!("Failed to write output: {}", e);
    }

    if profile {
        eprint!("{}", render_profile(vm.profile()));
    }

    process::exit(exit_code(&result));
}

/// Reads the program from `path`, or stdin when no path is given.
fn load_program(path: Option<&str>) -> io::Result<Program> {
    let (program, terminated) = match path {
        Some(path) => read_until_sentinel(BufReader::new(File::open(path)?))?,
        None => read_until_sentinel(io::stdin().lock())?,
    };
    if !terminated {
        warn!("Input ended without an {} line", SENTINEL);
    }
    Ok(program)
}

const USAGE: &str = "\
LAH9000 Interpreter

USAGE:
    {program} [FILE] [OPTIONS]

ARGS:
    [FILE]    Program source, terminated by an END line (defaults to stdin)

OPTIONS:
    --step-limit <n>    Fault once the step counter passes n (defaults to 1000000)
    --skip-unknown      Step over unknown instructions instead of faulting
    --check             Decode every line and report problems without running
    --profile           Print per-instruction dispatch counts to stderr
    -v, -vv             Log at info / debug level (or set LAH_LOG)
    -h, --help          Print this help message

EXAMPLES:
    # Run a program file
    {program} countdown.lah

    # Run from stdin with a tighter step limit
    {program} --step-limit 5000 < countdown.lah

    # Validate without running
    {program} countdown.lah --check
";
