//! kvmutex: named mutual exclusion over a shared key-value medium.
//!
//! This is the main entry point for the `kvmutex` CLI. It parses arguments,
//! sets up logging and the runtime, dispatches to the appropriate command
//! handler, and handles errors with proper exit codes.

mod cli;
mod commands;
mod setup;

use cli::Cli;
use kvmutex::exit_codes;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(err) = setup::init_tracing(cli.verbose) {
        eprintln!("Warning: {:#}", err);
    }

    let runtime = match setup::create_runtime() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            return exit_code(exit_codes::USER_ERROR);
        }
    };

    match commands::dispatch(cli, &runtime) {
        Ok(code) => exit_code(code),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            exit_code(err.exit_code())
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
