//! Driver binary (`spec.md` §6): reads a 3AC listing from standard input,
//! runs the requested pass pipeline, and writes the rendered backend output
//! to standard output.

use std::io::{self, Read, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match tacopt::cli::parse_args(&argv) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("tacopt: {err}");
            return ExitCode::from(1);
        }
    };

    let mut input = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut input) {
        eprintln!("tacopt: failed to read standard input: {err}");
        return ExitCode::from(1);
    }

    match tacopt::run(&input, &args.passes, args.backend) {
        Ok(output) => {
            if io::stdout().write_all(output.as_bytes()).is_err() {
                return ExitCode::from(1);
            }
            ExitCode::SUCCESS
        }
        Err(tacopt::RunError::Parse(err)) => {
            eprintln!("tacopt: {err}");
            ExitCode::from(1)
        }
        // A structural CFG invariant violation is fatal and unrecoverable
        // mid-pipeline (spec.md §7): abort rather than report a
        // driver-misuse exit code.
        Err(tacopt::RunError::Cfg(err)) => {
            eprintln!("tacopt: aborting: {err}");
            ExitCode::from(101)
        }
    }
}
