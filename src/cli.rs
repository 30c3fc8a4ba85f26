//! Argument parsing and driver entry point (`spec.md` §6, `SPEC_FULL.md` §B).
//!
//! `clap` parses the shape of the command line; the documented
//! duplicate-flag semantics ("duplicate `-opt` / `-backend` is driver
//! misuse") don't fall out of `clap`'s own value-delimited-list handling,
//! since repeated `-opt=a -opt=b` flags collapse into one list rather than
//! erroring. `parse_args` pre-scans the raw argument vector for repeated
//! flag names before handing off to `clap::Parser::parse_from`.

use crate::error::DriverError;
use crate::opt::pipeline::PassTag;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "tacopt", about = "An optimizing middle-end for a 3AC IR")]
struct RawArgs {
    #[arg(long = "opt", value_delimiter = ',')]
    opt: Vec<String>,

    #[arg(long = "backend")]
    backend: Option<String>,
}

/// Parsed and validated driver configuration.
pub struct Args {
    pub passes: Vec<PassTag>,
    pub backend: crate::backend::BackendKind,
}

/// Parses `argv` (excluding the program name) into validated [`Args`].
///
/// `-opt=`/`-backend=` (single dash, `spec.md` §6's literal syntax) are
/// normalized to `--opt=`/`--backend=` before reaching `clap`, which only
/// recognizes the double-dash spelling for a multi-character `long` name.
pub fn parse_args(argv: &[String]) -> Result<Args, DriverError> {
    check_duplicate_flag(argv, "-opt", "--opt")?;
    check_duplicate_flag(argv, "-backend", "--backend")?;

    let mut full = vec!["tacopt".to_string()];
    full.extend(argv.iter().map(|a| normalize(a)));
    let raw = RawArgs::try_parse_from(&full).map_err(|_| DriverError::UnknownArgument(argv.join(" ")))?;

    let mut passes = Vec::with_capacity(raw.opt.len());
    for name in &raw.opt {
        passes.push(match name.as_str() {
            "scp" => PassTag::Scp,
            "dse" => PassTag::Dse,
            "licm" => PassTag::Licm,
            "ssa" => PassTag::Ssa,
            other => return Err(DriverError::UnknownOpt(other.to_string())),
        });
    }

    let backend_name = raw.backend.ok_or(DriverError::NoBackend)?;
    let backend = crate::backend::BackendKind::from_name(&backend_name)
        .ok_or_else(|| DriverError::UnknownBackend(backend_name.clone()))?;

    Ok(Args { passes, backend })
}

fn normalize(arg: &str) -> String {
    if let Some(rest) = arg.strip_prefix("-opt") {
        return format!("--opt{rest}");
    }
    if let Some(rest) = arg.strip_prefix("-backend") {
        return format!("--backend{rest}");
    }
    arg.to_string()
}

/// A flag is a duplicate if it (in either `-name`/`--name` spelling, with or
/// without a `=value` suffix) appears more than once in `argv`.
fn check_duplicate_flag(argv: &[String], short: &str, long: &str) -> Result<(), DriverError> {
    let is_match = |arg: &str| {
        let head = arg.split('=').next().unwrap_or(arg);
        head == short || head == long
    };
    let count = argv.iter().filter(|a| is_match(a)).count();
    if count > 1 {
        return Err(if short == "-opt" { DriverError::DuplicateOpt } else { DriverError::DuplicateBackend });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_argument_list() {
        let argv: Vec<String> =
            ["-opt=scp,dse", "-backend=3addr"].iter().map(|s| s.to_string()).collect();
        let args = parse_args(&argv).unwrap();
        assert_eq!(args.passes, vec![PassTag::Scp, PassTag::Dse]);
        assert_eq!(args.backend, crate::backend::BackendKind::ThreeAddr);
    }

    #[test]
    fn duplicate_opt_flag_is_rejected() {
        let argv: Vec<String> =
            ["-opt=scp", "-opt=dse", "-backend=3addr"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(parse_args(&argv), Err(DriverError::DuplicateOpt)));
    }

    #[test]
    fn duplicate_backend_flag_is_rejected() {
        let argv: Vec<String> =
            ["-backend=3addr", "-backend=c"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(parse_args(&argv), Err(DriverError::DuplicateBackend)));
    }

    #[test]
    fn unknown_opt_name_is_rejected() {
        let argv: Vec<String> = ["-opt=bogus", "-backend=3addr"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(parse_args(&argv), Err(DriverError::UnknownOpt(_))));
    }

    #[test]
    fn missing_backend_is_rejected() {
        let argv: Vec<String> = ["-opt=scp"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(parse_args(&argv), Err(DriverError::NoBackend)));
    }

    #[test]
    fn unknown_backend_name_is_rejected() {
        let argv: Vec<String> = ["-backend=bogus".to_string()];
        assert!(matches!(parse_args(&argv), Err(DriverError::UnknownBackend(_))));
    }
}
