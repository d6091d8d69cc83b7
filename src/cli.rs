//! CLI argument parsing for handoff.

use clap::Parser;

use crate::disruptor::Strategy;

/// Single-slot producer/consumer value handoff with chaos injection.
///
/// Reads one line of whitespace-separated integers from stdin, hands them
/// one at a time to a pool of consumer threads, and prints the sum of every
/// surviving consumer's partial sum.
#[derive(Parser, Debug)]
#[command(name = "handoff", version, about = "Single-slot value handoff with chaos injection")]
pub struct Cli {
    /// Number of consumer threads
    #[arg(value_name = "WORKERS", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub workers: usize,

    /// Maximum random pause after each claim, in milliseconds (0 = no pause)
    #[arg(value_name = "MAX_PAUSE_MS")]
    pub max_pause_ms: u64,

    /// Print a "(worker-id, running-sum)" line after each successful claim
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Disruption strategy applied to consumer threads
    #[arg(long, value_enum, default_value = "redirect")]
    pub disrupt: Strategy,
}

/// Rewrite the historical single-dash `-debug` spelling (accepted before or
/// after the positionals) into the `--debug` form clap understands.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            if arg == "-debug" {
                "--debug".to_string()
            } else {
                arg
            }
        })
        .collect()
}

/// The debug flag is only valid before or after the positionals, never
/// between them. clap's interspersed parsing would accept the middle
/// position too, so the caller must reject it explicitly.
///
/// `args` are the user arguments (program name stripped), already through
/// [`normalize_args`]. The token after `--disrupt` is its value, not a
/// positional.
pub fn debug_flag_misplaced(args: &[String]) -> bool {
    let mut positionals = 0usize;
    let mut skip_value = false;
    for arg in args {
        if skip_value {
            skip_value = false;
            continue;
        }
        match arg.as_str() {
            "--debug" | "-debug" | "-d" => {
                if positionals == 1 {
                    return true;
                }
            }
            "--disrupt" => skip_value = true,
            _ if !arg.starts_with('-') => positionals += 1,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mirrors the binary: normalize, reject a misplaced debug flag, parse.
    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let argv = std::iter::once("handoff".to_string())
            .chain(args.iter().map(|s| s.to_string()));
        let argv = normalize_args(argv);
        if debug_flag_misplaced(&argv[1..]) {
            return Err(clap::Error::new(clap::error::ErrorKind::UnknownArgument));
        }
        Cli::try_parse_from(argv)
    }

    #[test]
    fn test_positionals_parse() {
        let cli = parse(&["3", "10"]).unwrap();
        assert_eq!(cli.workers, 3);
        assert_eq!(cli.max_pause_ms, 10);
        assert!(!cli.debug);
        assert_eq!(cli.disrupt, Strategy::Redirect);
    }

    #[test]
    fn test_debug_flag_before_or_after_positionals() {
        assert!(parse(&["-debug", "3", "10"]).unwrap().debug);
        assert!(parse(&["3", "10", "-debug"]).unwrap().debug);
        assert!(parse(&["3", "10", "--debug"]).unwrap().debug);
    }

    #[test]
    fn test_debug_flag_between_positionals_rejected() {
        assert!(parse(&["3", "-debug", "10"]).is_err());
        assert!(parse(&["3", "--debug", "10"]).is_err());
        assert!(parse(&["3", "-d", "10"]).is_err());
    }

    #[test]
    fn test_disrupt_value_is_not_a_positional() {
        // `off` here is the --disrupt value, so --debug still follows both
        // positionals.
        let cli = parse(&["3", "10", "--disrupt", "off", "--debug"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.disrupt, Strategy::Off);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(parse(&["0", "10"]).is_err());
    }

    #[test]
    fn test_negative_arguments_rejected() {
        assert!(parse(&["-1", "10"]).is_err());
        assert!(parse(&["3", "-10"]).is_err());
    }

    #[test]
    fn test_wrong_arity_rejected() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["3"]).is_err());
        assert!(parse(&["3", "10", "7"]).is_err());
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(parse(&["3", "0", "--disrupt", "cancel"]).unwrap().disrupt, Strategy::Cancel);
        assert_eq!(parse(&["3", "0", "--disrupt", "off"]).unwrap().disrupt, Strategy::Off);
    }
}
