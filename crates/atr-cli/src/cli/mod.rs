use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `atr` binary.
#[derive(Debug, Parser)]
#[command(name = "atr", version, about = "Atrium - console error toolbox")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only in logs)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub const fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["atr", "--format", "raw", "--verbose", "messages"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Messages));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["atr", "classify", "--status", "503", "--quiet"])
            .expect("cli should parse");

        assert!(cli.quiet);
        let Commands::Classify(args) = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(args.status, Some(503));
    }

    #[test]
    fn status_conflicts_with_network() {
        let parsed = Cli::try_parse_from(["atr", "classify", "--status", "500", "--network"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["atr", "--format", "table", "messages"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn check_overrides_parse() {
        let cli = Cli::try_parse_from([
            "atr",
            "check",
            "https://status.example.com/health",
            "--attempts",
            "5",
            "--delay-ms",
            "250",
        ])
        .expect("cli should parse");

        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.url, "https://status.example.com/health");
        assert_eq!(args.attempts, Some(5));
        assert_eq!(args.delay_ms, Some(250));
    }
}
