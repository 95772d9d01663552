//! CLI argument definitions for sift-runner.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sift/sift.toml";

/// sift batch log ingestion runner.
///
/// Reads one invocation payload (a batch trigger or a direct-evaluation
/// request), processes it, and exits.
#[derive(Parser, Debug)]
#[command(name = "sift-runner")]
#[command(version, about, long_about = None)]
pub struct RunnerCli {
    /// Path to sift.toml configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Invocation payload file, or `-` to read from stdin.
    #[arg(short, long, default_value = "-")]
    pub event: String,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without processing an event.
    #[arg(long)]
    pub validate: bool,
}

impl RunnerCli {
    /// Returns true when the payload should be read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.event == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = RunnerCli::try_parse_from(["sift-runner"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(cli.reads_stdin());
        assert!(cli.log_level.is_none());
        assert!(!cli.validate);
    }

    #[test]
    fn overrides() {
        let cli = RunnerCli::try_parse_from([
            "sift-runner",
            "--config",
            "/tmp/sift.toml",
            "--event",
            "/tmp/trigger.json",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
            "--validate",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/sift.toml"));
        assert_eq!(cli.event, "/tmp/trigger.json");
        assert!(!cli.reads_stdin());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format.as_deref(), Some("pretty"));
        assert!(cli.validate);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(RunnerCli::try_parse_from(["sift-runner", "--pid-file", "x"]).is_err());
    }
}
