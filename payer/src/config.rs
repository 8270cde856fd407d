//! Command line arguments of the payer.

use clap::Parser;
use std::path::PathBuf;
use x402_chain_solana::chain::config::{ConfigError, PayerConfig};

/// CLI arguments for the x402 payer.
#[derive(Parser, Debug)]
#[command(name = "x402-payer")]
#[command(about = "Pay an x402 payment challenge on Solana")]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    pub config: PathBuf,
    /// Path to the challenge document, `-` for stdin
    #[arg(long)]
    pub challenge: PathBuf,
}

impl CliArgs {
    pub fn load_config(&self) -> Result<PayerConfig, ConfigError> {
        PayerConfig::load_from_path(&self.config)
    }

    pub fn reads_stdin(&self) -> bool {
        self.challenge.as_os_str() == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = CliArgs::try_parse_from([
            "x402-payer",
            "--config",
            "payer.json",
            "--challenge",
            "-",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("payer.json"));
        assert!(args.reads_stdin());
    }

    #[test]
    fn test_challenge_is_required() {
        assert!(CliArgs::try_parse_from(["x402-payer", "--config", "payer.json"]).is_err());
    }
}
