use crate::config::{BoardConfig, LogFormat};
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "giri-board")]
#[command(about = "Kettlebell competition scoreboard driven by a LoRa judge remote")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Serial device of the RAK811 modem")]
    pub port: Option<String>,

    #[arg(long)]
    pub baud_rate: Option<u32>,

    #[arg(long)]
    pub backend_url: Option<String>,

    #[arg(long)]
    pub platform: Option<u32>,

    #[arg(long)]
    pub competition: Option<u32>,

    #[arg(long, help = "Skip the modem configuration handshake")]
    pub no_modem_init: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Load the configuration file (or defaults) and apply command-line overrides.
    pub fn resolve(&self) -> Result<BoardConfig> {
        let mut config = match &self.config {
            Some(path) => BoardConfig::from_file(path)?,
            None => BoardConfig::default(),
        };

        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud_rate) = self.baud_rate {
            config.serial.baud_rate = baud_rate;
        }
        if let Some(url) = &self.backend_url {
            config.backend.base_url = url.clone();
        }
        if let Some(platform) = self.platform {
            config.backend.platform = platform;
        }
        if let Some(competition) = self.competition {
            config.backend.competition = competition;
        }
        if self.no_modem_init {
            config.modem.enabled = false;
        }
        if self.json_logs {
            config.logging.format = LogFormat::Json;
        }
        config.logging.verbose |= self.verbose;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_flags() {
        let cli = CliConfig::parse_from(["giri-board"]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert!(config.modem.enabled);
        assert!(!config.logging.verbose);
    }

    #[test]
    fn test_flags_override_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[serial]\nport = \"/dev/ttyS1\"\n[backend]\nplatform = 2\n")
            .unwrap();

        let cli = CliConfig::parse_from([
            "giri-board",
            "--config",
            temp_file.path().to_str().unwrap(),
            "--competition",
            "4",
            "--no-modem-init",
            "--json-logs",
            "-v",
        ]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.serial.port, "/dev/ttyS1");
        assert_eq!(config.backend.platform, 2);
        assert_eq!(config.backend.competition, 4);
        assert!(!config.modem.enabled);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.logging.verbose);
    }
}
