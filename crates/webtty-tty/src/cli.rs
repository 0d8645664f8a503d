//! CLI argument parsing for webtty

use std::path::PathBuf;

use clap::Parser;

use webtty_app::config::{load_config, load_config_from, Config, ConfigError};

/// webtty - drive a real web browser from your terminal
#[derive(Parser, Debug)]
#[command(name = "webtty")]
#[command(about = "Drive a real web browser from your terminal")]
#[command(version)]
pub struct Cli {
    /// Port the browser extension connects to
    #[arg(long = "port")]
    pub port: Option<u16>,

    /// Address the websocket server listens on
    #[arg(long = "bind")]
    pub bind: Option<String>,

    /// Page opened in the first tab
    #[arg(long = "startup-url")]
    pub startup_url: Option<String>,

    /// Quit after this many seconds
    #[arg(long = "time-limit", value_name = "SECONDS")]
    pub time_limit: Option<u64>,

    /// Config file to use instead of the default one
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to ./debug.log
    #[arg(long = "debug")]
    pub debug: bool,

    /// Start in monochrome mode
    #[arg(long = "monochrome")]
    pub monochrome: bool,

    /// Print the text of a page and exit, without a terminal UI
    #[arg(long = "raw-text", value_name = "URL")]
    pub raw_text: Option<String>,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load the config file and apply the command-line overrides
    pub fn config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };
        self.apply(&mut config);
        Ok(config)
    }

    /// Override config values given on the command line
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.browser.websocket_port = port;
        }
        if let Some(bind) = &self.bind {
            config.browser.bind = bind.clone();
        }
        if let Some(url) = &self.startup_url {
            config.browser.startup_url = url.clone();
        }
        if self.time_limit.is_some() {
            config.browser.time_limit = self.time_limit;
        }
        if self.monochrome {
            config.tty.monochrome = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cli = Cli::parse_from(["webtty"]);
        assert_eq!(cli.port, None);
        assert!(!cli.debug);
        assert!(cli.raw_text.is_none());

        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "webtty",
            "--port",
            "4000",
            "--startup-url",
            "https://example.com",
            "--time-limit",
            "30",
            "--monochrome",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.browser.websocket_port, 4000);
        assert_eq!(config.browser.startup_url, "https://example.com");
        assert_eq!(config.browser.time_limit, Some(30));
        assert!(config.tty.monochrome);
        assert_eq!(config.browser.bind, "127.0.0.1");
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[browser]\nwebsocket_port = 5000\nbind = \"0.0.0.0\"\n").unwrap();

        let path_arg = path.to_string_lossy().to_string();
        let cli = Cli::parse_from(["webtty", "--config", &path_arg, "--port", "6000"]);
        let config = cli.config().unwrap();
        assert_eq!(config.browser.websocket_port, 6000);
        assert_eq!(config.browser.bind, "0.0.0.0");
    }

    #[test]
    fn test_raw_text() {
        let cli = Cli::parse_from(["webtty", "--raw-text", "https://example.com", "--debug"]);
        assert_eq!(cli.raw_text.as_deref(), Some("https://example.com"));
        assert!(cli.debug);
    }
}
