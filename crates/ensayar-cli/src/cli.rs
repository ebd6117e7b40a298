//! Command-line surface.

use clap::Parser;
use ensayar::SuiteConfig;

/// Run the built-in end-to-end suite against a deployed application
#[derive(Debug, Parser)]
#[command(name = "ensayador", version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the application under test
    #[arg(long, env = "ENSAYAR_BASE_URL", default_value = "http://localhost:3002")]
    pub base_url: String,

    /// Run the browser with a visible window
    #[arg(long)]
    pub headed: bool,

    /// Disable the chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Path to the chromium binary (auto-detected when omitted)
    #[arg(long)]
    pub chromium_path: Option<String>,

    /// Only run cases whose name contains this substring
    #[arg(long)]
    pub filter: Option<String>,

    /// Timeout for DOM actions, in milliseconds
    #[arg(long, default_value_t = ensayar::DEFAULT_ACTION_TIMEOUT_MS)]
    pub action_timeout_ms: u64,

    /// Window for network response correlation, in milliseconds
    #[arg(long, default_value_t = ensayar::DEFAULT_RESPONSE_TIMEOUT_MS)]
    pub response_timeout_ms: u64,

    /// Extra output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Minimal output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Build the suite configuration from the arguments
    #[must_use]
    pub fn suite_config(&self) -> SuiteConfig {
        let mut config = SuiteConfig::new(self.base_url.clone())
            .with_headless(!self.headed)
            .with_action_timeout(self.action_timeout_ms)
            .with_response_timeout(self.response_timeout_ms);
        if self.no_sandbox {
            config = config.with_no_sandbox();
        }
        if let Some(path) = &self.chromium_path {
            config = config.with_chromium_path(path.clone());
        }
        config
    }

    /// Tracing filter directive for the chosen verbosity
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "ensayar=error,ensayador=error";
        }
        match self.verbose {
            0 => "ensayar=warn,ensayador=info",
            1 => "ensayar=info,ensayador=debug",
            _ => "ensayar=trace,ensayador=trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["ensayador"]);
        assert_eq!(cli.base_url, "http://localhost:3002");
        assert!(!cli.headed);
        let config = cli.suite_config();
        assert!(config.headless);
        assert!(config.sandbox);
    }

    #[test]
    fn test_flags_map_to_config() {
        let cli = Cli::parse_from([
            "ensayador",
            "--base-url",
            "http://localhost:8080",
            "--headed",
            "--no-sandbox",
            "--action-timeout-ms",
            "2500",
        ]);
        let config = cli.suite_config();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.action_timeout_ms, 2500);
    }

    #[test]
    fn test_verbosity_directives() {
        assert_eq!(
            Cli::parse_from(["ensayador", "-q"]).log_directive(),
            "ensayar=error,ensayador=error"
        );
        assert_eq!(
            Cli::parse_from(["ensayador", "-vv"]).log_directive(),
            "ensayar=trace,ensayador=trace"
        );
    }
}
