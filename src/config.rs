//! Configuration and CLI argument handling

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "keep-awake")]
#[command(about = "Keep the display and system awake for a number of hours")]
#[command(version)]
pub struct Config {
    /// Default countdown duration in hours
    #[arg(short = 'H', long, default_value = "1")]
    pub hours: i64,

    /// Start the countdown immediately
    #[arg(short, long)]
    pub start: bool,

    /// Exit once the countdown finishes or is stopped
    #[arg(long)]
    pub once: bool,

    /// Print the activity log as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["keep-awake"]).unwrap();
        assert_eq!(config.hours, 1);
        assert!(!config.start);
        assert!(!config.once);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from(["keep-awake", "-H", "3", "--start", "--once", "-v"]).unwrap();
        assert_eq!(config.hours, 3);
        assert!(config.start);
        assert!(config.once);
        assert_eq!(config.log_level(), "debug");
    }
}
