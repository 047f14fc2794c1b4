//! Command-line interface definitions for daily_hot.
//!
//! Everything except the config file location is optional; flags override
//! the matching keys of the loaded (or default) configuration.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Collect today's trending lists into one themed HTML page.
///
/// # Examples
///
/// ```sh
/// # Defaults: GitHub, Bilibili, Weibo and Zhihu into ./daily_news.html
/// daily_hot
///
/// # Read a YAML config, override the theme
/// daily_hot -c config.yaml -t dark
///
/// # Write somewhere else
/// daily_hot -o public/index.html
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, env = "DAILY_HOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output HTML file (overrides `output_file`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Theme name: default, dark, green or classic (overrides `theme`)
    #[arg(short, long)]
    pub theme: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
        config
    }
}
