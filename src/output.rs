//! # Output Configuration
//!
//! Controls how command output looks: whether status lines get emoji and
//! color, based on the `--color` flag and the usual environment variables.
//!
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colors when set (https://no-color.org/)
//! - `CLICOLOR=0` disables colors, `CLICOLOR_FORCE=1` forces them
//! - `TERM=dumb` disables colors
//!
//! ```rust,ignore
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} Installing packages", emoji(&config, "📦", "==>"));
//! ```

use std::env;

use console::style;

#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// `color_flag` is the value of `--color`: "always", "never" or "auto".
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colors, even when empty
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Render a package name, bold when colors are on.
    pub fn package(&self, name: &str) -> String {
        if self.use_color {
            style(name).bold().to_string()
        } else {
            name.to_string()
        }
    }

    /// Render a version, dimmed when colors are on. Empty means the default branch.
    pub fn version(&self, version: &str) -> String {
        let version = if version.is_empty() {
            "(default branch)"
        } else {
            version
        };
        if self.use_color {
            style(version).dim().to_string()
        } else {
            version.to_string()
        }
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// `emoji_str` when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}
