use crate::keybindings::KeyTable;
use crate::options::Options;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level configuration.
pub struct Config {
    pub options: Options,
    pub key_table: KeyTable,
}

impl Config {
    /// Create a default configuration.
    pub fn default_config() -> Self {
        Config {
            options: Options::default(),
            key_table: KeyTable::default_bindings(),
        }
    }

    /// Load configuration from the default config file (~/.clipq.conf).
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                debug!("No config file found at: {}", path.display());
                Ok(Self::default_config())
            }
            None => Ok(Self::default_config()),
        }
    }

    /// Load configuration from an explicit file on top of the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default_config();
        debug!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        config.apply_config_string(&content)?;
        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_path() -> Option<PathBuf> {
        std::env::var("USERPROFILE")
            .ok()
            .map(|home| PathBuf::from(home).join(".clipq.conf"))
    }

    /// Apply configuration from a string. Bad lines are logged and skipped.
    pub fn apply_config_string(&mut self, content: &str) -> Result<()> {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(e) = self.apply_config_line(line) {
                warn!("Config error: {} (line: {})", e, line);
            }
        }
        Ok(())
    }

    fn apply_config_line(&mut self, line: &str) -> Result<()> {
        let (command, args) = match line.split_once(' ') {
            Some((c, a)) => (c, a),
            None => anyhow::bail!("Missing arguments"),
        };

        match command {
            "set-option" | "set" => {
                crate::parser::parse_set_option(&mut self.options, args)?;
            }
            "bind-key" | "bind" => {
                crate::parser::parse_bind_key(&mut self.key_table, args)?;
            }
            "unbind-key" | "unbind" => {
                crate::parser::parse_unbind_key(&mut self.key_table, args)?;
            }
            "source-file" | "source" => {
                let path = args.trim();
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config: {}", path))?;
                self.apply_config_string(&content)?;
            }
            _ => anyhow::bail!("Unknown config command: {}", command),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybindings::KeyBinding;

    #[test]
    fn test_apply_config_string() {
        let mut config = Config::default_config();
        config
            .apply_config_string(
                "# clipq settings\n\
                 set -g queue-limit 10\n\
                 \n\
                 set-option console-view off\n\
                 bind-key C-b paste-next\n\
                 unbind C-v\n",
            )
            .unwrap();

        assert_eq!(config.options.queue_limit, 10);
        assert!(!config.options.console_view);
        assert_eq!(
            config
                .key_table
                .lookup(&KeyBinding::ctrl('b'))
                .map(String::as_str),
            Some("paste-next")
        );
        assert!(config.key_table.lookup(&KeyBinding::ctrl('v')).is_none());
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let mut config = Config::default_config();
        config
            .apply_config_string("frobnicate now\nset history-limit x\nset history-limit 7\n")
            .unwrap();
        assert_eq!(config.options.history_limit, 7);
    }

    #[test]
    fn test_source_file_and_load_from() {
        let dir = std::env::temp_dir().join(format!("clipq-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let inner = dir.join("inner.conf");
        let outer = dir.join("outer.conf");
        std::fs::write(&inner, "set display-width 30\n").unwrap();
        std::fs::write(&outer, format!("source-file {}\n", inner.display())).unwrap();

        let config = Config::load_from(&outer).unwrap();
        assert_eq!(config.options.display_width, 30);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let path = std::env::temp_dir().join("clipq-definitely-missing.conf");
        assert!(Config::load_from(&path).is_err());
    }
}
