/// Daemon options, settable with `set-option` in the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Maximum queued entries; 0 keeps the queue unbounded.
    pub queue_limit: usize,
    /// Number of operation tags kept in the history.
    pub history_limit: usize,
    /// Character budget of one queue entry in listings.
    pub display_width: usize,
    /// Register the clipboard listener and keyboard hook at startup.
    pub listen_on_start: bool,
    /// Redraw the queue in the daemon's console.
    pub console_view: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            queue_limit: 0,
            history_limit: 20,
            display_width: 100,
            listen_on_start: true,
            console_view: true,
        }
    }
}

impl Options {
    /// Set an option by name.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), String> {
        match name {
            "queue-limit" => self.queue_limit = parse_number(value)?,
            "history-limit" => self.history_limit = parse_number(value)?,
            "display-width" => self.display_width = parse_number(value)?,
            "listen-on-start" => self.listen_on_start = parse_bool(value)?,
            "console-view" => self.console_view = parse_bool(value)?,
            _ => return Err(format!("Unknown option: {}", name)),
        }
        Ok(())
    }
}

fn parse_number(s: &str) -> Result<usize, String> {
    unquote(s).parse().map_err(|e| format!("{}", e))
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match unquote(s).to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("Invalid boolean value: {}", s)),
    }
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = Options::default();
        assert_eq!(opts.queue_limit, 0);
        assert_eq!(opts.history_limit, 20);
        assert_eq!(opts.display_width, 100);
        assert!(opts.listen_on_start);
    }

    #[test]
    fn test_set_by_name() {
        let mut opts = Options::default();
        opts.set("queue-limit", "50").unwrap();
        opts.set("listen-on-start", "off").unwrap();
        opts.set("display-width", "\"40\"").unwrap();
        assert_eq!(opts.queue_limit, 50);
        assert!(!opts.listen_on_start);
        assert_eq!(opts.display_width, 40);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut opts = Options::default();
        assert!(opts.set("history-limit", "many").is_err());
        assert!(opts.set("console-view", "maybe").is_err());
        assert!(opts.set("status-left", "x").is_err());
        assert_eq!(opts, Options::default());
    }
}
