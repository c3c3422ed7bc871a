use crate::keybindings::{self, KeyTable};
use crate::options::Options;
use anyhow::Result;
use tracing::debug;

/// Parse a `set-option` command line.
pub fn parse_set_option(options: &mut Options, args: &str) -> Result<()> {
    let args = args.trim();

    // -g is accepted and ignored; every option is global.
    let args = args.strip_prefix("-g ").unwrap_or(args).trim();

    let (name, value) = match args.split_once(' ') {
        Some((n, v)) => (n.trim(), v.trim()),
        None => anyhow::bail!("Missing value for option: {}", args),
    };

    options.set(name, value).map_err(|e| anyhow::anyhow!("{}", e))
}

/// Parse a `bind-key` command line.
pub fn parse_bind_key(table: &mut KeyTable, args: &str) -> Result<()> {
    let args = args.trim();

    let (key_str, action) = match args.split_once(' ') {
        Some((k, a)) => (k.trim(), a.trim()),
        None => anyhow::bail!("Missing action for key: {}", args),
    };

    let binding = keybindings::parse_key(key_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid key: {}", key_str))?;
    table.bind(binding.key, binding.modifiers, action);
    Ok(())
}

/// Parse an `unbind-key` command line.
pub fn parse_unbind_key(table: &mut KeyTable, args: &str) -> Result<()> {
    let key_str = args.trim();
    let binding = keybindings::parse_key(key_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid key: {}", key_str))?;
    if !table.unbind(&binding) {
        debug!("unbind-key {}: not bound", key_str);
    }
    Ok(())
}
