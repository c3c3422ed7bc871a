use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A key combination that can trigger a binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: Key,
    pub modifiers: Modifiers,
}

/// Key identifier.
///
/// Letters are always stored lowercase; shift is carried in [`Modifiers`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    F(u8),
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Space,
}

/// Key modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: false,
    };
}

impl KeyBinding {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        KeyBinding { key, modifiers }
    }

    pub fn ctrl(ch: char) -> Self {
        KeyBinding::new(Key::Char(ch.to_ascii_lowercase()), Modifiers::CTRL)
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            write!(f, "C-")?;
        }
        if self.modifiers.alt {
            write!(f, "M-")?;
        }
        if self.modifiers.shift {
            write!(f, "S-")?;
        }
        match &self.key {
            Key::Char(c) => write!(f, "{}", c),
            Key::F(n) => write!(f, "F{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A table of global shortcuts mapping key combinations to action names.
pub struct KeyTable {
    pub bindings: HashMap<KeyBinding, String>,
}

impl KeyTable {
    pub fn new() -> Self {
        KeyTable {
            bindings: HashMap::new(),
        }
    }

    /// The stock shortcuts: observe copy and cut, take over paste, dump on Ctrl+P.
    pub fn default_bindings() -> Self {
        let mut table = KeyTable::new();
        table.bind(Key::Char('c'), Modifiers::CTRL, "record-copy");
        table.bind(Key::Char('x'), Modifiers::CTRL, "record-cut");
        table.bind(Key::Char('v'), Modifiers::CTRL, "paste-next");
        table.bind(Key::Char('p'), Modifiers::CTRL, "show-queue");
        table
    }

    /// Add a binding.
    pub fn bind(&mut self, key: Key, modifiers: Modifiers, action: &str) {
        self.bindings
            .insert(KeyBinding::new(key, modifiers), action.to_string());
    }

    /// Remove a binding. Returns whether it was bound.
    pub fn unbind(&mut self, binding: &KeyBinding) -> bool {
        self.bindings.remove(binding).is_some()
    }

    /// Look up the action for a key binding.
    pub fn lookup(&self, binding: &KeyBinding) -> Option<&String> {
        self.bindings.get(binding)
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::default_bindings()
    }
}

/// Parse a key string like "C-v", "M-a", "C-S-Up", "F1" into a KeyBinding.
pub fn parse_key(s: &str) -> Option<KeyBinding> {
    let mut modifiers = Modifiers::default();
    let mut remaining = s.trim();

    loop {
        if remaining.len() > 2 && (remaining.starts_with("C-") || remaining.starts_with("c-")) {
            modifiers.ctrl = true;
            remaining = &remaining[2..];
        } else if remaining.len() > 2
            && (remaining.starts_with("M-") || remaining.starts_with("m-"))
        {
            modifiers.alt = true;
            remaining = &remaining[2..];
        } else if remaining.len() > 2
            && (remaining.starts_with("S-") || remaining.starts_with("s-"))
        {
            modifiers.shift = true;
            remaining = &remaining[2..];
        } else {
            break;
        }
    }

    let key = match remaining {
        "Enter" | "enter" => Key::Enter,
        "Escape" | "escape" | "Esc" | "esc" => Key::Escape,
        "Space" | "space" => Key::Space,
        "Backspace" | "BSpace" | "bspace" => Key::Backspace,
        "Tab" | "tab" => Key::Tab,
        "Up" | "up" => Key::Up,
        "Down" | "down" => Key::Down,
        "Left" | "left" => Key::Left,
        "Right" | "right" => Key::Right,
        "Home" | "home" => Key::Home,
        "End" | "end" => Key::End,
        "PageUp" | "PgUp" | "pgup" => Key::PageUp,
        "PageDown" | "PgDn" | "pgdn" => Key::PageDown,
        "Insert" | "insert" => Key::Insert,
        "Delete" | "delete" | "DC" | "dc" => Key::Delete,
        s if s.len() > 1 && (s.starts_with('F') || s.starts_with('f')) => {
            let n = s[1..].parse::<u8>().ok()?;
            if !(1..=24).contains(&n) {
                return None;
            }
            Key::F(n)
        }
        s if s.chars().count() == 1 => Key::Char(s.chars().next()?.to_ascii_lowercase()),
        _ => return None,
    };

    Some(KeyBinding { key, modifiers })
}
