use clipq_config::{KeyBinding, KeyTable, Modifiers};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

/// What a global shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Note a copy in the history; the clipboard notification does the queuing.
    RecordCopy,
    /// Note a cut in the history.
    RecordCut,
    /// Move the oldest queued entry onto the clipboard before the paste lands.
    PasteNext,
    /// Show the whole queue in a message box.
    ShowQueue,
    ToggleListener,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::RecordCopy => "record-copy",
            Action::RecordCut => "record-cut",
            Action::PasteNext => "paste-next",
            Action::ShowQueue => "show-queue",
            Action::ToggleListener => "toggle-listener",
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "record-copy" => Ok(Action::RecordCopy),
            "record-cut" => Ok(Action::RecordCut),
            "paste-next" => Ok(Action::PasteNext),
            "show-queue" => Ok(Action::ShowQueue),
            "toggle-listener" => Ok(Action::ToggleListener),
            other => Err(format!("Unknown action: {}", other)),
        }
    }
}

/// Resolved shortcut table: key combination to action.
#[derive(Debug, Default)]
pub struct ShortcutMap {
    actions: HashMap<KeyBinding, Action>,
}

impl ShortcutMap {
    /// Build from the configured key table, dropping bindings to unknown actions.
    pub fn from_table(table: &KeyTable) -> Self {
        let mut actions = HashMap::new();
        for (binding, name) in &table.bindings {
            match name.parse::<Action>() {
                Ok(action) => {
                    actions.insert(binding.clone(), action);
                }
                Err(e) => warn!("Ignoring binding {}: {}", binding, e),
            }
        }
        ShortcutMap { actions }
    }

    /// Look up the action for a key-down.
    ///
    /// An exact binding wins. Otherwise a held Ctrl falls back to the plain
    /// `C-` binding for the same key, so Ctrl+Shift+V still pastes.
    pub fn resolve(&self, binding: &KeyBinding) -> Option<Action> {
        if let Some(action) = self.actions.get(binding) {
            return Some(*action);
        }
        if !binding.modifiers.ctrl || binding.modifiers == Modifiers::CTRL {
            return None;
        }
        let ctrl_only = KeyBinding::new(binding.key.clone(), Modifiers::CTRL);
        self.actions.get(&ctrl_only).copied()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipq_config::Key;

    #[test]
    fn test_default_table_resolves() {
        let map = ShortcutMap::from_table(&KeyTable::default_bindings());
        assert_eq!(map.len(), 4);
        assert_eq!(map.resolve(&KeyBinding::ctrl('c')), Some(Action::RecordCopy));
        assert_eq!(map.resolve(&KeyBinding::ctrl('x')), Some(Action::RecordCut));
        assert_eq!(map.resolve(&KeyBinding::ctrl('v')), Some(Action::PasteNext));
        assert_eq!(map.resolve(&KeyBinding::ctrl('p')), Some(Action::ShowQueue));
    }

    #[test]
    fn test_extra_modifiers_with_ctrl_fall_back() {
        let map = ShortcutMap::from_table(&KeyTable::default_bindings());
        let ctrl_shift_v = KeyBinding::new(
            Key::Char('v'),
            Modifiers {
                ctrl: true,
                shift: true,
                ..Default::default()
            },
        );
        assert_eq!(map.resolve(&ctrl_shift_v), Some(Action::PasteNext));
        let ctrl_alt_p = KeyBinding::new(
            Key::Char('p'),
            Modifiers {
                ctrl: true,
                alt: true,
                ..Default::default()
            },
        );
        assert_eq!(map.resolve(&ctrl_alt_p), Some(Action::ShowQueue));
    }

    #[test]
    fn test_ctrl_must_be_held() {
        let map = ShortcutMap::from_table(&KeyTable::default_bindings());
        assert_eq!(
            map.resolve(&KeyBinding::new(Key::Char('v'), Modifiers::default())),
            None
        );
        let shift_v = KeyBinding::new(
            Key::Char('v'),
            Modifiers {
                shift: true,
                ..Default::default()
            },
        );
        assert_eq!(map.resolve(&shift_v), None);
    }

    #[test]
    fn test_exact_binding_beats_fallback() {
        let mut table = KeyTable::default_bindings();
        let ctrl_shift = Modifiers {
            ctrl: true,
            shift: true,
            ..Default::default()
        };
        table.bind(Key::Char('v'), ctrl_shift, "show-queue");
        let map = ShortcutMap::from_table(&table);
        assert_eq!(
            map.resolve(&KeyBinding::new(Key::Char('v'), ctrl_shift)),
            Some(Action::ShowQueue)
        );
        assert_eq!(map.resolve(&KeyBinding::ctrl('v')), Some(Action::PasteNext));
    }

    #[test]
    fn test_unknown_actions_are_dropped() {
        let mut table = KeyTable::new();
        table.bind(Key::F(9), Modifiers::default(), "toggle-listener");
        table.bind(Key::F(10), Modifiers::default(), "split-window -h");
        let map = ShortcutMap::from_table(&table);
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.resolve(&KeyBinding::new(Key::F(9), Modifiers::default())),
            Some(Action::ToggleListener)
        );
    }

    #[test]
    fn test_action_names_parse_back() {
        for action in [
            Action::RecordCopy,
            Action::RecordCut,
            Action::PasteNext,
            Action::ShowQueue,
            Action::ToggleListener,
        ] {
            assert_eq!(action.name().parse::<Action>(), Ok(action));
        }
    }
}
