use crate::history::{Op, OpHistory};
use crate::listener::Listener;
use crate::platform::{ClipboardAccess, Subscriptions};
use crate::queue::ClipQueue;
use crate::shortcuts::{Action, ShortcutMap};
use crate::view;
use clipq_common::error::Result;
use clipq_common::StatusInfo;
use clipq_config::{Config, KeyBinding};
use tracing::{debug, info, warn};

/// What the caller has to do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    /// Queue, history or listener state changed; redraw.
    Changed,
    /// Show this text to the user.
    ShowQueue(String),
}

/// Presentation work a shortcut left for the message loop.
///
/// Shortcuts run inside the low-level keyboard hook, which must return
/// quickly; redraws and dialogs wait here until the next wake.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Deferred {
    pub redraw: bool,
    pub dialogs: Vec<String>,
}

impl Deferred {
    pub fn is_empty(&self) -> bool {
        !self.redraw && self.dialogs.is_empty()
    }
}

/// The clipboard queue wired to its clipboard and OS subscriptions.
pub struct QueueApp<C, S> {
    queue: ClipQueue,
    history: OpHistory,
    listener: Listener<S>,
    clipboard: C,
    shortcuts: ShortcutMap,
    display_width: usize,
    /// Text we put on the clipboard ourselves; its change notification is not queued.
    echo: Option<String>,
    deferred: Deferred,
}

impl<C: ClipboardAccess, S: Subscriptions> QueueApp<C, S> {
    pub fn new(config: &Config, clipboard: C, subscriptions: S) -> Self {
        let options = &config.options;
        QueueApp {
            queue: ClipQueue::new(options.queue_limit),
            history: OpHistory::new(options.history_limit),
            listener: Listener::new(subscriptions),
            clipboard,
            shortcuts: ShortcutMap::from_table(&config.key_table),
            display_width: options.display_width,
            echo: None,
            deferred: Deferred::default(),
        }
    }

    /// Handle a clipboard-content-changed notification.
    pub fn on_clipboard_changed(&mut self) -> Outcome {
        let echo = self.echo.take();
        if !self.listener.is_active() {
            debug!("Clipboard changed while detached; ignored");
            return Outcome::Unchanged;
        }

        // NULs never survive a clipboard round trip, so the queue holds none.
        let text = match self.clipboard.read_text() {
            Ok(Some(text)) => text.replace('\0', ""),
            Ok(None) => String::new(),
            Err(e) => {
                warn!("Failed to read clipboard: {}", e);
                return Outcome::Unchanged;
            }
        };
        if text.is_empty() {
            debug!("Clipboard holds no text; ignored");
            return Outcome::Unchanged;
        }

        if echo.as_deref() == Some(text.as_str()) {
            debug!("Skipping our own clipboard write");
            return Outcome::Unchanged;
        }

        debug!("Queued {} chars", text.chars().count());
        if let Some(dropped) = self.queue.push(text) {
            debug!("Queue full; dropped oldest ({} chars)", dropped.chars().count());
        }
        Outcome::Changed
    }

    /// Handle a key-down from the global hook. Unbound keys do nothing.
    ///
    /// Only state changes here. Returns true when presentation work was
    /// deferred and the caller should wake the message loop for it.
    pub fn on_key(&mut self, binding: &KeyBinding) -> bool {
        let Some(action) = self.shortcuts.resolve(binding) else {
            return false;
        };
        debug!("Shortcut {} -> {}", binding, action.name());
        match self.perform(action) {
            Ok(Outcome::Unchanged) => return false,
            Ok(Outcome::Changed) => self.deferred.redraw = true,
            Ok(Outcome::ShowQueue(text)) => self.deferred.dialogs.push(text),
            Err(e) => {
                warn!("{} failed: {}", action.name(), e);
                self.deferred.redraw = true;
            }
        }
        true
    }

    /// Take the presentation work queued by shortcuts since the last call.
    pub fn take_deferred(&mut self) -> Deferred {
        std::mem::take(&mut self.deferred)
    }

    pub fn perform(&mut self, action: Action) -> Result<Outcome> {
        match action {
            Action::RecordCopy => {
                self.history.record(Op::Copy);
                Ok(Outcome::Changed)
            }
            Action::RecordCut => {
                self.history.record(Op::Cut);
                Ok(Outcome::Changed)
            }
            Action::PasteNext => {
                self.history.record(Op::Paste);
                self.paste_next()?;
                Ok(Outcome::Changed)
            }
            Action::ShowQueue => Ok(Outcome::ShowQueue(self.dump())),
            Action::ToggleListener => {
                self.toggle()?;
                Ok(Outcome::Changed)
            }
        }
    }

    /// Move the oldest entry onto the clipboard. No-op on an empty queue.
    ///
    /// On a failed write the entry goes back to the head of the queue.
    pub fn paste_next(&mut self) -> Result<Option<String>> {
        let Some(text) = self.queue.pop() else {
            debug!("Paste with empty queue");
            return Ok(None);
        };
        if let Err(e) = self.clipboard.write_text(&text) {
            self.queue.requeue_front(text);
            return Err(e);
        }
        // Detached means no notification will come to consume the echo.
        if self.listener.is_active() {
            self.echo = Some(text.clone());
        }
        info!("Pasted entry ({} left)", self.queue.len());
        Ok(Some(text))
    }

    pub fn attach(&mut self) -> Result<bool> {
        self.echo = None;
        self.listener.attach()
    }

    pub fn detach(&mut self) -> Result<bool> {
        self.echo = None;
        self.listener.detach()
    }

    pub fn toggle(&mut self) -> Result<bool> {
        self.echo = None;
        self.listener.toggle()
    }

    /// Release the OS subscriptions before exit.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.listener.detach() {
            warn!("Failed to detach listener: {}", e);
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_active()
    }

    pub fn queue(&self) -> &ClipQueue {
        &self.queue
    }

    pub fn history(&self) -> &OpHistory {
        &self.history
    }

    pub fn status_line(&self) -> String {
        view::status_line(self.queue.len(), self.is_listening(), &self.history)
    }

    pub fn status(&self) -> StatusInfo {
        StatusInfo {
            queued: self.queue.len(),
            listening: self.is_listening(),
            history: self.history.tags(),
            line: self.status_line(),
        }
    }

    /// Listing lines, most recent first.
    pub fn entries(&self) -> Vec<String> {
        view::queue_lines(&self.queue, self.display_width)
    }

    pub fn dump(&self) -> String {
        view::dump(&self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::tests::FakeSubs;
    use clipq_common::ClipqError;
    use clipq_config::{Key, Modifiers};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct ClipState {
        text: Option<String>,
        writes: Vec<String>,
        fail_read: bool,
        fail_write: bool,
    }

    #[derive(Clone, Default)]
    struct FakeClipboard(Rc<RefCell<ClipState>>);

    impl FakeClipboard {
        fn copy(&self, text: &str) {
            self.0.borrow_mut().text = Some(text.to_string());
        }
    }

    impl ClipboardAccess for FakeClipboard {
        fn read_text(&mut self) -> Result<Option<String>> {
            let state = self.0.borrow();
            if state.fail_read {
                return Err(ClipqError::Clipboard("locked".into()));
            }
            Ok(state.text.clone())
        }

        fn write_text(&mut self, text: &str) -> Result<()> {
            let mut state = self.0.borrow_mut();
            if state.fail_write {
                return Err(ClipqError::Clipboard("locked".into()));
            }
            state.text = Some(text.to_string());
            state.writes.push(text.to_string());
            Ok(())
        }
    }

    fn attached_app() -> (QueueApp<FakeClipboard, FakeSubs>, FakeClipboard, FakeSubs) {
        let clipboard = FakeClipboard::default();
        let subs = FakeSubs::default();
        let mut app = QueueApp::new(&Config::default_config(), clipboard.clone(), subs.clone());
        app.attach().unwrap();
        (app, clipboard, subs)
    }

    #[test]
    fn test_each_text_copy_queues_one() {
        let (mut app, clipboard, _) = attached_app();
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            clipboard.copy(text);
            assert_eq!(app.on_clipboard_changed(), Outcome::Changed);
            assert_eq!(app.queue().len(), i + 1);
        }
    }

    #[test]
    fn test_non_text_and_errors_ignored() {
        let (mut app, clipboard, _) = attached_app();
        assert_eq!(app.on_clipboard_changed(), Outcome::Unchanged);
        clipboard.copy("");
        assert_eq!(app.on_clipboard_changed(), Outcome::Unchanged);
        clipboard.copy("x");
        clipboard.0.borrow_mut().fail_read = true;
        assert_eq!(app.on_clipboard_changed(), Outcome::Unchanged);
        assert!(app.queue().is_empty());
    }

    #[test]
    fn test_detached_ignores_changes() {
        let (mut app, clipboard, subs) = attached_app();
        app.detach().unwrap();
        assert!(!subs.0.borrow().registered);
        clipboard.copy("late");
        assert_eq!(app.on_clipboard_changed(), Outcome::Unchanged);
        assert!(app.queue().is_empty());
    }

    #[test]
    fn test_paste_shortcut_dequeues_oldest() {
        let (mut app, clipboard, _) = attached_app();
        clipboard.copy("first");
        app.on_clipboard_changed();
        clipboard.copy("second");
        app.on_clipboard_changed();

        assert!(app.on_key(&KeyBinding::ctrl('v')));
        assert_eq!(clipboard.0.borrow().text.as_deref(), Some("first"));
        assert_eq!(app.queue().len(), 1);
        assert_eq!(app.history().tags(), "V");
        assert_eq!(
            app.take_deferred(),
            Deferred {
                redraw: true,
                dialogs: vec![],
            }
        );
    }

    #[test]
    fn test_ctrl_shift_v_still_dequeues() {
        let (mut app, clipboard, _) = attached_app();
        clipboard.copy("first");
        app.on_clipboard_changed();
        let ctrl_shift_v = KeyBinding::new(
            Key::Char('v'),
            Modifiers {
                ctrl: true,
                shift: true,
                ..Default::default()
            },
        );
        assert!(app.on_key(&ctrl_shift_v));
        assert!(app.queue().is_empty());
        assert_eq!(clipboard.0.borrow().text.as_deref(), Some("first"));
    }

    #[test]
    fn test_paste_echo_is_not_requeued() {
        let (mut app, clipboard, _) = attached_app();
        clipboard.copy("first");
        app.on_clipboard_changed();
        app.paste_next().unwrap();
        assert!(app.queue().is_empty());

        // Notification for our own write.
        assert_eq!(app.on_clipboard_changed(), Outcome::Unchanged);
        assert!(app.queue().is_empty());

        // The same text copied again later is a real copy.
        assert_eq!(app.on_clipboard_changed(), Outcome::Changed);
        assert_eq!(app.queue().len(), 1);
    }

    #[test]
    fn test_nul_bytes_are_not_queued() {
        let (mut app, clipboard, _) = attached_app();
        clipboard.copy("a\0b");
        assert_eq!(app.on_clipboard_changed(), Outcome::Changed);
        assert_eq!(app.queue().iter().next(), Some("ab"));
        clipboard.copy("\0");
        assert_eq!(app.on_clipboard_changed(), Outcome::Unchanged);
        assert_eq!(app.queue().len(), 1);
    }

    #[test]
    fn test_pop_while_detached_leaves_no_echo() {
        let (mut app, clipboard, _) = attached_app();
        clipboard.copy("a");
        app.on_clipboard_changed();
        app.detach().unwrap();
        assert_eq!(app.paste_next().unwrap().as_deref(), Some("a"));
        app.attach().unwrap();

        // The user copies the same text after re-attaching.
        clipboard.copy("a");
        assert_eq!(app.on_clipboard_changed(), Outcome::Changed);
        assert_eq!(app.queue().len(), 1);
    }

    #[test]
    fn test_detach_clears_pending_echo() {
        let (mut app, clipboard, _) = attached_app();
        clipboard.copy("a");
        app.on_clipboard_changed();
        app.paste_next().unwrap();
        app.toggle().unwrap();
        app.toggle().unwrap();

        clipboard.copy("a");
        assert_eq!(app.on_clipboard_changed(), Outcome::Changed);
        assert_eq!(app.queue().len(), 1);
    }

    #[test]
    fn test_paste_on_empty_queue_is_noop() {
        let (mut app, clipboard, _) = attached_app();
        clipboard.copy("untouched");
        assert_eq!(app.paste_next().unwrap(), None);
        assert!(clipboard.0.borrow().writes.is_empty());
        assert_eq!(clipboard.0.borrow().text.as_deref(), Some("untouched"));
    }

    #[test]
    fn test_failed_write_keeps_entry() {
        let (mut app, clipboard, _) = attached_app();
        clipboard.copy("keep me");
        app.on_clipboard_changed();
        clipboard.0.borrow_mut().fail_write = true;
        assert!(app.paste_next().is_err());
        assert_eq!(app.queue().iter().next(), Some("keep me"));
    }

    #[test]
    fn test_history_shortcuts() {
        let (mut app, _, _) = attached_app();
        assert!(app.on_key(&KeyBinding::ctrl('c')));
        assert!(app.on_key(&KeyBinding::ctrl('x')));
        assert!(!app.on_key(&KeyBinding::ctrl('q')));
        assert_eq!(app.history().tags(), "XC");
        assert_eq!(
            app.status_line(),
            "Items in queue: 0 | Listener: Active | History: XC"
        );
    }

    #[test]
    fn test_show_queue_shortcut() {
        let (mut app, clipboard, _) = attached_app();
        clipboard.copy("a");
        app.on_clipboard_changed();
        clipboard.copy("b");
        app.on_clipboard_changed();
        // The hook path only records the dialog; nothing is shown yet.
        assert!(app.on_key(&KeyBinding::ctrl('p')));
        assert_eq!(app.queue().len(), 2);

        let deferred = app.take_deferred();
        assert!(!deferred.redraw);
        assert_eq!(deferred.dialogs, vec!["Current Queue Contents:\na\nb"]);
        assert!(app.take_deferred().is_empty());
    }

    #[test]
    fn test_deferred_work_accumulates_until_taken() {
        let (mut app, _, _) = attached_app();
        assert!(app.take_deferred().is_empty());
        app.on_key(&KeyBinding::ctrl('c'));
        app.on_key(&KeyBinding::ctrl('p'));
        app.on_key(&KeyBinding::ctrl('p'));
        let deferred = app.take_deferred();
        assert!(deferred.redraw);
        assert_eq!(deferred.dialogs.len(), 2);
        assert!(app.take_deferred().is_empty());
    }

    #[test]
    fn test_toggle_mirrors_subscriptions() {
        let (mut app, _, subs) = attached_app();
        assert!(!app.toggle().unwrap());
        assert_eq!(app.is_listening(), subs.0.borrow().registered);
        assert!(app.toggle().unwrap());
        assert_eq!(app.is_listening(), subs.0.borrow().registered);
        app.shutdown();
        assert!(!subs.0.borrow().registered);
    }

    #[test]
    fn test_status_and_entries() {
        let mut config = Config::default_config();
        config.options.display_width = 8;
        let clipboard = FakeClipboard::default();
        let mut app = QueueApp::new(&config, clipboard.clone(), FakeSubs::default());
        app.attach().unwrap();
        clipboard.copy("short");
        app.on_clipboard_changed();
        clipboard.copy("a much longer\r\nsnippet");
        app.on_clipboard_changed();

        assert_eq!(app.entries(), vec!["a muc...", "short"]);
        let status = app.status();
        assert_eq!(status.queued, 2);
        assert!(status.listening);
        assert_eq!(status.line, "Items in queue: 2 | Listener: Active");
    }
}
