use clipq_common::error::Result;

/// Text access to the system clipboard.
pub trait ClipboardAccess {
    /// Current clipboard text, or `None` when the clipboard holds no text.
    fn read_text(&mut self) -> Result<Option<String>>;

    /// Replace the clipboard contents with `text`.
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// The pair of OS subscriptions that feed the queue: clipboard-change
/// notifications and the global keyboard hook.
///
/// `attach` registers both or neither; `detach` releases whatever is held.
pub trait Subscriptions {
    fn attach(&mut self) -> Result<()>;

    fn detach(&mut self) -> Result<()>;
}
