use serde::{Deserialize, Serialize};

/// Requests sent by `clipq` subcommands to the running daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlRequest {
    /// Queue depth, listener state and recent operations.
    Status,

    /// Queue entries as displayed: most recent first, truncated.
    List,

    /// Full queue contents, oldest first.
    Dump,

    /// Operation history tags, most recent first.
    History,

    /// Register the clipboard listener and the keyboard hook.
    Attach,

    /// Unregister the clipboard listener and the keyboard hook.
    Detach,

    /// Flip the listening state.
    Toggle,

    /// Dequeue the oldest entry onto the clipboard.
    PasteNext,

    /// Stop the daemon.
    Shutdown,
}

/// Responses sent by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlResponse {
    Status(StatusInfo),

    /// Display lines for the queue listing.
    Entries(Vec<String>),

    /// Free-form text (queue dump, history).
    Text(String),

    /// Listening state after an attach/detach/toggle.
    Listening(bool),

    /// The entry moved to the clipboard, if the queue was not empty.
    Pasted(Option<String>),

    Ok,

    Error(String),
}

/// Daemon state summary for `clipq status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub queued: usize,
    pub listening: bool,
    pub history: String,
    /// Preformatted status line, same as the console view shows.
    pub line: String,
}

impl ControlResponse {
    /// Stand-in for a response whose body of `len` bytes does not fit in a frame.
    pub fn oversized(&self, len: u64) -> ControlResponse {
        let message = match self {
            ControlResponse::Pasted(Some(_)) => format!(
                "entry pasted to the clipboard, but too large to return ({} bytes)",
                len
            ),
            _ => format!("response too large ({} bytes)", len),
        };
        ControlResponse::Error(message)
    }
}
