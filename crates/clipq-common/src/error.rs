use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipqError {
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Keyboard hook error: {0}")]
    Hook(String),

    #[error("Win32 error: code {0}")]
    Win32(u32),
}

pub type Result<T> = std::result::Result<T, ClipqError>;
