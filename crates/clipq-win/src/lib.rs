//! Win32 side of clipq: a hidden message window, the clipboard-format
//! listener, the low-level keyboard hook and clipboard text access.
#![cfg(windows)]

pub mod clipboard;
pub mod dialog;
pub mod hook;
pub mod listener;
pub mod subscriptions;
pub mod window;

pub use clipboard::WinClipboard;
pub use subscriptions::WinSubscriptions;
pub use window::{MessageWindow, Notifier, WindowEvent};

use clipq_common::ClipqError;
use windows_sys::Win32::Foundation::GetLastError;

/// NUL-terminated UTF-16 for Win32 `W` functions.
pub(crate) fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// The calling thread's last Win32 error as a `ClipqError`.
pub(crate) fn last_error() -> ClipqError {
    ClipqError::Win32(unsafe { GetLastError() })
}
