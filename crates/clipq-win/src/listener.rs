use crate::last_error;
use clipq_common::error::Result;
use tracing::{debug, warn};
use windows_sys::Win32::Foundation::HWND;
use windows_sys::Win32::System::DataExchange::{
    AddClipboardFormatListener, RemoveClipboardFormatListener,
};

/// Registration of a window for `WM_CLIPBOARDUPDATE`. Removed on drop.
pub struct ClipboardListener {
    hwnd: HWND,
}

impl ClipboardListener {
    pub fn register(hwnd: HWND) -> Result<Self> {
        if unsafe { AddClipboardFormatListener(hwnd) } == 0 {
            return Err(last_error());
        }
        debug!("Clipboard format listener added");
        Ok(ClipboardListener { hwnd })
    }
}

impl Drop for ClipboardListener {
    fn drop(&mut self) {
        if unsafe { RemoveClipboardFormatListener(self.hwnd) } == 0 {
            warn!("RemoveClipboardFormatListener failed: {}", last_error());
        } else {
            debug!("Clipboard format listener removed");
        }
    }
}
