use crate::last_error;
use clipq_common::error::Result;
use clipq_common::ClipqError;
use clipq_core::ClipboardAccess;
use std::ptr;
use std::time::Duration;
use tracing::{debug, trace};
use windows_sys::Win32::Foundation::{GlobalFree, HWND};
use windows_sys::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, GetClipboardData, IsClipboardFormatAvailable,
    OpenClipboard, SetClipboardData,
};
use windows_sys::Win32::System::Memory::{
    GlobalAlloc, GlobalLock, GlobalSize, GlobalUnlock, GMEM_MOVEABLE,
};

const CF_UNICODETEXT: u32 = 13;
const OPEN_ATTEMPTS: u32 = 5;
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Clipboard text access through the Win32 clipboard API.
pub struct WinClipboard {
    owner: HWND,
}

impl WinClipboard {
    /// `owner` becomes the clipboard owner on writes.
    pub fn new(owner: HWND) -> Self {
        WinClipboard { owner }
    }
}

/// Open clipboard; closed on drop.
struct OpenGuard;

impl OpenGuard {
    fn open(owner: HWND) -> Result<Self> {
        // Whoever triggered the change notification may still hold the clipboard.
        let mut attempt = 1;
        loop {
            if unsafe { OpenClipboard(owner) } != 0 {
                return Ok(OpenGuard);
            }
            if attempt == OPEN_ATTEMPTS {
                return Err(ClipqError::Clipboard(format!(
                    "OpenClipboard failed after {} attempts: {}",
                    OPEN_ATTEMPTS,
                    last_error()
                )));
            }
            trace!("Clipboard busy (attempt {}), retrying", attempt);
            attempt += 1;
            std::thread::sleep(OPEN_RETRY_DELAY);
        }
    }
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        unsafe {
            CloseClipboard();
        }
    }
}

/// `CF_UNICODETEXT` payload: UTF-16 with one trailing NUL.
///
/// Readers stop at the first NUL, so interior ones are dropped.
fn clipboard_units(text: &str) -> Vec<u16> {
    text.encode_utf16()
        .filter(|&unit| unit != 0)
        .chain(std::iter::once(0))
        .collect()
}

impl ClipboardAccess for WinClipboard {
    fn read_text(&mut self) -> Result<Option<String>> {
        if unsafe { IsClipboardFormatAvailable(CF_UNICODETEXT) } == 0 {
            return Ok(None);
        }

        let _open = OpenGuard::open(self.owner)?;
        unsafe {
            let handle = GetClipboardData(CF_UNICODETEXT);
            if handle.is_null() {
                return Err(last_error());
            }
            let data = GlobalLock(handle) as *const u16;
            if data.is_null() {
                return Err(last_error());
            }

            let units = GlobalSize(handle) / std::mem::size_of::<u16>();
            let raw = std::slice::from_raw_parts(data, units);
            let len = raw.iter().position(|&c| c == 0).unwrap_or(units);
            let text = String::from_utf16_lossy(&raw[..len]);
            GlobalUnlock(handle);

            debug!("Read {} UTF-16 units from clipboard", len);
            Ok(Some(text))
        }
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        let wide = clipboard_units(text);
        let bytes = wide.len() * std::mem::size_of::<u16>();

        let _open = OpenGuard::open(self.owner)?;
        unsafe {
            if EmptyClipboard() == 0 {
                return Err(last_error());
            }

            let hmem = GlobalAlloc(GMEM_MOVEABLE, bytes);
            if hmem.is_null() {
                return Err(last_error());
            }
            let dst = GlobalLock(hmem) as *mut u16;
            if dst.is_null() {
                let err = last_error();
                GlobalFree(hmem);
                return Err(err);
            }
            ptr::copy_nonoverlapping(wide.as_ptr(), dst, wide.len());
            GlobalUnlock(hmem);

            // On success the system owns the memory.
            if SetClipboardData(CF_UNICODETEXT, hmem).is_null() {
                let err = last_error();
                GlobalFree(hmem);
                return Err(err);
            }
        }

        debug!("Wrote {} UTF-16 units to clipboard", wide.len() - 1);
        Ok(())
    }
}
