use crate::to_wide;
use std::ptr;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    MessageBoxW, MB_ICONINFORMATION, MB_OK, MB_SETFOREGROUND, MB_TOPMOST,
};

/// Show a modal information box. Runs a nested message loop until dismissed.
pub fn show_message(title: &str, text: &str) {
    let title = to_wide(title);
    let text = to_wide(text);
    unsafe {
        MessageBoxW(
            ptr::null_mut(),
            text.as_ptr(),
            title.as_ptr(),
            MB_OK | MB_ICONINFORMATION | MB_SETFOREGROUND | MB_TOPMOST,
        );
    }
}
