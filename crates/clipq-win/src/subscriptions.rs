use crate::hook::KeyboardHook;
use crate::listener::ClipboardListener;
use clipq_common::error::Result;
use clipq_config::KeyBinding;
use clipq_core::Subscriptions;
use windows_sys::Win32::Foundation::HWND;

/// Clipboard listener plus keyboard hook, registered and released together.
pub struct WinSubscriptions {
    hwnd: HWND,
    on_key: fn(KeyBinding),
    listener: Option<ClipboardListener>,
    hook: Option<KeyboardHook>,
}

impl WinSubscriptions {
    pub fn new(hwnd: HWND, on_key: fn(KeyBinding)) -> Self {
        WinSubscriptions {
            hwnd,
            on_key,
            listener: None,
            hook: None,
        }
    }
}

impl Subscriptions for WinSubscriptions {
    fn attach(&mut self) -> Result<()> {
        // A failed hook drops the listener registered just before it.
        let listener = ClipboardListener::register(self.hwnd)?;
        let hook = KeyboardHook::install(self.on_key)?;
        self.listener = Some(listener);
        self.hook = Some(hook);
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        self.hook = None;
        self.listener = None;
        Ok(())
    }
}
