use crate::last_error;
use clipq_common::error::Result;
use clipq_common::ClipqError;
use clipq_config::{Key, KeyBinding, Modifiers};
use std::cell::Cell;
use std::ptr;
use tracing::{debug, warn};
use windows_sys::Win32::Foundation::{GetLastError, LPARAM, LRESULT, WPARAM};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VK_CONTROL, VK_MENU, VK_SHIFT,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, SetWindowsHookExW, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT,
    WH_KEYBOARD_LL, WM_KEYDOWN, WM_SYSKEYDOWN,
};

const HC_ACTION: i32 = 0;

const VK_BACK: u32 = 0x08;
const VK_TAB: u32 = 0x09;
const VK_RETURN: u32 = 0x0D;
const VK_ESCAPE: u32 = 0x1B;
const VK_SPACE: u32 = 0x20;
const VK_PRIOR: u32 = 0x21;
const VK_NEXT: u32 = 0x22;
const VK_END: u32 = 0x23;
const VK_HOME: u32 = 0x24;
const VK_LEFT: u32 = 0x25;
const VK_UP: u32 = 0x26;
const VK_RIGHT: u32 = 0x27;
const VK_DOWN: u32 = 0x28;
const VK_INSERT: u32 = 0x2D;
const VK_DELETE: u32 = 0x2E;
const VK_F1: u32 = 0x70;
const VK_F24: u32 = 0x87;

thread_local! {
    static KEY_SINK: Cell<Option<fn(KeyBinding)>> = const { Cell::new(None) };
}

/// Global low-level keyboard hook. Unhooked on drop.
///
/// The callback runs on the installing thread, which must pump messages.
pub struct KeyboardHook {
    hhook: HHOOK,
}

impl KeyboardHook {
    /// Install the hook; `sink` receives every key-down that maps to a [`Key`].
    pub fn install(sink: fn(KeyBinding)) -> Result<Self> {
        KEY_SINK.with(|s| s.set(Some(sink)));
        let hhook = unsafe {
            SetWindowsHookExW(
                WH_KEYBOARD_LL,
                Some(hook_proc),
                GetModuleHandleW(ptr::null()),
                0,
            )
        };
        if hhook.is_null() {
            let code = unsafe { GetLastError() };
            KEY_SINK.with(|s| s.set(None));
            return Err(ClipqError::Hook(format!(
                "SetWindowsHookExW failed: code {}",
                code
            )));
        }
        debug!("Keyboard hook installed");
        Ok(KeyboardHook { hhook })
    }
}

impl Drop for KeyboardHook {
    fn drop(&mut self) {
        if unsafe { UnhookWindowsHookEx(self.hhook) } == 0 {
            warn!("UnhookWindowsHookEx failed: {}", last_error());
        } else {
            debug!("Keyboard hook removed");
        }
        KEY_SINK.with(|s| s.set(None));
    }
}

/// Map a virtual-key code to a bindable key.
pub fn vk_to_key(vk: u32) -> Option<Key> {
    let key = match vk {
        0x41..=0x5A => Key::Char(char::from(vk as u8).to_ascii_lowercase()),
        0x30..=0x39 => Key::Char(char::from(vk as u8)),
        VK_F1..=VK_F24 => Key::F((vk - VK_F1 + 1) as u8),
        VK_BACK => Key::Backspace,
        VK_TAB => Key::Tab,
        VK_RETURN => Key::Enter,
        VK_ESCAPE => Key::Escape,
        VK_SPACE => Key::Space,
        VK_PRIOR => Key::PageUp,
        VK_NEXT => Key::PageDown,
        VK_END => Key::End,
        VK_HOME => Key::Home,
        VK_LEFT => Key::Left,
        VK_UP => Key::Up,
        VK_RIGHT => Key::Right,
        VK_DOWN => Key::Down,
        VK_INSERT => Key::Insert,
        VK_DELETE => Key::Delete,
        _ => return None,
    };
    Some(key)
}

fn is_key_down(vk: u16) -> bool {
    let state = unsafe { GetAsyncKeyState(vk as i32) };
    (state as u16 & 0x8000) != 0
}

fn current_modifiers() -> Modifiers {
    Modifiers {
        ctrl: is_key_down(VK_CONTROL),
        alt: is_key_down(VK_MENU),
        shift: is_key_down(VK_SHIFT),
    }
}

unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let msg = wparam as u32;
    if code == HC_ACTION && (msg == WM_KEYDOWN || msg == WM_SYSKEYDOWN) {
        let info = &*(lparam as *const KBDLLHOOKSTRUCT);
        if let Some(key) = vk_to_key(info.vkCode) {
            if let Some(sink) = KEY_SINK.with(|s| s.get()) {
                sink(KeyBinding::new(key, current_modifiers()));
            }
        }
    }
    // Never swallow the keystroke.
    CallNextHookEx(ptr::null_mut(), code, wparam, lparam)
}
