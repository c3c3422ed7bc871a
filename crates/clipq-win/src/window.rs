use crate::{last_error, to_wide};
use clipq_common::error::Result;
use clipq_common::ClipqError;
use std::cell::Cell;
use std::ptr;
use std::sync::OnceLock;
use tracing::{debug, warn};
use windows_sys::Win32::Foundation::{GetLastError, BOOL, HWND, LPARAM, LRESULT, WPARAM};
use windows_sys::Win32::System::Console::SetConsoleCtrlHandler;
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    PostMessageW, PostQuitMessage, RegisterClassW, TranslateMessage, HWND_MESSAGE, MSG,
    WM_APP, WM_CLIPBOARDUPDATE, WM_CLOSE, WM_DESTROY, WNDCLASSW,
};

const CLASS_NAME: &str = "clipq-message-window";
const WM_APP_WAKE: u32 = WM_APP + 1;
const ERROR_CLASS_ALREADY_EXISTS: u32 = 1410;

/// Messages the window forwards to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// `WM_CLIPBOARDUPDATE`.
    ClipboardUpdate,
    /// Another thread has work queued for the UI thread.
    Wake,
}

thread_local! {
    static EVENT_SINK: Cell<Option<fn(WindowEvent)>> = const { Cell::new(None) };
}

static CTRL_NOTIFIER: OnceLock<Notifier> = OnceLock::new();

/// Hidden message-only window owning the UI thread's message queue.
pub struct MessageWindow {
    hwnd: HWND,
}

impl MessageWindow {
    /// Create the window on the calling thread. `sink` receives every
    /// forwarded message on this thread.
    pub fn create(sink: fn(WindowEvent)) -> Result<Self> {
        EVENT_SINK.with(|s| s.set(Some(sink)));
        let class_name = to_wide(CLASS_NAME);

        unsafe {
            let hinstance = GetModuleHandleW(ptr::null());

            let mut class: WNDCLASSW = std::mem::zeroed();
            class.lpfnWndProc = Some(window_proc);
            class.hInstance = hinstance;
            class.lpszClassName = class_name.as_ptr();
            if RegisterClassW(&class) == 0 {
                let err = GetLastError();
                if err != ERROR_CLASS_ALREADY_EXISTS {
                    return Err(ClipqError::Win32(err));
                }
            }

            let hwnd = CreateWindowExW(
                0,
                class_name.as_ptr(),
                class_name.as_ptr(),
                0,
                0,
                0,
                0,
                0,
                HWND_MESSAGE,
                ptr::null_mut(),
                hinstance,
                ptr::null(),
            );
            if hwnd.is_null() {
                return Err(last_error());
            }

            debug!("Message window created");
            Ok(MessageWindow { hwnd })
        }
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// A handle other threads can use to wake or close this window.
    pub fn notifier(&self) -> Notifier {
        Notifier(self.hwnd as usize)
    }

    /// Pump messages until the window is destroyed.
    pub fn run(&self) -> Result<()> {
        unsafe {
            let mut msg: MSG = std::mem::zeroed();
            loop {
                match GetMessageW(&mut msg, ptr::null_mut(), 0, 0) {
                    0 => break,
                    -1 => return Err(last_error()),
                    _ => {
                        TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }
            }
        }
        debug!("Message loop finished");
        Ok(())
    }
}

impl Drop for MessageWindow {
    fn drop(&mut self) {
        // Already gone if the loop ended through WM_CLOSE.
        unsafe {
            DestroyWindow(self.hwnd);
        }
        EVENT_SINK.with(|s| s.set(None));
    }
}

/// Thread-safe handle to the message window.
#[derive(Debug, Clone, Copy)]
pub struct Notifier(usize);

impl Notifier {
    /// Ask the UI thread to look at its pending work.
    pub fn wake(&self) -> bool {
        self.post(WM_APP_WAKE)
    }

    /// Ask the UI thread to close the window and leave its message loop.
    pub fn close(&self) -> bool {
        self.post(WM_CLOSE)
    }

    fn post(&self, msg: u32) -> bool {
        let ok = unsafe { PostMessageW(self.0 as HWND, msg, 0, 0) } != 0;
        if !ok {
            warn!("PostMessageW({:#x}) failed: {}", msg, last_error());
        }
        ok
    }
}

/// Route Ctrl+C / Ctrl+Break / console close to `notifier.close()`.
pub fn close_on_console_ctrl(notifier: Notifier) -> Result<()> {
    if CTRL_NOTIFIER.set(notifier).is_err() {
        return Ok(());
    }
    if unsafe { SetConsoleCtrlHandler(Some(console_ctrl_handler), 1) } == 0 {
        return Err(last_error());
    }
    Ok(())
}

unsafe extern "system" fn console_ctrl_handler(_ctrl_type: u32) -> BOOL {
    match CTRL_NOTIFIER.get() {
        Some(notifier) => notifier.close() as BOOL,
        None => 0,
    }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let event = match msg {
        WM_CLIPBOARDUPDATE => Some(WindowEvent::ClipboardUpdate),
        WM_APP_WAKE => Some(WindowEvent::Wake),
        WM_CLOSE => {
            DestroyWindow(hwnd);
            return 0;
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            return 0;
        }
        _ => None,
    };

    match event {
        Some(event) => {
            if let Some(sink) = EVENT_SINK.with(|s| s.get()) {
                sink(event);
            }
            0
        }
        None => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
