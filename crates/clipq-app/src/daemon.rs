//! The daemon: queue, OS subscriptions and message loop on the UI thread.

use crate::console::ConsoleView;
use crate::control::{self, Bridge, ControlCall};
use anyhow::Result;
use clipq_common::error::Result as ClipqResult;
use clipq_common::ipc::pipe;
use clipq_common::{ControlRequest, ControlResponse};
use clipq_config::{Config, KeyBinding};
use clipq_core::{Outcome, QueueApp};
use clipq_win::window::close_on_console_ctrl;
use clipq_win::{dialog, MessageWindow, Notifier, WindowEvent, WinClipboard, WinSubscriptions};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{error, info, warn};

const DIALOG_TITLE: &str = "Queue Contents";

/// Flags from `clipq run`.
pub struct RunOptions {
    pub listen: bool,
    pub console: bool,
}

enum Event {
    Window(WindowEvent),
    Key(KeyBinding),
}

/// Work that must run after the daemon borrow is released, because it
/// pumps messages, posts to the window or ends the loop.
enum Effect {
    Show(String),
    /// Shortcut work is waiting; come back through the message loop.
    Wake,
    Quit,
}

struct Daemon {
    app: QueueApp<WinClipboard, WinSubscriptions>,
    calls: mpsc::Receiver<ControlCall>,
    console: ConsoleView,
}

thread_local! {
    static DAEMON: RefCell<Option<Daemon>> = const { RefCell::new(None) };
    static BACKLOG: RefCell<VecDeque<Event>> = const { RefCell::new(VecDeque::new()) };
    static NOTIFIER: RefCell<Option<Notifier>> = const { RefCell::new(None) };
}

impl Daemon {
    fn handle(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();
        let changed = match event {
            Event::Window(WindowEvent::ClipboardUpdate) => {
                self.app.on_clipboard_changed() == Outcome::Changed
            }
            // Inside the keyboard hook: state only, the rest waits for the wake.
            Event::Key(binding) => {
                if self.app.on_key(&binding) {
                    effects.push(Effect::Wake);
                }
                false
            }
            Event::Window(WindowEvent::Wake) => {
                let answered = self.drain_calls(&mut effects);
                let deferred = self.app.take_deferred();
                effects.extend(deferred.dialogs.into_iter().map(Effect::Show));
                answered || deferred.redraw
            }
        };
        if changed {
            self.redraw();
        }
        effects
    }

    /// Answer every pending control request. Returns whether to redraw.
    fn drain_calls(&mut self, effects: &mut Vec<Effect>) -> bool {
        let mut answered = false;
        while let Ok(call) = self.calls.try_recv() {
            if call.request == ControlRequest::Shutdown {
                effects.push(Effect::Quit);
            }
            let response = self.answer(call.request);
            if call.reply.send(response).is_err() {
                warn!("Control client went away before its reply");
            }
            answered = true;
        }
        answered
    }

    fn answer(&mut self, request: ControlRequest) -> ControlResponse {
        let app = &mut self.app;
        match request {
            ControlRequest::Status => ControlResponse::Status(app.status()),
            ControlRequest::List => ControlResponse::Entries(app.entries()),
            ControlRequest::Dump => ControlResponse::Text(app.dump()),
            ControlRequest::History => ControlResponse::Text(app.history().tags()),
            ControlRequest::Attach => {
                let result = app.attach();
                listening_response(result, app.is_listening())
            }
            ControlRequest::Detach => {
                let result = app.detach();
                listening_response(result, app.is_listening())
            }
            ControlRequest::Toggle => {
                let result = app.toggle();
                listening_response(result, app.is_listening())
            }
            ControlRequest::PasteNext => match app.paste_next() {
                Ok(pasted) => ControlResponse::Pasted(pasted),
                Err(e) => ControlResponse::Error(e.to_string()),
            },
            ControlRequest::Shutdown => ControlResponse::Ok,
        }
    }

    fn redraw(&self) {
        if let Err(e) = self.console.draw(&self.app.status_line(), &self.app.entries()) {
            warn!("Console redraw failed: {}", e);
        }
    }
}

fn listening_response(result: ClipqResult<bool>, listening: bool) -> ControlResponse {
    match result {
        Ok(_) => ControlResponse::Listening(listening),
        Err(e) => ControlResponse::Error(e.to_string()),
    }
}

/// Route an event to the daemon. Events raised while the daemon is busy
/// (nested message dispatch) wait in the backlog.
fn dispatch(event: Event) {
    let mut next = Some(event);
    while let Some(event) = next.take() {
        let effects = DAEMON.with(|cell| match cell.try_borrow_mut() {
            Ok(mut slot) => slot.as_mut().map(|daemon| daemon.handle(event)),
            Err(_) => {
                BACKLOG.with(|b| b.borrow_mut().push_back(event));
                None
            }
        });
        let Some(effects) = effects else {
            return;
        };
        for effect in effects {
            apply(effect);
        }
        next = BACKLOG.with(|b| b.borrow_mut().pop_front());
    }
}

fn apply(effect: Effect) {
    match effect {
        Effect::Show(text) => dialog::show_message(DIALOG_TITLE, &text),
        Effect::Wake => {
            if let Some(notifier) = NOTIFIER.with(|n| *n.borrow()) {
                notifier.wake();
            }
        }
        Effect::Quit => {
            info!("Shutdown requested");
            if let Some(notifier) = NOTIFIER.with(|n| *n.borrow()) {
                notifier.close();
            }
        }
    }
}

fn on_window_event(event: WindowEvent) {
    dispatch(Event::Window(event));
}

fn on_key(binding: KeyBinding) {
    dispatch(Event::Key(binding));
}

/// Run the daemon on the calling thread until it is stopped.
pub fn run(config: Config, options: RunOptions) -> Result<()> {
    let pipe_name = clipq_common::pipe_name();

    let runtime = tokio::runtime::Runtime::new()?;
    let first_pipe = {
        let _guard = runtime.enter();
        pipe::bind_first(&pipe_name)?
    };

    let window = MessageWindow::create(on_window_event)?;
    let notifier = window.notifier();
    NOTIFIER.with(|n| *n.borrow_mut() = Some(notifier));
    close_on_console_ctrl(notifier)?;

    let (calls_tx, calls_rx) = mpsc::channel();

    let hwnd = window.hwnd();
    let mut app = QueueApp::new(
        &config,
        WinClipboard::new(hwnd),
        WinSubscriptions::new(hwnd, on_key),
    );
    if options.listen {
        if let Err(e) = app.attach() {
            warn!("Failed to attach listener, starting detached: {}", e);
        }
    }

    let daemon = Daemon {
        app,
        calls: calls_rx,
        console: ConsoleView::new(options.console && config.options.console_view),
    };
    daemon.redraw();
    if !daemon.console.is_enabled() {
        info!("{}", daemon.app.status_line());
    }
    DAEMON.with(|d| *d.borrow_mut() = Some(daemon));

    let bridge = Bridge::new(calls_tx, move || notifier.wake());
    runtime.spawn(async move {
        if let Err(e) = control::serve(pipe_name, first_pipe, bridge).await {
            error!("Control server stopped: {}", e);
        }
    });

    info!("clipq daemon running");
    let result = window.run();

    if let Some(mut daemon) = DAEMON.with(|d| d.borrow_mut().take()) {
        daemon.app.shutdown();
    }
    NOTIFIER.with(|n| *n.borrow_mut() = None);
    runtime.shutdown_timeout(Duration::from_millis(200));
    info!("clipq daemon stopped");

    Ok(result?)
}
