pub mod app;
pub mod history;
pub mod listener;
pub mod platform;
pub mod queue;
pub mod shortcuts;
pub mod view;

pub use app::{Deferred, Outcome, QueueApp};
pub use history::{Op, OpHistory};
pub use listener::Listener;
pub use platform::{ClipboardAccess, Subscriptions};
pub use queue::ClipQueue;
pub use shortcuts::{Action, ShortcutMap};
