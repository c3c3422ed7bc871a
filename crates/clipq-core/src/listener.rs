use crate::platform::Subscriptions;
use clipq_common::error::Result;
use tracing::{debug, info};

/// Listening state. `active` is only flipped after the OS call succeeded, so
/// it always mirrors whether the subscriptions are registered.
pub struct Listener<S> {
    subscriptions: S,
    active: bool,
}

impl<S: Subscriptions> Listener<S> {
    pub fn new(subscriptions: S) -> Self {
        Listener {
            subscriptions,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Register the subscriptions. Returns whether anything changed.
    pub fn attach(&mut self) -> Result<bool> {
        if self.active {
            debug!("Listener already attached");
            return Ok(false);
        }
        self.subscriptions.attach()?;
        self.active = true;
        info!("Listener attached");
        Ok(true)
    }

    /// Release the subscriptions. Returns whether anything changed.
    pub fn detach(&mut self) -> Result<bool> {
        if !self.active {
            debug!("Listener already detached");
            return Ok(false);
        }
        self.subscriptions.detach()?;
        self.active = false;
        info!("Listener detached");
        Ok(true)
    }

    /// Flip the state; returns the new state.
    pub fn toggle(&mut self) -> Result<bool> {
        if self.active {
            self.detach()?;
        } else {
            self.attach()?;
        }
        Ok(self.active)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use clipq_common::ClipqError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    pub(crate) struct FakeSubsState {
        pub registered: bool,
        pub fail_attach: bool,
        pub attach_calls: usize,
    }

    /// Subscriptions double that records registration in shared state.
    #[derive(Clone, Default)]
    pub(crate) struct FakeSubs(pub Rc<RefCell<FakeSubsState>>);

    impl Subscriptions for FakeSubs {
        fn attach(&mut self) -> Result<()> {
            let mut state = self.0.borrow_mut();
            state.attach_calls += 1;
            if state.fail_attach {
                return Err(ClipqError::Hook("refused".into()));
            }
            assert!(!state.registered, "double registration");
            state.registered = true;
            Ok(())
        }

        fn detach(&mut self) -> Result<()> {
            let mut state = self.0.borrow_mut();
            assert!(state.registered, "detach without registration");
            state.registered = false;
            Ok(())
        }
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let subs = FakeSubs::default();
        let mut listener = Listener::new(subs.clone());
        assert!(!listener.is_active());

        assert!(listener.toggle().unwrap());
        assert!(subs.0.borrow().registered);
        assert!(!listener.toggle().unwrap());
        assert!(!subs.0.borrow().registered);
        assert!(!listener.is_active());
    }

    #[test]
    fn test_repeated_attach_is_noop() {
        let subs = FakeSubs::default();
        let mut listener = Listener::new(subs.clone());
        assert!(listener.attach().unwrap());
        assert!(!listener.attach().unwrap());
        assert_eq!(subs.0.borrow().attach_calls, 1);
        assert!(listener.detach().unwrap());
        assert!(!listener.detach().unwrap());
    }

    #[test]
    fn test_failed_attach_stays_inactive() {
        let subs = FakeSubs::default();
        subs.0.borrow_mut().fail_attach = true;
        let mut listener = Listener::new(subs.clone());
        assert!(listener.attach().is_err());
        assert!(!listener.is_active());
        assert_eq!(listener.is_active(), subs.0.borrow().registered);
    }
}
