//! Recording UI sink for testing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::traits::{UiEvent, UiSink};

/// [`UiSink`] that records every event and reports a settable loading flag.
#[derive(Debug, Default)]
pub struct RecordingUi {
    loading: AtomicBool,
    /// Loading flag reported after the next event is dispatched.
    leave_loading_on_dispatch: AtomicBool,
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that starts on a loading screen.
    pub fn loading() -> Self {
        let ui = Self::new();
        ui.set_loading(true);
        ui
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
    }

    /// Leave the loading screen as soon as any event is dispatched.
    pub fn leave_loading_on_dispatch(&self) {
        self.leave_loading_on_dispatch.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&UiEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl UiSink for RecordingUi {
    fn is_loading_screen(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    fn dispatch(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
        if self.leave_loading_on_dispatch.load(Ordering::SeqCst) {
            self.set_loading(false);
        }
    }
}
