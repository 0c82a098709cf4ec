#![allow(clippy::nursery)] // Test infra prioritizes clarity over pedantry
#![allow(clippy::pedantic)] // Test infra prioritizes clarity over pedantry
#![allow(dead_code)] // Each test binary uses a different subset

use std::sync::Once;

use textcore::buffer::{Buffer, ChangeHooks, CompositionCheck};
use textcore::{LogLevel, Result, set_log_callback};
use tracing::Level;

/// Route the crate's log callback into `tracing` and install a test
/// subscriber. Safe to call from every test.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_test_writer()
            .try_init();
        set_log_callback(|level, message| match level {
            LogLevel::Debug => tracing::debug!(target: "textcore", "{message}"),
            LogLevel::Info => tracing::info!(target: "textcore", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "textcore", "{message}"),
            LogLevel::Error => tracing::error!(target: "textcore", "{message}"),
        });
    });
}

/// One call seen by [`RecordingHooks`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookCall {
    Before(usize, usize),
    After(usize, usize, usize),
    Compositions(usize, usize, CompositionCheck),
}

/// Change hooks that append every call to a shared log.
#[derive(Clone, Debug, Default)]
pub struct RecordingHooks {
    pub calls: std::rc::Rc<std::cell::RefCell<Vec<HookCall>>>,
}

impl RecordingHooks {
    pub fn install(buf: &mut Buffer) -> std::rc::Rc<std::cell::RefCell<Vec<HookCall>>> {
        let hooks = Self::default();
        let calls = hooks.calls.clone();
        buf.set_change_hooks(Box::new(hooks));
        calls
    }
}

impl ChangeHooks for RecordingHooks {
    fn before_change(&mut self, _buffer: &mut Buffer, start: usize, end: usize) -> Result<()> {
        self.calls.borrow_mut().push(HookCall::Before(start, end));
        Ok(())
    }

    fn after_change(&mut self, _buffer: &mut Buffer, start: usize, old_end: usize, new_end: usize) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(HookCall::After(start, old_end, new_end));
        Ok(())
    }

    fn update_compositions(&mut self, _buffer: &Buffer, start: usize, end: usize, check: CompositionCheck) {
        self.calls
            .borrow_mut()
            .push(HookCall::Compositions(start, end, check));
    }
}

/// Buffer text with point shown as `|`.
pub fn show_point(buf: &Buffer) -> String {
    let text = buf.text_string();
    let at = buf.point() - 1;
    let mut out = String::new();
    for (i, c) in text.chars().enumerate() {
        if i == at {
            out.push('|');
        }
        out.push(c);
    }
    if at >= text.chars().count() {
        out.push('|');
    }
    out
}
