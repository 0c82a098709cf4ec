//! Change notification hooks.
//!
//! The embedder implements [`ChangeHooks`] and installs it on a buffer.
//! Hooks receive the buffer itself and may edit it further; while a hook
//! runs it is detached from the buffer, so nested edits do not re-enter it.

use crate::buffer::Buffer;
use crate::error::Result;

/// Which part of a changed range composition caches must recheck.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositionCheck {
    /// Everything in the range.
    All,
    /// Only the range borders.
    Border,
    /// Only the tail end.
    Tail,
}

/// Callbacks run around buffer modifications.
///
/// Every method has a no-op default.
pub trait ChangeHooks {
    /// `[start, end)` is about to change.
    fn before_change(&mut self, buffer: &mut Buffer, start: usize, end: usize) -> Result<()> {
        let _ = (buffer, start, end);
        Ok(())
    }

    /// Text that spanned `[start, old_end)` now spans `[start, new_end)`.
    fn after_change(
        &mut self,
        buffer: &mut Buffer,
        start: usize,
        old_end: usize,
        new_end: usize,
    ) -> Result<()> {
        let _ = (buffer, start, old_end, new_end);
        Ok(())
    }

    /// Whether [`fontify`](Self::fontify) should run before substrings are
    /// copied out with their properties.
    fn wants_fontify(&self) -> bool {
        false
    }

    /// `[start, end)` is about to be copied with its properties.
    fn fontify(&mut self, buffer: &mut Buffer, start: usize, end: usize) -> Result<()> {
        let _ = (buffer, start, end);
        Ok(())
    }

    /// Composition caches over `[start, end)` may be stale.
    fn update_compositions(&mut self, buffer: &Buffer, start: usize, end: usize, check: CompositionCheck) {
        let _ = (buffer, start, end, check);
    }
}

impl Buffer {
    /// Install change hooks, returning the previous ones.
    pub fn set_change_hooks(&mut self, hooks: Box<dyn ChangeHooks>) -> Option<Box<dyn ChangeHooks>> {
        self.hooks.replace(hooks)
    }

    /// Remove change hooks.
    pub fn take_change_hooks(&mut self) -> Option<Box<dyn ChangeHooks>> {
        self.hooks.take()
    }

    #[must_use]
    pub fn has_change_hooks(&self) -> bool {
        self.hooks.is_some()
    }

    /// Run `f` with the hooks detached; they go back afterwards unless the
    /// callback installed new ones.
    fn with_hooks<R>(&mut self, f: impl FnOnce(&mut dyn ChangeHooks, &mut Self) -> R) -> Option<R> {
        let mut hooks = self.hooks.take()?;
        let result = f(hooks.as_mut(), self);
        if self.hooks.is_none() {
            self.hooks = Some(hooks);
        }
        Some(result)
    }

    pub(crate) fn run_before_change(&mut self, start: usize, end: usize) -> Result<()> {
        self.with_hooks(|hooks, buf| hooks.before_change(buf, start, end))
            .unwrap_or(Ok(()))
    }

    pub(crate) fn run_after_change(&mut self, start: usize, old_end: usize, new_end: usize) -> Result<()> {
        self.with_hooks(|hooks, buf| hooks.after_change(buf, start, old_end, new_end))
            .unwrap_or(Ok(()))
    }

    pub(crate) fn run_fontify(&mut self, start: usize, end: usize) -> Result<()> {
        if !self.hooks.as_ref().is_some_and(|h| h.wants_fontify()) {
            return Ok(());
        }
        self.with_hooks(|hooks, buf| hooks.fontify(buf, start, end))
            .unwrap_or(Ok(()))
    }

    pub(crate) fn update_compositions(&mut self, start: usize, end: usize, check: CompositionCheck) {
        self.with_hooks(|hooks, buf| hooks.update_compositions(buf, start, end, check));
    }
}
