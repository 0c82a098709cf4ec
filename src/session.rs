//! The set of live buffers and which one is current.
//!
//! Buffers live in a generational arena addressed by [`BufferId`]. Killing
//! a buffer bumps its slot's generation, so stale ids and the [`Marker`]
//! handles that name them become inert instead of aliasing a new buffer.

use std::ops::{Deref, DerefMut};

use crate::buffer::{Buffer, InsertionType, MarkerId};
use crate::editfns;
use crate::error::{Error, Result};
use crate::event::debug_log;

/// Name of the buffer a session starts with.
pub const SCRATCH: &str = "*scratch*";

/// Stable handle to a buffer slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId {
    index: u32,
    generation: u32,
}

/// A position reference that may move between buffers.
///
/// A marker made with [`Session::make_marker`] points nowhere until
/// [`Session::set_marker`] attaches it. A marker whose buffer was killed,
/// or whose slot was freed, reads as detached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Marker {
    target: Option<(BufferId, MarkerId)>,
    insertion_type: InsertionType,
}

impl Marker {
    /// The buffer this marker was last attached to.
    #[must_use]
    pub fn buffer_id(&self) -> Option<BufferId> {
        self.target.map(|(buffer, _)| buffer)
    }

    #[must_use]
    pub const fn insertion_type(&self) -> InsertionType {
        self.insertion_type
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    buffer: Option<Buffer>,
}

/// All buffers of an editing session.
#[derive(Debug)]
pub struct Session {
    slots: Vec<Slot>,
    free: Vec<u32>,
    current: BufferId,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session holding only [`SCRATCH`], which is current.
    #[must_use]
    pub fn new() -> Self {
        let mut session = Self {
            slots: Vec::new(),
            free: Vec::new(),
            current: BufferId {
                index: 0,
                generation: 0,
            },
        };
        session.current = session.add(Buffer::new(SCRATCH));
        session
    }

    fn add(&mut self, buffer: Buffer) -> BufferId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.buffer = Some(buffer);
            BufferId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                buffer: Some(buffer),
            });
            BufferId {
                index,
                generation: 0,
            }
        }
    }

    // ============================================
    // Buffers
    // ============================================

    /// The live buffer called `name`.
    #[must_use]
    pub fn get_buffer(&self, name: &str) -> Option<BufferId> {
        self.buffer_list()
            .into_iter()
            .find(|&id| self.buffer(id).is_ok_and(|b| b.name() == name))
    }

    /// The live buffer called `name`, creating an empty one if needed.
    pub fn get_buffer_create(&mut self, name: &str) -> BufferId {
        match self.get_buffer(name) {
            Some(id) => id,
            None => self.add(Buffer::new(name)),
        }
    }

    /// Add an already built buffer. Its name is not checked for clashes.
    pub fn adopt_buffer(&mut self, buffer: Buffer) -> BufferId {
        self.add(buffer)
    }

    /// Ids of all live buffers, in slot order.
    #[must_use]
    pub fn buffer_list(&self) -> Vec<BufferId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.buffer.is_some())
            .map(|(i, slot)| BufferId {
                index: i as u32,
                generation: slot.generation,
            })
            .collect()
    }

    #[must_use]
    pub fn buffer_live_p(&self, id: BufferId) -> bool {
        self.buffer(id).is_ok()
    }

    pub fn buffer(&self, id: BufferId) -> Result<&Buffer> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.buffer.as_ref())
            .ok_or(Error::DeadBuffer)
    }

    pub fn buffer_mut(&mut self, id: BufferId) -> Result<&mut Buffer> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.buffer.as_mut())
            .ok_or(Error::DeadBuffer)
    }

    #[must_use]
    pub const fn current_buffer(&self) -> BufferId {
        self.current
    }

    /// The current buffer. A session always has one.
    #[must_use]
    pub fn current(&self) -> &Buffer {
        match self.slots.get(self.current.index as usize).and_then(|s| s.buffer.as_ref()) {
            Some(buffer) => buffer,
            None => unreachable!("current buffer is always live"),
        }
    }

    pub fn current_mut(&mut self) -> &mut Buffer {
        match self
            .slots
            .get_mut(self.current.index as usize)
            .and_then(|s| s.buffer.as_mut())
        {
            Some(buffer) => buffer,
            None => unreachable!("current buffer is always live"),
        }
    }

    /// Make `id` current.
    pub fn set_buffer(&mut self, id: BufferId) -> Result<()> {
        self.buffer(id)?;
        self.current = id;
        Ok(())
    }

    /// Kill a buffer: its markers and overlays are released and its id goes
    /// dead. If it was current, another live buffer becomes current, and a
    /// fresh [`SCRATCH`] is made when none is left. Returns false if `id`
    /// was already dead.
    pub fn kill_buffer(&mut self, id: BufferId) -> bool {
        let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
        else {
            return false;
        };
        let Some(mut buffer) = slot.buffer.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        buffer.release_positions();
        debug_log(|| format!("killed buffer {}", buffer.name()));

        if self.current == id {
            self.current = match self.buffer_list().first() {
                Some(&other) => other,
                None => self.add(Buffer::new(SCRATCH)),
            };
        }
        true
    }

    /// Run `f` with `id` as the current buffer, then make the previous
    /// buffer current again if it is still live.
    pub fn with_current_buffer<R>(&mut self, id: BufferId, f: impl FnOnce(&mut Session) -> R) -> Result<R> {
        let mut guard = CurrentBufferGuard::new(self);
        guard.set_buffer(id)?;
        Ok(f(&mut guard))
    }

    /// Run `f`, then restore the current buffer and its point. Point is
    /// tracked by a marker, so it follows edits made by `f`.
    pub fn save_excursion<R>(&mut self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = SessionExcursion::new(self);
        f(&mut guard)
    }

    // ============================================
    // Markers
    // ============================================

    /// A marker that points nowhere.
    #[must_use]
    pub fn make_marker(&self) -> Marker {
        Marker::default()
    }

    /// A marker at point in the current buffer.
    pub fn point_marker(&mut self) -> Marker {
        let id = self.current;
        let buffer = self.current_mut();
        let marker = buffer.create_marker(buffer.point(), InsertionType::Before);
        Marker {
            target: Some((id, marker)),
            insertion_type: InsertionType::Before,
        }
    }

    /// Live buffer and slot of `marker`.
    fn resolve(&self, marker: &Marker) -> Option<(BufferId, MarkerId)> {
        let (buffer, id) = marker.target?;
        self.buffer(buffer)
            .ok()
            .filter(|b| b.markers().contains(id))
            .map(|_| (buffer, id))
    }

    /// The buffer `marker` points into, if it points anywhere.
    #[must_use]
    pub fn marker_buffer(&self, marker: &Marker) -> Option<BufferId> {
        self.resolve(marker).map(|(buffer, _)| buffer)
    }

    #[must_use]
    pub fn marker_position(&self, marker: &Marker) -> Option<usize> {
        let (buffer, id) = self.resolve(marker)?;
        self.buffer(buffer).ok()?.marker_position(id)
    }

    /// Point `marker` at `position` in `buffer`, clamped to the buffer's
    /// full extent. `None` for either argument detaches the marker.
    pub fn set_marker(&mut self, marker: &mut Marker, position: Option<usize>, buffer: Option<BufferId>) {
        let (Some(position), Some(target)) = (position, buffer) else {
            self.free_marker(marker);
            return;
        };
        if !self.buffer_live_p(target) {
            self.free_marker(marker);
            return;
        }
        if let Some((current, id)) = self.resolve(marker) {
            if current == target {
                if let Ok(b) = self.buffer_mut(target) {
                    b.set_marker_position(id, position);
                }
                return;
            }
        }
        self.free_marker(marker);
        if let Ok(b) = self.buffer_mut(target) {
            let id = b.create_marker(position, marker.insertion_type);
            marker.target = Some((target, id));
        }
    }

    /// A new marker at the same place as `marker`, with `insertion_type`.
    pub fn copy_marker(&mut self, marker: &Marker, insertion_type: InsertionType) -> Marker {
        let mut copy = Marker {
            target: None,
            insertion_type,
        };
        if let Some((buffer, _)) = self.resolve(marker) {
            let position = self.marker_position(marker);
            self.set_marker(&mut copy, position, Some(buffer));
        }
        copy
    }

    pub fn set_marker_insertion_type(&mut self, marker: &mut Marker, insertion_type: InsertionType) {
        marker.insertion_type = insertion_type;
        if let Some((buffer, id)) = self.resolve(marker) {
            if let Ok(b) = self.buffer_mut(buffer) {
                b.set_marker_insertion_type(id, insertion_type);
            }
        }
    }

    /// Detach `marker`, releasing its slot.
    pub fn free_marker(&mut self, marker: &mut Marker) {
        if let Some((buffer, id)) = self.resolve(marker) {
            if let Ok(b) = self.buffer_mut(buffer) {
                b.free_marker(id);
            }
        }
        marker.target = None;
    }

    /// Make `marker`'s buffer current and move point to it.
    pub fn goto_marker(&mut self, marker: &Marker) -> Result<usize> {
        let (buffer, id) = self.resolve(marker).ok_or(Error::DetachedMarker)?;
        self.set_buffer(buffer)?;
        let b = self.current_mut();
        let pos = b.marker_position(id).ok_or(Error::DetachedMarker)?;
        Ok(b.goto_char(pos))
    }

    // ============================================
    // Text Across Buffers
    // ============================================

    /// Insert `[start, end)` of buffer `from`, with its properties, at point
    /// of the current buffer.
    pub fn insert_buffer_substring(&mut self, from: BufferId, start: usize, end: usize) -> Result<()> {
        let text = self.buffer_mut(from)?.buffer_substring(start, end)?;
        self.current_mut().insert_text(&text)
    }

    /// Compare `[start1, end1)` of `a` with `[start2, end2)` of `b`; see
    /// [`editfns::compare_buffer_substrings`].
    pub fn compare_buffer_substrings(
        &self,
        a: BufferId,
        start1: usize,
        end1: usize,
        b: BufferId,
        start2: usize,
        end2: usize,
    ) -> Result<i64> {
        editfns::compare_buffer_substrings(self.buffer(a)?, start1, end1, self.buffer(b)?, start2, end2)
    }
}

/// Makes the saved buffer current again when dropped.
struct CurrentBufferGuard<'a> {
    session: &'a mut Session,
    saved: BufferId,
}

impl<'a> CurrentBufferGuard<'a> {
    fn new(session: &'a mut Session) -> Self {
        let saved = session.current;
        Self { session, saved }
    }
}

impl Deref for CurrentBufferGuard<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.session
    }
}

impl DerefMut for CurrentBufferGuard<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        self.session
    }
}

impl Drop for CurrentBufferGuard<'_> {
    fn drop(&mut self) {
        // Killed meanwhile: whatever is current now stays current.
        let _ = self.session.set_buffer(self.saved);
    }
}

struct SessionExcursion<'a> {
    session: &'a mut Session,
    point: Marker,
}

impl<'a> SessionExcursion<'a> {
    fn new(session: &'a mut Session) -> Self {
        let point = session.point_marker();
        Self { session, point }
    }
}

impl Deref for SessionExcursion<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.session
    }
}

impl DerefMut for SessionExcursion<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        self.session
    }
}

impl Drop for SessionExcursion<'_> {
    fn drop(&mut self) {
        if self.session.goto_marker(&self.point).is_ok() {
            self.session.free_marker(&mut self.point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_has_scratch() {
        let session = Session::new();
        assert_eq!(session.current().name(), SCRATCH);
        assert_eq!(session.buffer_list().len(), 1);
    }

    #[test]
    fn test_get_buffer_create_reuses_by_name() {
        let mut session = Session::new();
        let a = session.get_buffer_create("notes");
        let b = session.get_buffer_create("notes");
        assert_eq!(a, b);
        assert_eq!(session.get_buffer("notes"), Some(a));
        assert_eq!(session.get_buffer("missing"), None);
    }

    #[test]
    fn test_killed_id_goes_dead() {
        let mut session = Session::new();
        let a = session.get_buffer_create("a");
        assert!(session.kill_buffer(a));
        assert!(!session.kill_buffer(a));
        assert_eq!(session.buffer(a).err(), Some(Error::DeadBuffer));
        assert_eq!(session.set_buffer(a), Err(Error::DeadBuffer));

        // The slot is reused, but the old id does not alias the new buffer.
        let b = session.get_buffer_create("b");
        assert_ne!(a, b);
        assert!(!session.buffer_live_p(a));
    }

    #[test]
    fn test_killing_current_picks_another() {
        let mut session = Session::new();
        let scratch = session.current_buffer();
        let other = session.get_buffer_create("other");
        session.kill_buffer(scratch);
        assert_eq!(session.current_buffer(), other);
        session.kill_buffer(other);
        assert_eq!(session.current().name(), SCRATCH);
    }

    #[test]
    fn test_with_current_buffer_restores() {
        let mut session = Session::new();
        let scratch = session.current_buffer();
        let notes = session.get_buffer_create("notes");
        let name = session
            .with_current_buffer(notes, |s| {
                s.current_mut().insert("hi").unwrap();
                s.current().name().to_string()
            })
            .unwrap();
        assert_eq!(name, "notes");
        assert_eq!(session.current_buffer(), scratch);
        assert_eq!(session.buffer(notes).unwrap().buffer_string_no_properties(), "hi");
    }

    #[test]
    fn test_with_current_buffer_dead_target() {
        let mut session = Session::new();
        let gone = session.get_buffer_create("gone");
        session.kill_buffer(gone);
        assert_eq!(session.with_current_buffer(gone, |_| ()), Err(Error::DeadBuffer));
    }

    #[test]
    fn test_save_excursion_restores_buffer_and_point() {
        let mut session = Session::new();
        session.current_mut().insert("hello").unwrap();
        session.current_mut().goto_char(3);
        let scratch = session.current_buffer();
        let other = session.get_buffer_create("other");
        session.save_excursion(|s| {
            s.current_mut().goto_char(1);
            s.current_mut().insert(">>").unwrap();
            s.set_buffer(other).unwrap();
        });
        assert_eq!(session.current_buffer(), scratch);
        assert_eq!(session.current().point(), 5);
        assert!(session.current().markers().is_empty());
    }

    #[test]
    fn test_set_marker_moves_between_buffers() {
        let mut session = Session::new();
        let a = session.get_buffer_create("a");
        let b = session.get_buffer_create("b");
        session.buffer_mut(a).unwrap().insert("abcdef").unwrap();
        session.buffer_mut(b).unwrap().insert("xy").unwrap();

        let mut m = session.make_marker();
        assert_eq!(session.marker_position(&m), None);
        session.set_marker(&mut m, Some(4), Some(a));
        assert_eq!(session.marker_position(&m), Some(4));
        assert_eq!(session.marker_buffer(&m), Some(a));

        // Clamped to the target's extent, and the old slot is released.
        session.set_marker(&mut m, Some(99), Some(b));
        assert_eq!(session.marker_position(&m), Some(3));
        assert!(session.buffer(a).unwrap().markers().is_empty());

        session.set_marker(&mut m, None, Some(b));
        assert_eq!(session.marker_buffer(&m), None);
        assert!(session.buffer(b).unwrap().markers().is_empty());
    }

    #[test]
    fn test_marker_in_killed_buffer_is_detached() {
        let mut session = Session::new();
        let a = session.get_buffer_create("a");
        session.buffer_mut(a).unwrap().insert("abc").unwrap();
        let mut m = session.make_marker();
        session.set_marker(&mut m, Some(2), Some(a));
        session.kill_buffer(a);
        assert_eq!(session.marker_position(&m), None);
        assert_eq!(session.goto_marker(&m), Err(Error::DetachedMarker));
    }

    #[test]
    fn test_copy_marker_and_insertion_type() {
        let mut session = Session::new();
        session.current_mut().insert("abc").unwrap();
        let here = session.current_buffer();
        let mut m = session.make_marker();
        session.set_marker(&mut m, Some(2), Some(here));
        let copy = session.copy_marker(&m, InsertionType::After);
        assert_eq!(session.marker_position(&copy), Some(2));

        session.current_mut().goto_char(2);
        session.current_mut().insert("_").unwrap();
        assert_eq!(session.marker_position(&m), Some(2));
        assert_eq!(session.marker_position(&copy), Some(3));

        session.set_marker_insertion_type(&mut m, InsertionType::After);
        session.current_mut().goto_char(2);
        session.current_mut().insert("_").unwrap();
        assert_eq!(session.marker_position(&m), Some(3));
        assert_eq!(m.insertion_type(), InsertionType::After);
    }

    #[test]
    fn test_insert_buffer_substring_keeps_properties() {
        let mut session = Session::new();
        let src = session.get_buffer_create("src");
        {
            let b = session.buffer_mut(src).unwrap();
            b.insert("hello world").unwrap();
            b.put_text_property(1, 6, "face", crate::value::Value::sym("bold"))
                .unwrap();
        }
        session.insert_buffer_substring(src, 1, 6).unwrap();
        let cur = session.current();
        assert_eq!(cur.buffer_string_no_properties(), "hello");
        assert_eq!(cur.get_text_property(1, "face"), Some(&crate::value::Value::sym("bold")));
        assert_eq!(cur.point(), 6);
    }

    #[test]
    fn test_compare_across_buffers() {
        let mut session = Session::new();
        let a = session.get_buffer_create("a");
        let b = session.get_buffer_create("b");
        session.buffer_mut(a).unwrap().insert("abc").unwrap();
        session.buffer_mut(b).unwrap().insert("abd").unwrap();
        assert_eq!(session.compare_buffer_substrings(a, 1, 4, b, 1, 4), Ok(-3));
        session.kill_buffer(b);
        assert_eq!(session.compare_buffer_substrings(a, 1, 4, b, 1, 4), Err(Error::DeadBuffer));
    }
}
