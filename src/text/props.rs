//! Text-property runs.
//!
//! Properties are kept as sorted, non-overlapping runs over character
//! positions. Characters outside every run have no properties. Adjacent
//! runs with equal property lists are merged after each change, so run
//! boundaries are exactly the places where some property changes.

use crate::value::{Plist, Value};

/// A run of characters `[start, end)` sharing one property list.
#[derive(Clone, Debug, PartialEq)]
pub struct PropRun {
    pub start: usize,
    pub end: usize,
    pub plist: Plist,
}

/// Property runs over one string or buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextProps {
    runs: Vec<PropRun>,
}

impl TextProps {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn runs(&self) -> impl Iterator<Item = &PropRun> {
        self.runs.iter()
    }

    fn run_index(&self, pos: usize) -> Result<usize, usize> {
        self.runs.binary_search_by(|run| {
            if run.end <= pos {
                std::cmp::Ordering::Less
            } else if run.start > pos {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
    }

    /// Properties of the character at `pos`.
    #[must_use]
    pub fn plist_at(&self, pos: usize) -> Option<&Plist> {
        self.run_index(pos).ok().map(|i| &self.runs[i].plist)
    }

    /// Value of `name` on the character at `pos`.
    #[must_use]
    pub fn get(&self, pos: usize, name: &str) -> Option<&Value> {
        self.plist_at(pos).and_then(|plist| plist.get(name))
    }

    fn split_at(&mut self, pos: usize) {
        if let Ok(i) = self.run_index(pos) {
            let run = &mut self.runs[i];
            if run.start < pos {
                let tail = PropRun {
                    start: pos,
                    end: run.end,
                    plist: run.plist.clone(),
                };
                run.end = pos;
                self.runs.insert(i + 1, tail);
            }
        }
    }

    fn normalize(&mut self) {
        let mut out: Vec<PropRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.plist.is_empty() || run.start >= run.end {
                continue;
            }
            if let Some(last) = out.last_mut() {
                if last.end == run.start && last.plist == run.plist {
                    last.end = run.end;
                    continue;
                }
            }
            out.push(run);
        }
        self.runs = out;
    }

    /// Apply `f` to the property list of every character in `[start, end)`.
    /// Returns true if any list changed.
    fn modify<F>(&mut self, start: usize, end: usize, mut f: F) -> bool
    where
        F: FnMut(&mut Plist) -> bool,
    {
        if start >= end {
            return false;
        }
        self.split_at(start);
        self.split_at(end);

        let mut changed = false;
        let mut out = Vec::with_capacity(self.runs.len() + 2);
        let mut cursor = start;
        for mut run in std::mem::take(&mut self.runs) {
            if run.end <= start {
                out.push(run);
                continue;
            }
            if run.start >= end {
                if cursor < end {
                    out.push(fresh_run(cursor, end, &mut f, &mut changed));
                    cursor = end;
                }
                out.push(run);
                continue;
            }
            if run.start > cursor {
                out.push(fresh_run(cursor, run.start, &mut f, &mut changed));
            }
            changed |= f(&mut run.plist);
            cursor = run.end;
            out.push(run);
        }
        if cursor < end {
            out.push(fresh_run(cursor, end, &mut f, &mut changed));
        }
        self.runs = out;
        self.normalize();
        changed
    }

    /// Set `name` to `value` over `[start, end)`.
    pub fn put(&mut self, start: usize, end: usize, name: &str, value: &Value) -> bool {
        self.modify(start, end, |plist| plist.put(name, value.clone()))
    }

    /// Add every property of `props` over `[start, end)`.
    pub fn add(&mut self, start: usize, end: usize, props: &Plist) -> bool {
        self.modify(start, end, |plist| {
            props
                .iter()
                .fold(false, |acc, (name, value)| plist.put(name, value.clone()) || acc)
        })
    }

    /// Replace the properties of `[start, end)` with `props`.
    pub fn set(&mut self, start: usize, end: usize, props: &Plist) -> bool {
        self.modify(start, end, |plist| {
            if *plist == *props {
                false
            } else {
                *plist = props.clone();
                true
            }
        })
    }

    /// Remove the named properties from `[start, end)`.
    pub fn remove(&mut self, start: usize, end: usize, names: &[&str]) -> bool {
        self.modify(start, end, |plist| {
            names.iter().fold(false, |acc, name| plist.remove(name) || acc)
        })
    }

    /// First run boundary after `pos`.
    #[must_use]
    pub fn next_change(&self, pos: usize) -> Option<usize> {
        match self.run_index(pos) {
            Ok(i) => Some(self.runs[i].end),
            Err(i) => self.runs.get(i).map(|run| run.start),
        }
    }

    /// Last run boundary before `pos`.
    #[must_use]
    pub fn previous_change(&self, pos: usize) -> Option<usize> {
        if pos == 0 {
            return None;
        }
        match self.run_index(pos - 1) {
            Ok(i) => Some(self.runs[i].start),
            Err(0) => None,
            Err(i) => Some(self.runs[i - 1].end),
        }
    }

    /// First position after `pos` where `name` differs from its value at
    /// `pos`, or `limit` if none comes first.
    #[must_use]
    pub fn next_single_change(&self, pos: usize, name: &str, limit: usize) -> usize {
        let initial = self.get(pos, name);
        let mut p = pos;
        while let Some(b) = self.next_change(p) {
            if b >= limit {
                break;
            }
            if self.get(b, name) != initial {
                return b;
            }
            p = b;
        }
        limit
    }

    /// Last position before `pos` where `name` of the preceding character
    /// differs from its value before `pos`, or `limit`.
    #[must_use]
    pub fn previous_single_change(&self, pos: usize, name: &str, limit: usize) -> usize {
        if pos <= limit {
            return limit;
        }
        let initial = self.get(pos - 1, name);
        let mut p = pos;
        while let Some(b) = self.previous_change(p) {
            if b <= limit {
                break;
            }
            if self.get(b - 1, name) != initial {
                return b;
            }
            p = b;
        }
        limit
    }

    /// True if every character in `[start, end)` has a non-nil `name`.
    #[must_use]
    pub fn all_non_nil(&self, start: usize, end: usize, name: &str) -> bool {
        let mut pos = start;
        while pos < end {
            match self.run_index(pos) {
                Ok(i) if self.runs[i].plist.get(name).is_some_and(|v| !v.is_nil()) => {
                    pos = self.runs[i].end;
                }
                _ => return false,
            }
        }
        true
    }

    /// First position in `[start, end)` whose character has a non-nil `name`.
    #[must_use]
    pub fn any_non_nil(&self, start: usize, end: usize, name: &str) -> Option<usize> {
        self.runs
            .iter()
            .filter(|run| run.end > start && run.start < end)
            .find(|run| run.plist.get(name).is_some_and(|v| !v.is_nil()))
            .map(|run| run.start.max(start))
    }

    /// Open a hole of `n` characters at `pos`; later runs move right.
    pub fn shift_for_insert(&mut self, pos: usize, n: usize) {
        if n == 0 {
            return;
        }
        self.split_at(pos);
        for run in &mut self.runs {
            if run.start >= pos {
                run.start += n;
                run.end += n;
            }
        }
    }

    /// Remove `[start, end)`; later runs move left.
    pub fn shift_for_delete(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        self.split_at(start);
        self.split_at(end);
        let n = end - start;
        self.runs.retain(|run| run.end <= start || run.start >= end);
        for run in &mut self.runs {
            if run.start >= end {
                run.start -= n;
                run.end -= n;
            }
        }
        self.normalize();
    }

    /// Copy of the runs inside `[start, end)`, rebased to start at 0.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let runs = self
            .runs
            .iter()
            .filter(|run| run.end > start && run.start < end)
            .map(|run| PropRun {
                start: run.start.max(start) - start,
                end: run.end.min(end) - start,
                plist: run.plist.clone(),
            })
            .collect();
        Self { runs }
    }

    /// Lay `other`'s runs over this set, offset by `at`.
    pub fn graft(&mut self, other: &Self, at: usize) {
        for run in &other.runs {
            self.set(run.start + at, run.end + at, &run.plist);
        }
    }

    /// Same runs, every position moved by `delta` (which must not underflow).
    #[must_use]
    pub fn offset(&self, delta: isize) -> Self {
        let runs = self
            .runs
            .iter()
            .map(|run| PropRun {
                start: run.start.saturating_add_signed(delta),
                end: run.end.saturating_add_signed(delta),
                plist: run.plist.clone(),
            })
            .collect();
        Self { runs }
    }
}

fn fresh_run<F>(start: usize, end: usize, f: &mut F, changed: &mut bool) -> PropRun
where
    F: FnMut(&mut Plist) -> bool,
{
    let mut plist = Plist::new();
    *changed |= f(&mut plist);
    PropRun { start, end, plist }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Value {
        Value::sym(s)
    }

    #[test]
    fn test_put_and_get() {
        let mut props = TextProps::new();
        assert!(props.put(2, 5, "face", &sym("bold")));
        assert_eq!(props.get(1, "face"), None);
        assert_eq!(props.get(2, "face"), Some(&sym("bold")));
        assert_eq!(props.get(4, "face"), Some(&sym("bold")));
        assert_eq!(props.get(5, "face"), None);
        assert!(!props.put(3, 4, "face", &sym("bold")));
    }

    #[test]
    fn test_adjacent_equal_runs_merge() {
        let mut props = TextProps::new();
        props.put(1, 3, "field", &sym("a"));
        props.put(3, 6, "field", &sym("a"));
        assert_eq!(props.runs().count(), 1);
        props.put(4, 5, "face", &sym("x"));
        assert_eq!(props.runs().count(), 3);
        props.remove(1, 10, &["face"]);
        assert_eq!(props.runs().count(), 1);
    }

    #[test]
    fn test_single_changes() {
        let mut props = TextProps::new();
        props.put(1, 5, "field", &sym("a"));
        props.put(5, 6, "field", &sym("boundary"));
        props.put(6, 10, "field", &sym("b"));
        props.put(2, 3, "face", &sym("x"));
        assert_eq!(props.next_single_change(1, "field", 10), 5);
        assert_eq!(props.next_single_change(6, "field", 10), 10);
        assert_eq!(props.previous_single_change(5, "field", 1), 1);
        assert_eq!(props.previous_single_change(6, "field", 1), 5);
        assert_eq!(props.previous_single_change(9, "field", 1), 6);
    }

    #[test]
    fn test_insert_and_delete_shift() {
        let mut props = TextProps::new();
        props.put(3, 6, "face", &sym("x"));
        props.shift_for_insert(4, 2);
        assert_eq!(props.get(3, "face"), Some(&sym("x")));
        assert_eq!(props.get(4, "face"), None);
        assert_eq!(props.get(5, "face"), None);
        assert_eq!(props.get(6, "face"), Some(&sym("x")));
        assert_eq!(props.get(7, "face"), Some(&sym("x")));
        props.shift_for_delete(4, 6);
        assert_eq!(props.runs().count(), 1);
        assert_eq!(props.next_change(3), Some(6));
    }

    #[test]
    fn test_slice_and_graft() {
        let mut props = TextProps::new();
        props.put(2, 4, "face", &sym("x"));
        let piece = props.slice(3, 6);
        assert_eq!(piece.get(0, "face"), Some(&sym("x")));
        assert_eq!(piece.get(1, "face"), None);
        let mut other = TextProps::new();
        other.graft(&piece, 10);
        assert_eq!(other.get(10, "face"), Some(&sym("x")));
        assert_eq!(other.get(11, "face"), None);
    }

    #[test]
    fn test_all_non_nil() {
        let mut props = TextProps::new();
        props.put(1, 4, "fontified", &Value::T);
        assert!(props.all_non_nil(1, 4, "fontified"));
        assert!(!props.all_non_nil(1, 5, "fontified"));
        assert_eq!(props.any_non_nil(0, 10, "fontified"), Some(1));
    }
}
