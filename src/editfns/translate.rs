//! Table-driven character translation.

use std::collections::BTreeMap;

use crate::buffer::{Buffer, CompositionCheck};
use crate::error::Result;
use crate::text::Text;
use crate::text::coding::encode_char;

/// What a character translates to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranslationEntry {
    /// One character.
    Single(char),
    /// A sequence of characters.
    Multi(Vec<char>),
    /// Alternatives keyed by the characters starting at this one. Each rule
    /// is `(from, to)` where `from` begins with the key character; the
    /// longest `from` matching the text wins.
    Rules(Vec<(Vec<char>, Vec<char>)>),
}

/// A translation table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranslationTable {
    /// Character `c` maps to `table[c]`; codes past the end are untouched.
    Dense(Vec<char>),
    /// Only listed characters translate.
    Sparse(BTreeMap<char, TranslationEntry>),
}

impl TranslationTable {
    /// Dense table that is the identity except for `pairs`.
    #[must_use]
    pub fn dense_with(size: usize, pairs: &[(char, char)]) -> Self {
        let mut table: Vec<char> = (0..size)
            .map(|i| u32::try_from(i).ok().and_then(char::from_u32).unwrap_or('\u{FFFD}'))
            .collect();
        for &(from, to) in pairs {
            if let Some(slot) = table.get_mut(from as usize) {
                *slot = to;
            }
        }
        Self::Dense(table)
    }

    fn entry(&self, c: char) -> Option<Lookup<'_>> {
        match self {
            Self::Dense(table) => table.get(c as usize).map(|&nc| Lookup::Single(nc)),
            Self::Sparse(map) => map.get(&c).map(|entry| match entry {
                TranslationEntry::Single(nc) => Lookup::Single(*nc),
                TranslationEntry::Multi(chars) => Lookup::Multi(chars),
                TranslationEntry::Rules(rules) => Lookup::Rules(rules),
            }),
        }
    }
}

enum Lookup<'a> {
    Single(char),
    Multi(&'a [char]),
    Rules(&'a [(Vec<char>, Vec<char>)]),
}

impl Buffer {
    /// Longest rule whose source matches the text at `pos`, short of `end`.
    fn match_translation<'r>(
        &self,
        pos: usize,
        end: usize,
        rules: &'r [(Vec<char>, Vec<char>)],
    ) -> Option<&'r (Vec<char>, Vec<char>)> {
        let longest = rules.iter().map(|(from, _)| from.len()).max()?;
        let text: Vec<char> = self
            .substring_raw(pos, end.min(pos + longest))
            .chars()
            .collect();
        rules
            .iter()
            .filter(|(from, _)| !from.is_empty() && text.starts_with(from))
            .max_by_key(|(from, _)| from.len())
    }

    /// Translate `[start, end)` through `table`. Returns the number of
    /// characters changed.
    pub fn translate_region(&mut self, start: usize, end: usize, table: &TranslationTable) -> Result<usize> {
        let (start, end) = self.validate_region(start, end)?;
        let (mut pos, mut end_pos) = self.modify_text(start, end)?;
        let multibyte = self.is_multibyte();
        let mut pos_byte = self.pos_byte(pos);
        let mut count = 0;

        while pos < end_pos {
            let Some((oc, len)) = self.char_at_byte(pos_byte) else {
                break;
            };
            let (from_len, to): (usize, Vec<char>) = match table.entry(oc) {
                Some(Lookup::Single(nc)) if nc != oc => {
                    let mut encoded = Vec::with_capacity(4);
                    encode_char(nc, multibyte, &mut encoded);
                    if encoded.len() == len {
                        self.record_change(pos, 1);
                        self.gap_mut()
                            .contiguous_mut(pos_byte - 1, pos_byte - 1 + len)
                            .copy_from_slice(&encoded);
                        self.signal_after_change(pos, 1, 1)?;
                        self.update_compositions(pos, pos + 1, CompositionCheck::Border);
                    } else {
                        self.replace_range(pos, pos + 1, &Text::from(nc), true, false)?;
                    }
                    count += 1;
                    pos += 1;
                    // Hooks may have moved things; recompute from the position.
                    pos_byte = self.pos_byte(pos);
                    continue;
                }
                Some(Lookup::Multi(chars)) => (1, chars.to_vec()),
                Some(Lookup::Rules(rules)) => match self.match_translation(pos, end_pos, rules) {
                    Some((from, to)) => (from.len(), to.clone()),
                    None => {
                        pos += 1;
                        pos_byte += len;
                        continue;
                    }
                },
                _ => {
                    pos += 1;
                    pos_byte += len;
                    continue;
                }
            };

            let replacement: String = to.iter().collect();
            self.replace_range(pos, pos + from_len, &Text::from(replacement), true, false)?;
            pos += to.len();
            count += to.len();
            end_pos = end_pos + to.len() - from_len;
            pos_byte = self.pos_byte(pos);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::InsertionType;

    fn sparse(entries: Vec<(char, TranslationEntry)>) -> TranslationTable {
        TranslationTable::Sparse(entries.into_iter().collect())
    }

    #[test]
    fn test_dense_table_upcases() {
        let mut buf = Buffer::with_text("t", "abc def");
        let table = TranslationTable::dense_with(128, &[('a', 'A'), ('d', 'D')]);
        assert_eq!(buf.translate_region(1, 8, &table), Ok(2));
        assert_eq!(buf.text_string(), "Abc Def");
    }

    #[test]
    fn test_single_with_length_change() {
        let mut buf = Buffer::with_text("t", "a-b");
        let m = buf.create_marker(3, InsertionType::Before);
        let table = sparse(vec![('-', TranslationEntry::Single('→'))]);
        assert_eq!(buf.translate_region(1, 4, &table), Ok(1));
        assert_eq!(buf.text_string(), "a→b");
        assert_eq!(buf.marker_position(m), Some(3));
        assert_eq!(buf.char_to_byte(3), Ok(5));
    }

    #[test]
    fn test_multi_expands_and_keeps_scanning() {
        let mut buf = Buffer::with_text("t", "straße ß");
        let table = sparse(vec![('ß', TranslationEntry::Multi(vec!['s', 's']))]);
        assert_eq!(buf.translate_region(1, 9, &table), Ok(4));
        assert_eq!(buf.text_string(), "strasse ss");
        assert_eq!(buf.point_max(), 11);
    }

    #[test]
    fn test_rules_prefer_longest_match() {
        let mut buf = Buffer::with_text("t", "aeab");
        let rules = vec![
            (vec!['a'], vec!['A']),
            (vec!['a', 'e'], vec!['æ']),
        ];
        let table = sparse(vec![('a', TranslationEntry::Rules(rules))]);
        assert_eq!(buf.translate_region(1, 5, &table), Ok(2));
        assert_eq!(buf.text_string(), "æAb");
    }

    #[test]
    fn test_rules_without_match_skip() {
        let mut buf = Buffer::with_text("t", "ax");
        let rules = vec![(vec!['a', 'e'], vec!['æ'])];
        let table = sparse(vec![('a', TranslationEntry::Rules(rules))]);
        assert_eq!(buf.translate_region(1, 3, &table), Ok(0));
        assert_eq!(buf.text_string(), "ax");
    }

    #[test]
    fn test_rule_does_not_cross_region_end() {
        let mut buf = Buffer::with_text("t", "aeae");
        let rules = vec![(vec!['a', 'e'], vec!['æ'])];
        let table = sparse(vec![('a', TranslationEntry::Rules(rules))]);
        assert_eq!(buf.translate_region(1, 4, &table), Ok(1));
        assert_eq!(buf.text_string(), "æae");
    }

    #[test]
    fn test_translation_is_undoable() {
        let mut buf = Buffer::with_text("t", "abc");
        let table = TranslationTable::dense_with(128, &[('b', 'B')]);
        buf.translate_region(1, 4, &table).unwrap();
        assert!(buf.undo().unwrap());
        assert_eq!(buf.text_string(), "abc");
    }
}
