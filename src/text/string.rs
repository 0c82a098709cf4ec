//! Strings with a multibyte flag and text properties.

use std::fmt;

use crate::text::props::TextProps;
use crate::value::{Plist, Value};

/// A string as the buffer core sees it.
///
/// Unibyte strings hold only characters up to `U+00FF`, one per byte.
/// Property positions are 0-based character offsets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Text {
    s: String,
    multibyte: bool,
    props: TextProps,
}

impl Text {
    /// Multibyte text.
    #[must_use]
    pub fn multibyte(s: &str) -> Self {
        Self {
            s: s.to_string(),
            multibyte: true,
            props: TextProps::new(),
        }
    }

    /// Unibyte text. Characters above `U+00FF` are kept but will be stored
    /// by their low byte if inserted into a unibyte buffer.
    #[must_use]
    pub fn unibyte(s: &str) -> Self {
        Self {
            s: s.to_string(),
            multibyte: false,
            props: TextProps::new(),
        }
    }

    pub(crate) fn from_parts(s: String, multibyte: bool, props: TextProps) -> Self {
        Self { s, multibyte, props }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.s
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.s
    }

    #[must_use]
    pub fn is_multibyte(&self) -> bool {
        self.multibyte
    }

    /// Length in characters.
    #[must_use]
    pub fn chars_len(&self) -> usize {
        self.s.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    #[must_use]
    pub fn props(&self) -> &TextProps {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut TextProps {
        &mut self.props
    }

    #[must_use]
    pub fn has_props(&self) -> bool {
        !self.props.is_empty()
    }

    /// Builder: put `name` = `value` over the whole string.
    #[must_use]
    pub fn propertize(mut self, name: &str, value: Value) -> Self {
        let len = self.chars_len();
        self.props.put(0, len, name, &value);
        self
    }

    /// Put `name` = `value` over characters `[start, end)`.
    pub fn put_text_property(&mut self, start: usize, end: usize, name: &str, value: Value) {
        let end = end.min(self.chars_len());
        self.props.put(start, end, name, &value);
    }

    /// Add `props` over characters `[start, end)`.
    pub fn add_text_properties(&mut self, start: usize, end: usize, props: &Plist) {
        let end = end.min(self.chars_len());
        self.props.add(start, end, props);
    }

    #[must_use]
    pub fn get_text_property(&self, pos: usize, name: &str) -> Option<&Value> {
        self.props.get(pos, name)
    }

    /// Characters `[start, end)` with their properties.
    #[must_use]
    pub fn substring(&self, start: usize, end: usize) -> Self {
        let s: String = self.s.chars().skip(start).take(end.saturating_sub(start)).collect();
        Self {
            multibyte: self.multibyte,
            props: self.props.slice(start, end),
            s,
        }
    }

    /// Same characters, no properties.
    #[must_use]
    pub fn without_props(&self) -> Self {
        Self {
            s: self.s.clone(),
            multibyte: self.multibyte,
            props: TextProps::new(),
        }
    }
}

impl From<&str> for Text {
    /// ASCII strings are unibyte; anything else is multibyte.
    fn from(s: &str) -> Self {
        Self {
            s: s.to_string(),
            multibyte: !s.is_ascii(),
            props: TextProps::new(),
        }
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        let multibyte = !s.is_ascii();
        Self {
            s,
            multibyte,
            props: TextProps::new(),
        }
    }
}

impl From<char> for Text {
    fn from(c: char) -> Self {
        Self {
            s: c.to_string(),
            multibyte: !c.is_ascii(),
            props: TextProps::new(),
        }
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.s)
    }
}

impl PartialEq<&str> for Text {
    fn eq(&self, other: &&str) -> bool {
        self.s == *other
    }
}
