//! Dynamic values carried by properties and format arguments.

use std::fmt;

use crate::text::Text;

/// A property or argument value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    T,
    Int(i64),
    Float(f64),
    Symbol(String),
    Str(Text),
    List(Vec<Value>),
    Vector(Vec<Value>),
}

impl Value {
    /// Symbol value.
    #[must_use]
    pub fn sym(name: &str) -> Self {
        Self::Symbol(name.to_string())
    }

    /// String value without properties.
    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::Str(Text::from(s))
    }

    /// Character value (characters are integers).
    #[must_use]
    pub fn char(c: char) -> Self {
        Self::Int(i64::from(u32::from(c)))
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    #[must_use]
    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self, Self::Symbol(s) if s == name)
    }

    /// True when this value is `t` or a list containing the symbol `name`.
    #[must_use]
    pub fn is_t_or_lists(&self, name: &str) -> bool {
        match self {
            Self::T => true,
            Self::List(items) => items.iter().any(|v| v.is_symbol(name)),
            _ => false,
        }
    }

    /// Character code if this is an integer in character range.
    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Int(n) => u32::try_from(*n).ok().and_then(char::from_u32),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Self::Str(t) => Some(t),
            _ => None,
        }
    }

    /// Printed representation without quoting (`princ`).
    #[must_use]
    pub fn princ_to_string(&self) -> String {
        let mut out = String::new();
        self.print(&mut out, false);
        out
    }

    /// Printed representation with quoting (`prin1`).
    #[must_use]
    pub fn prin1_to_string(&self) -> String {
        let mut out = String::new();
        self.print(&mut out, true);
        out
    }

    fn print(&self, out: &mut String, escape: bool) {
        match self {
            Self::Nil => out.push_str("nil"),
            Self::T => out.push('t'),
            Self::Int(n) => out.push_str(&n.to_string()),
            Self::Float(x) => out.push_str(&format_float(*x)),
            Self::Symbol(name) => out.push_str(name),
            Self::Str(text) if escape => {
                out.push('"');
                for c in text.as_str().chars() {
                    if c == '"' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
            }
            Self::Str(text) => out.push_str(text.as_str()),
            Self::List(items) => print_seq(out, items, '(', ')', escape),
            Self::Vector(items) => print_seq(out, items, '[', ']', escape),
        }
    }
}

fn print_seq(out: &mut String, items: &[Value], open: char, close: char, escape: bool) {
    out.push(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        item.print(out, escape);
    }
    out.push(close);
}

/// Shortest round-tripping float text with a mandatory fraction or exponent.
#[must_use]
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return if x.is_sign_negative() {
            "-0.0e+NaN".to_string()
        } else {
            "0.0e+NaN".to_string()
        };
    }
    if x.is_infinite() {
        return if x < 0.0 {
            "-1.0e+INF".to_string()
        } else {
            "1.0e+INF".to_string()
        };
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e21).contains(&magnitude) {
        // Rust writes "1e21"; the printed form wants "1e+21".
        let s = format!("{x:e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        };
    }
    let s = format!("{x}");
    if s.contains('.') { s } else { format!("{s}.0") }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.princ_to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<Text> for Value {
    fn from(t: Text) -> Self {
        Self::Str(t)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        if b { Self::T } else { Self::Nil }
    }
}

/// A property list: ordered `(name, value)` pairs with unique names.
///
/// Equality ignores order, so two runs carrying the same properties compare
/// equal regardless of how they were built.
#[derive(Clone, Debug, Default)]
pub struct Plist {
    entries: Vec<(String, Value)>,
}

impl Plist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs; later duplicates win.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let mut plist = Self::new();
        for (name, value) in pairs {
            plist.put(name, value);
        }
        plist
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Set `name` to `value`; returns true if the plist changed.
    pub fn put(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| key == name) {
            if slot.1 == value {
                return false;
            }
            slot.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
        true
    }

    /// Remove `name`; returns true if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(key, _)| key != name);
        before != self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Add every entry from `other` that is not already present here.
    pub fn merge_missing(&mut self, other: &Self) {
        for (name, value) in other.iter() {
            if self.get(name).is_none() {
                self.entries.push((name.to_string(), value.clone()));
            }
        }
    }
}

impl PartialEq for Plist {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_princ_and_prin1() {
        let v = Value::List(vec![
            Value::sym("a"),
            Value::string("b\"c"),
            Value::Int(3),
            Value::Nil,
        ]);
        assert_eq!(v.princ_to_string(), "(a b\"c 3 nil)");
        assert_eq!(v.prin1_to_string(), "(a \"b\\\"c\" 3 nil)");
        assert_eq!(Value::Vector(vec![Value::T]).prin1_to_string(), "[t]");
    }

    #[test]
    fn test_float_printing() {
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(100.0), "100.0");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(1e21), "1e+21");
        assert_eq!(format_float(1.5e-7), "1.5e-7");
        assert_eq!(format_float(f64::NAN), "0.0e+NaN");
        assert_eq!(format_float(f64::NEG_INFINITY), "-1.0e+INF");
    }

    #[test]
    fn test_plist_equality_ignores_order() {
        let a = Plist::from_pairs([("face", Value::sym("bold")), ("field", Value::sym("x"))]);
        let b = Plist::from_pairs([("field", Value::sym("x")), ("face", Value::sym("bold"))]);
        assert_eq!(a, b);
        let mut c = b.clone();
        assert!(c.put("field", Value::sym("y")));
        assert_ne!(a, c);
        assert!(!c.put("field", Value::sym("y")));
    }

    #[test]
    fn test_plist_remove_and_merge() {
        let mut p = Plist::from_pairs([("a", Value::Int(1))]);
        let q = Plist::from_pairs([("a", Value::Int(9)), ("b", Value::Int(2))]);
        p.merge_missing(&q);
        assert_eq!(p.get("a"), Some(&Value::Int(1)));
        assert_eq!(p.get("b"), Some(&Value::Int(2)));
        assert!(p.remove("a"));
        assert!(!p.remove("a"));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_sticky_lists() {
        assert!(Value::T.is_t_or_lists("field"));
        assert!(Value::List(vec![Value::sym("field")]).is_t_or_lists("field"));
        assert!(!Value::List(vec![Value::sym("face")]).is_t_or_lists("field"));
        assert!(!Value::Nil.is_t_or_lists("field"));
    }
}
