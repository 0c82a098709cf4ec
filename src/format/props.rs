//! Text-property provenance for formatted output.
//!
//! Properties on the format string are carried to the output by replaying
//! the directive scan: literal characters advance the output position by
//! one; when a property boundary crosses a directive, the whole output of
//! that directive is taken in. Properties of `%s` arguments are laid over
//! the characters the argument produced.

use crate::text::TextProps;

/// Where one directive's output landed.
#[derive(Clone, Debug, PartialEq)]
pub struct Spec {
    /// Character index of the directive's `%` in the format string.
    pub fbeg: usize,
    /// Output position of the directive's first character, padding included.
    pub start: usize,
    /// Output position of the argument text, after any left padding.
    pub arg_start: usize,
    /// Output position just past the directive.
    pub end: usize,
    /// Properties of the argument, with its length in characters.
    pub arg_props: Option<(TextProps, usize)>,
}

/// Map the format string's properties onto output positions.
///
/// `discarded[i]` is true for format characters that belong to a
/// directive (the `%` through the conversion character).
#[must_use]
pub fn translate_format_props(props: &TextProps, discarded: &[bool], specs: &[Spec]) -> TextProps {
    let mut out = TextProps::new();
    let mut position = 0;
    let mut translated = 0;
    let mut fieldn = 0;

    let mut advance_to = |pos: usize, position: &mut usize, translated: &mut usize| {
        while *position < pos {
            if !discarded.get(*position).copied().unwrap_or(false) {
                *translated += 1;
            } else if let Some(spec) = specs.get(fieldn) {
                if *position >= spec.fbeg && *translated == spec.start {
                    *translated += spec.end - spec.start;
                    fieldn += 1;
                }
            }
            *position += 1;
        }
    };

    for run in props.runs() {
        advance_to(run.start, &mut position, &mut translated);
        let start = translated;
        advance_to(run.end, &mut position, &mut translated);
        if translated > start {
            out.add(start, translated, &run.plist);
        }
    }
    out
}

/// Lay each argument's properties over its output span.
///
/// A run reaching the end of the argument is stretched over trailing
/// padding; runs past the truncation point are dropped or clipped.
pub fn splice_arg_props(out: &mut TextProps, specs: &[Spec]) {
    for spec in specs {
        let Some((props, old_len)) = &spec.arg_props else {
            continue;
        };
        let new_len = spec.end - spec.arg_start;
        for run in props.runs() {
            if run.start >= new_len {
                continue;
            }
            let end = if (run.end == *old_len && new_len > *old_len) || run.end > new_len {
                new_len
            } else {
                run.end
            };
            out.add(spec.arg_start + run.start, spec.arg_start + end, &run.plist);
        }
    }
}
