//! The `format` directive interpreter.
//!
//! A format string is copied to the output with each `%` directive replaced
//! by its rendered argument:
//!
//! ```text
//! %[N$][flags][width][.precision]conversion
//! ```
//!
//! Flags are `-+ #0`; conversions are `d i o x X e f g` for numbers,
//! `c` for characters, `s` (printed without quoting) and `S` (printed with
//! quoting), and `%%` for a literal percent sign. Width and precision of
//! string conversions count display columns, and truncation never splits a
//! grapheme cluster.
//!
//! Formatting first assumes unibyte output and restarts in multibyte mode
//! the first time an argument needs it. Text properties of the format
//! string and of `%s` string arguments are carried to the result.
//!
//! ```
//! use textcore::format::format;
//! use textcore::value::Value;
//!
//! let out = format("%-5d|%.2s", &[Value::Int(3), Value::string("héllo")]).unwrap();
//! assert_eq!(out.as_str(), "3    |hé");
//! ```

mod directive;
mod number;
mod output;
mod props;

pub use directive::{Directive, Flags};
pub use output::STRING_OVERFLOW;

use crate::error::{Error, Result};
use crate::event::debug_log;
use crate::text::{Text, TextProps};
use crate::unicode::width_prefix;
use crate::value::Value;

use number::Number;
use output::OutBuf;
use props::Spec;

/// Largest result `format` produces by default, in bytes.
pub const DEFAULT_MAX_BYTES: usize = i32::MAX as usize;

const INITIAL_CAPACITY: usize = 4000;

/// How grave accents and apostrophes in a format string are rendered by
/// [`format_message`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuotingStyle {
    /// Left as they are.
    #[default]
    Grave,
    /// `` ` `` becomes `‘` and `'` becomes `’`.
    Curve,
    /// `` ` `` becomes `'`.
    Straight,
}

/// Options for one formatting call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    /// Results longer than this many bytes fail with an overflow error.
    pub max_bytes: usize,
    pub quoting: QuotingStyle,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            quoting: QuotingStyle::Grave,
        }
    }
}

/// Format `args` according to `fmt`.
pub fn format(fmt: impl Into<Text>, args: &[Value]) -> Result<Text> {
    format_with(&fmt.into(), args, &FormatOptions::default())
}

/// Like [`format`], translating quote characters of the format string.
pub fn format_message(fmt: impl Into<Text>, args: &[Value], quoting: QuotingStyle) -> Result<Text> {
    let options = FormatOptions {
        quoting,
        ..FormatOptions::default()
    };
    format_with(&fmt.into(), args, &options)
}

/// Format with explicit options.
pub fn format_with(fmt: &Text, args: &[Value], options: &FormatOptions) -> Result<Text> {
    let chars: Vec<char> = fmt.as_str().chars().collect();
    let mut multibyte = fmt.is_multibyte();
    loop {
        match run_pass(fmt, &chars, args, options, multibyte)? {
            Some(text) => return Ok(text),
            None => {
                debug_log(|| format!("format: restarting {:?} in multibyte mode", fmt.as_str()));
                multibyte = true;
            }
        }
    }
}

fn not_enough_args() -> Error {
    Error::Format("Not enough arguments for format string".into())
}

fn type_mismatch() -> Error {
    Error::Format("Format specifier doesn't match argument type".into())
}

/// The text a string conversion prints and the properties it brings.
struct StringArg<'a> {
    text: std::borrow::Cow<'a, str>,
    props: Option<&'a TextProps>,
    multibyte: bool,
}

fn string_arg<'a>(conversion: char, arg: &'a Value) -> Result<StringArg<'a>> {
    let owned = |s: String| StringArg {
        multibyte: !s.is_ascii(),
        text: s.into(),
        props: None,
    };
    Ok(match (conversion, arg) {
        ('S', _) => owned(arg.prin1_to_string()),
        ('s', Value::Str(t)) => StringArg {
            text: t.as_str().into(),
            props: t.has_props().then(|| t.props()),
            multibyte: t.is_multibyte(),
        },
        ('s', Value::Symbol(name)) => StringArg {
            text: name.as_str().into(),
            props: None,
            multibyte: !name.is_ascii(),
        },
        ('s', _) => owned(arg.princ_to_string()),
        (_, _) => owned(arg.as_char().ok_or_else(type_mismatch)?.to_string()),
    })
}

/// One pass over the format string. `Ok(None)` asks for a multibyte restart.
fn run_pass(
    fmt: &Text,
    chars: &[char],
    args: &[Value],
    options: &FormatOptions,
    multibyte: bool,
) -> Result<Option<Text>> {
    let mut out = OutBuf::new(INITIAL_CAPACITY.min(options.max_bytes), options.max_bytes, multibyte);
    let mut discarded = vec![false; chars.len()];
    let mut specs: Vec<Spec> = Vec::new();
    let mut next_arg = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '%' {
            let c = match (c, options.quoting) {
                ('`', QuotingStyle::Curve) => '‘',
                ('\'', QuotingStyle::Curve) => '’',
                ('`', QuotingStyle::Straight) => '\'',
                _ => c,
            };
            if !multibyte && u32::from(c) > 0xFF {
                return Ok(None);
            }
            out.push_char(c)?;
            i += 1;
            continue;
        }

        let d = directive::parse(chars, i)?;
        if d.is_literal_percent() {
            discarded[i..i + d.len - 1].fill(true);
            out.push_char('%')?;
            i += d.len;
            continue;
        }
        discarded[i..i + d.len].fill(true);

        if let Some(field) = d.field {
            next_arg = field - 1;
        }
        let arg = args.get(next_arg).ok_or_else(not_enough_args)?;
        next_arg += 1;

        let start = out.nchars();
        let spec = match d.conversion {
            's' | 'S' | 'c' => {
                let s = string_arg(d.conversion, arg)?;
                if s.multibyte && !multibyte {
                    return Ok(None);
                }
                let prefix = match d.precision {
                    Some(0) => width_prefix("", None),
                    precision => width_prefix(&s.text, precision),
                };
                let padding = d.width.saturating_sub(prefix.width);
                let left = !d.flags.contains(Flags::MINUS);
                if left {
                    out.push_repeat(' ', padding)?;
                }
                let arg_start = out.nchars();
                out.push_str(&s.text[..prefix.bytes])?;
                if !left {
                    out.push_repeat(' ', padding)?;
                }
                let arg_len = s.text.chars().count();
                Spec {
                    fbeg: i,
                    start,
                    arg_start,
                    end: out.nchars(),
                    arg_props: s.props.map(|p| (p.clone(), arg_len)),
                }
            }
            _ => {
                let num = match arg {
                    Value::Int(n) => Number::Int(*n),
                    Value::Float(x) => Number::Float(*x),
                    _ => return Err(type_mismatch()),
                };
                number::render(&d, num)?.write_to(&mut out)?;
                Spec {
                    fbeg: i,
                    start,
                    arg_start: start,
                    end: out.nchars(),
                    arg_props: None,
                }
            }
        };
        specs.push(spec);
        i += d.len;
    }

    let has_arg_props = specs.iter().any(|s| s.arg_props.is_some());
    let mut result_props = if fmt.has_props() {
        props::translate_format_props(fmt.props(), &discarded, &specs)
    } else {
        TextProps::new()
    };
    if has_arg_props {
        props::splice_arg_props(&mut result_props, &specs);
    }
    Ok(Some(Text::from_parts(out.into_string(), multibyte, result_props)))
}
