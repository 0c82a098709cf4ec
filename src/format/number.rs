//! Numeric conversions: `d i o x X e f g`.
//!
//! Each number is rendered without padding into a fixed-size [`ConvBuf`];
//! padding and precision beyond what the buffer holds are added as counts
//! and only materialized when the result is copied to the output.

use std::fmt::{self, Write as _};

use crate::error::{Error, Result};
use crate::format::directive::{Directive, Flags};
use crate::format::output::OutBuf;

/// Precision handed to the renderer; anything past it becomes zero fill.
pub const USEFUL_PRECISION_MAX: usize = 1100;

/// Room for the longest rendering: 309 integer digits of `f64::MAX`, a
/// sign, a point and `USEFUL_PRECISION_MAX` fraction digits.
const CONV_BUF_SIZE: usize = 1536;

/// Bound-checked scratch buffer for one conversion.
pub struct ConvBuf {
    buf: [u8; CONV_BUF_SIZE],
    len: usize,
}

impl ConvBuf {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; CONV_BUF_SIZE],
            len: 0,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII is ever written.
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, b: u8) -> fmt::Result {
        *self.buf.get_mut(self.len).ok_or(fmt::Error)? = b;
        self.len += 1;
        Ok(())
    }

    fn push_zeros(&mut self, n: usize) -> fmt::Result {
        (0..n).try_for_each(|_| self.push(b'0'))
    }
}

impl Default for ConvBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for ConvBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len.checked_add(s.len()).ok_or(fmt::Error)?;
        self.buf
            .get_mut(self.len..end)
            .ok_or(fmt::Error)?
            .copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

/// A numeric argument.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// A rendered number and the fill around it.
///
/// Written out as: leading padding, the first `beglen` bytes (sign and
/// radix prefix), leading zeros, the middle, trailing zeros, the last
/// `endlen` bytes (an exponent), trailing padding.
pub struct NumberText {
    conv: ConvBuf,
    beglen: usize,
    endlen: usize,
    leading_zeros: usize,
    trailing_zeros: usize,
    leading_padding: usize,
    trailing_padding: usize,
}

impl NumberText {
    pub fn write_to(&self, out: &mut OutBuf) -> Result<()> {
        let s = self.conv.as_str();
        let mid_end = s.len() - self.endlen;
        out.push_repeat(' ', self.leading_padding)?;
        out.push_str(&s[..self.beglen])?;
        out.push_repeat('0', self.leading_zeros)?;
        out.push_str(&s[self.beglen..mid_end])?;
        out.push_repeat('0', self.trailing_zeros)?;
        out.push_str(&s[mid_end..])?;
        out.push_repeat(' ', self.trailing_padding)
    }
}

fn conv_overflow(_: fmt::Error) -> Error {
    Error::Overflow("Format conversion too long")
}

fn sign_char(negative: bool, flags: Flags) -> Option<char> {
    if negative {
        Some('-')
    } else if flags.contains(Flags::PLUS) {
        Some('+')
    } else if flags.contains(Flags::SPACE) {
        Some(' ')
    } else {
        None
    }
}

/// Digits of `digits` widened with zeros to at least `prec`, following C:
/// a zero value with precision 0 prints nothing.
fn write_min_digits(conv: &mut ConvBuf, digits: &str, prec: Option<usize>) -> fmt::Result {
    match prec {
        Some(0) if digits == "0" => Ok(()),
        Some(p) => {
            conv.push_zeros(p.saturating_sub(digits.len()))?;
            conv.write_str(digits)
        }
        None => conv.write_str(digits),
    }
}

fn write_special(conv: &mut ConvBuf, x: f64) -> fmt::Result {
    conv.write_str(if x.is_nan() { "nan" } else { "inf" })
}

/// `%e` body for a non-negative finite `a`.
fn write_exp(conv: &mut ConvBuf, a: f64, prec: usize, sharp: bool) -> fmt::Result {
    let rendered = format!("{a:.prec$e}");
    let (mantissa, exp) = rendered.split_once('e').unwrap_or((&rendered, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    conv.write_str(mantissa)?;
    if sharp && prec == 0 {
        conv.push(b'.')?;
    }
    let sign = if exp < 0 { '-' } else { '+' };
    write!(conv, "e{sign}{:02}", exp.unsigned_abs())
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// `%g` body for a non-negative finite `a`.
fn write_general(conv: &mut ConvBuf, a: f64, prec: usize, sharp: bool) -> fmt::Result {
    let p = prec.max(1);
    let exp = if a == 0.0 {
        0
    } else {
        let digits = p - 1;
        let probe = format!("{a:.digits$e}");
        probe
            .split_once('e')
            .and_then(|(_, e)| e.parse::<i64>().ok())
            .unwrap_or(0)
    };
    let p_i = i64::try_from(p).unwrap_or(i64::MAX);
    if exp >= -4 && exp < p_i {
        let frac = usize::try_from(p_i - 1 - exp).unwrap_or(0);
        let fixed = format!("{a:.frac$}");
        if sharp {
            conv.write_str(&fixed)?;
            if frac == 0 {
                conv.push(b'.')?;
            }
            Ok(())
        } else {
            conv.write_str(strip_fraction_zeros(&fixed))
        }
    } else {
        let mut scratch = ConvBuf::new();
        write_exp(&mut scratch, a, p - 1, sharp)?;
        let s = scratch.as_str();
        if sharp {
            conv.write_str(s)
        } else {
            let (mantissa, exp) = s.split_at(s.find('e').unwrap_or(s.len()));
            conv.write_str(strip_fraction_zeros(mantissa))?;
            conv.write_str(exp)
        }
    }
}

/// Render `num` for the numeric directive `d`, with field width and
/// excess precision worked out but not yet materialized.
pub fn render(d: &Directive, num: Number) -> Result<NumberText> {
    let flags = d.flags;
    let sharp = flags.contains(Flags::SHARP);
    let prec = d.precision.map(|p| p.min(USEFUL_PRECISION_MAX));
    let excess = match (d.precision, prec) {
        (Some(want), Some(got)) => want - got,
        _ => 0,
    };
    let float_conversion = matches!(d.conversion, 'e' | 'f' | 'g');
    let mut conv = ConvBuf::new();

    match d.conversion {
        'd' | 'i' => match num {
            Number::Int(i) => {
                if let Some(c) = sign_char(i < 0, flags) {
                    conv.write_char(c).map_err(conv_overflow)?;
                }
                let digits = i.unsigned_abs().to_string();
                write_min_digits(&mut conv, &digits, prec).map_err(conv_overflow)?;
            }
            Number::Float(x) => {
                let t = x.trunc();
                let t = if t == 0.0 { 0.0 } else { t };
                if let Some(c) = sign_char(t.is_sign_negative() && !x.is_nan(), flags) {
                    conv.write_char(c).map_err(conv_overflow)?;
                }
                if t.is_finite() {
                    let digits = format!("{:.0}", t.abs());
                    write_min_digits(&mut conv, &digits, prec).map_err(conv_overflow)?;
                } else {
                    write_special(&mut conv, t).map_err(conv_overflow)?;
                }
            }
        },
        'o' | 'x' | 'X' => {
            let (negative, magnitude): (bool, u128) = match num {
                Number::Int(i) => (i < 0, u128::from(i.unsigned_abs())),
                Number::Float(x) => (x <= -1.0, x.abs().trunc() as u128),
            };
            if let Some(c) = sign_char(negative, flags) {
                conv.write_char(c).map_err(conv_overflow)?;
            }
            let digits = match d.conversion {
                'o' => format!("{magnitude:o}"),
                'x' => format!("{magnitude:x}"),
                _ => format!("{magnitude:X}"),
            };
            if sharp && magnitude != 0 && d.conversion != 'o' {
                conv.write_str(if d.conversion == 'x' { "0x" } else { "0X" })
                    .map_err(conv_overflow)?;
            }
            let min = if sharp && d.conversion == 'o' {
                // The alternate octal form always starts with a zero.
                Some(prec.unwrap_or(0).max(digits.len() + usize::from(magnitude != 0)))
            } else {
                prec
            };
            write_min_digits(&mut conv, &digits, min).map_err(conv_overflow)?;
        }
        'e' | 'f' | 'g' => {
            let x = match num {
                Number::Int(i) => i as f64,
                Number::Float(x) => x,
            };
            if let Some(c) = sign_char(x.is_sign_negative(), flags) {
                conv.write_char(c).map_err(conv_overflow)?;
            }
            let a = x.abs();
            let p = prec.unwrap_or(6);
            let written = if !a.is_finite() {
                write_special(&mut conv, a)
            } else {
                match d.conversion {
                    'f' => write!(conv, "{a:.p$}").and_then(|()| {
                        if sharp && p == 0 { conv.push(b'.') } else { Ok(()) }
                    }),
                    'e' => write_exp(&mut conv, a, p, sharp),
                    _ => write_general(&mut conv, a, p, sharp),
                }
            };
            written.map_err(conv_overflow)?;
        }
        other => return Err(Error::Format(format!("Invalid format operation %{other}"))),
    }

    let s = conv.as_bytes();
    let signed = s.first().is_some_and(|b| matches!(b, b'-' | b'+' | b' '));
    let radix_prefix = s.get(usize::from(signed)) == Some(&b'0')
        && matches!(s.get(usize::from(signed) + 1), Some(b'x' | b'X'));
    let beglen = usize::from(signed) + if radix_prefix { 2 } else { 0 };

    let mut leading_zeros = 0;
    let mut trailing_zeros = 0;
    let mut endlen = 0;
    if excess > 0 {
        if float_conversion {
            let ends_in_digit = s.last().is_some_and(u8::is_ascii_digit);
            if ends_in_digit && !(d.conversion == 'g' && !sharp) {
                trailing_zeros = excess;
                if let Some(e) = s.iter().position(|&b| b == b'e') {
                    endlen = s.len() - e;
                }
            }
        } else {
            leading_zeros = excess;
        }
    }

    let numwidth = conv
        .len()
        .checked_add(leading_zeros + trailing_zeros)
        .ok_or(Error::Overflow(crate::format::output::STRING_OVERFLOW))?;
    let mut padding = d.width.saturating_sub(numwidth);
    let zero_fill = flags.contains(Flags::ZERO) && (float_conversion || d.precision.is_none());
    if zero_fill && s.get(beglen).is_some_and(u8::is_ascii_hexdigit) {
        leading_zeros += padding;
        padding = 0;
    }
    let (leading_padding, trailing_padding) = if flags.contains(Flags::MINUS) {
        (0, padding)
    } else {
        (padding, 0)
    };

    Ok(NumberText {
        conv,
        beglen,
        endlen,
        leading_zeros,
        trailing_zeros,
        leading_padding,
        trailing_padding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::directive::parse;

    fn fmt(spec: &str, num: Number) -> String {
        let chars: Vec<char> = spec.chars().collect();
        let d = parse(&chars, 0).unwrap();
        let mut out = OutBuf::new(16, usize::MAX, false);
        render(&d, num).unwrap().write_to(&mut out).unwrap();
        out.into_string()
    }

    #[test]
    fn test_integers() {
        assert_eq!(fmt("%d", Number::Int(-42)), "-42");
        assert_eq!(fmt("%5d", Number::Int(3)), "    3");
        assert_eq!(fmt("%-5d", Number::Int(3)), "3    ");
        assert_eq!(fmt("%05d", Number::Int(-3)), "-0003");
        assert_eq!(fmt("%+d", Number::Int(7)), "+7");
        assert_eq!(fmt("% d", Number::Int(7)), " 7");
        assert_eq!(fmt("%.3d", Number::Int(7)), "007");
        assert_eq!(fmt("%.0d", Number::Int(0)), "");
        assert_eq!(fmt("%06.3d", Number::Int(7)), "   007");
        assert_eq!(fmt("%d", Number::Float(-2.9)), "-2");
        assert_eq!(fmt("%d", Number::Float(-0.5)), "0");
    }

    #[test]
    fn test_radix() {
        assert_eq!(fmt("%x", Number::Int(255)), "ff");
        assert_eq!(fmt("%X", Number::Int(255)), "FF");
        assert_eq!(fmt("%#x", Number::Int(255)), "0xff");
        assert_eq!(fmt("%#x", Number::Int(0)), "0");
        assert_eq!(fmt("%#08x", Number::Int(255)), "0x0000ff");
        assert_eq!(fmt("%o", Number::Int(8)), "10");
        assert_eq!(fmt("%#o", Number::Int(8)), "010");
        assert_eq!(fmt("%#o", Number::Int(0)), "0");
        assert_eq!(fmt("%x", Number::Int(-255)), "-ff");
    }

    #[test]
    fn test_fixed_and_exponent() {
        assert_eq!(fmt("%05.2f", Number::Float(1.5)), "01.50");
        assert_eq!(fmt("%f", Number::Int(2)), "2.000000");
        assert_eq!(fmt("%.0f", Number::Float(2.7)), "3");
        assert_eq!(fmt("%#.0f", Number::Float(3.0)), "3.");
        assert_eq!(fmt("%e", Number::Float(1234.5)), "1.234500e+03");
        assert_eq!(fmt("%.2e", Number::Float(0.000123)), "1.23e-04");
        assert_eq!(fmt("%f", Number::Float(-0.0)), "-0.000000");
    }

    #[test]
    fn test_general() {
        assert_eq!(fmt("%g", Number::Float(100000.0)), "100000");
        assert_eq!(fmt("%g", Number::Float(1_000_000.0)), "1e+06");
        assert_eq!(fmt("%g", Number::Float(0.0001)), "0.0001");
        assert_eq!(fmt("%g", Number::Float(0.00001)), "1e-05");
        assert_eq!(fmt("%g", Number::Float(1.5)), "1.5");
        assert_eq!(fmt("%#g", Number::Float(1.5)), "1.50000");
        assert_eq!(fmt("%.3g", Number::Float(3.14159)), "3.14");
        assert_eq!(fmt("%g", Number::Float(0.0)), "0");
    }

    #[test]
    fn test_special_values_are_not_zero_filled() {
        assert_eq!(fmt("%05f", Number::Float(f64::INFINITY)), "  inf");
        assert_eq!(fmt("%f", Number::Float(f64::NEG_INFINITY)), "-inf");
        assert_eq!(fmt("%f", Number::Float(f64::NAN)), "nan");
    }

    #[test]
    fn test_excess_precision_becomes_zero_fill() {
        let s = fmt("%.1200d", Number::Int(5));
        assert_eq!(s.len(), 1200);
        assert!(s.ends_with("005"));
        let s = fmt("%.1105e", Number::Float(1.0));
        assert!(s.starts_with("1.000"));
        assert!(s.ends_with("0e+00"));
        assert_eq!(s.len(), 2 + 1105 + 4);
    }

    #[test]
    fn test_conv_buf_bounds() {
        let mut conv = ConvBuf::new();
        assert!(conv.write_str(&"9".repeat(CONV_BUF_SIZE)).is_ok());
        assert!(conv.write_str("9").is_err());
        assert_eq!(conv.len(), CONV_BUF_SIZE);
    }
}
