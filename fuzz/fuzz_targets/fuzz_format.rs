//! Fuzz target for the format engine.
//!
//! Arbitrary format strings against a fixed mix of arguments must either
//! produce text or return an error, never panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use textcore::{FormatOptions, Text, Value, format::format_with};

#[derive(Arbitrary, Debug)]
enum Arg {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Symbol(String),
}

impl Arg {
    fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Int(i),
            Self::Float(x) => Value::Float(x),
            Self::Str(s) => Value::string(&s),
            Self::Char(c) => Value::char(c),
            Self::Symbol(s) => Value::sym(&s),
        }
    }
}

#[derive(Arbitrary, Debug)]
struct FormatInput {
    fmt: String,
    args: Vec<Arg>,
}

fuzz_target!(|input: FormatInput| {
    let args: Vec<Value> = input.args.into_iter().take(16).map(Arg::into_value).collect();
    // Keep huge widths from allocating for real.
    let options = FormatOptions {
        max_bytes: 1 << 16,
        ..FormatOptions::default()
    };
    let _ = format_with(&Text::from(input.fmt.as_str()), &args, &options);
});
