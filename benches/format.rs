//! Format engine benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use textcore::{Text, Value, format};

fn numeric(c: &mut Criterion) {
    let args = [Value::Int(-12345), Value::Float(3.14159), Value::Int(255)];

    c.bench_function("format_numbers", |b| {
        b.iter(|| format(black_box("%08d %.3f %#x"), black_box(&args)))
    });

    c.bench_function("format_wide_precision", |b| {
        b.iter(|| format(black_box("%.2000f"), black_box(&[Value::Float(1.0)])))
    });
}

fn strings(c: &mut Criterion) {
    let ascii = [Value::string("hello"), Value::sym("world")];
    c.bench_function("format_ascii_strings", |b| {
        b.iter(|| format(black_box("%-10s|%10s"), black_box(&ascii)))
    });

    // Forces the multibyte restart.
    let wide = [Value::string("漢字かな"), Value::Int(7)];
    c.bench_function("format_multibyte_restart", |b| {
        b.iter(|| format(black_box("[%6s] %d"), black_box(&wide)))
    });

    let arg = Text::from("prop").propertize("face", Value::sym("bold"));
    let fmt = Text::from("<%s> and <%5s>").propertize("face", Value::sym("outer"));
    let args = [Value::Str(arg.clone()), Value::Str(arg)];
    c.bench_function("format_with_properties", |b| {
        b.iter(|| format(black_box(fmt.clone()), black_box(&args)))
    });
}

criterion_group!(benches, numeric, strings);
criterion_main!(benches);
