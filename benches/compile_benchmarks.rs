//! Benchmarks for the Water front end and compiler.
//!
//! - `parse`: lexing and parsing only
//! - `compile`: parse plus all compiler passes and class serialization
//! - `stress`: generated sources with many functions and classes
//!
//! Build with `profile-with-puffin` to record pass timings through the
//! `profiling` scopes:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- compile
//! ```

use std::fmt::Write;
use std::hint::black_box;

use bumpalo::Bump;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use water_classfile::Classpath;
use water_compiler::{OptimizationConfig, Pipeline, SourceFile};
use water_parser::Parser;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

const SCRIPTS: [(&str, &str); 4] = [
    ("hello", include_str!("../test_scripts/hello.wtr")),
    ("fizzbuzz", include_str!("../test_scripts/fizzbuzz.wtr")),
    ("shapes", include_str!("../test_scripts/shapes.wtr")),
    ("exceptions", include_str!("../test_scripts/exceptions.wtr")),
];

/// Parse and compile `sources` as one compilation; returns the number of
/// class file bytes produced.
fn compile(sources: &[(&str, &str)]) -> usize {
    let arena = Bump::new();
    let programs: Vec<_> = sources
        .iter()
        .map(|(_, source)| *Parser::parse(source, &arena).expect("benchmark source parses"))
        .collect();
    let names: Vec<String> = sources.iter().map(|(name, _)| format!("{name}.wtr")).collect();
    let files: Vec<_> = names
        .iter()
        .zip(&programs)
        .map(|(name, program)| SourceFile { name, program: *program })
        .collect();
    let output = Pipeline::new(Classpath::new(), OptimizationConfig::default())
        .compile(&files)
        .expect("benchmark source compiles");
    end_profiling_frame();
    output.iter().flatten().map(|class| class.bytes.len()).sum()
}

/// A file with `count` classes and as many global functions using them.
fn stress_source(count: usize) -> String {
    let mut source = String::from("package stress;\n\n");
    for i in 0..count {
        let _ = writeln!(
            source,
            "class Item{i} {{\n    var value = {i};\n    function scaled(factor: int) -> int {{\n        return value * factor + {i};\n    }}\n}}\n"
        );
        let _ = writeln!(
            source,
            "function total{i}(n: int) -> long {{\n    var sum: long = 0;\n    for (var k = 0; k < n; k++) {{\n        sum += new Item{i}().scaled(k);\n    }}\n    return sum;\n}}\n"
        );
    }
    source
}

fn parse_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, source) in SCRIPTS {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let arena = Bump::new();
                let program = Parser::parse(black_box(source), &arena).expect("parses");
                black_box(program.decls.len())
            });
        });
    }
    group.finish();
}

fn compile_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("compile");
    for script in SCRIPTS {
        group.throughput(Throughput::Bytes(script.1.len() as u64));
        group.bench_function(script.0, |b| b.iter(|| black_box(compile(&[script]))));
    }
    group.bench_function("all_scripts", |b| b.iter(|| black_box(compile(&SCRIPTS))));
    group.finish();
}

fn stress_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("stress");
    group.sample_size(20);
    for count in [10, 100, 500] {
        let source = stress_source(count);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(format!("{count}_classes"), |b| {
            b.iter(|| black_box(compile(&[("stress", source.as_str())])))
        });
    }
    group.finish();
}

criterion_group!(benches, parse_benchmarks, compile_benchmarks, stress_benchmarks);
criterion_main!(benches);
