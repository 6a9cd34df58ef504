//! Criterion benchmarks for snippet compile and evaluate.
//!
//! Run with: `cargo bench -p snippet`
//!
//! Evaluation runs inside the key-event handler, so it is the hot path;
//! compilation only happens on config load.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use snippet::{compile, evaluate, Variables};

const TEMPLATES: &[(&str, &str)] = &[
    ("plain", "git status --short --branch"),
    ("escapes", "\\e[1;32m\\^C\\^Uclear\\r\\n\\t\\\"quoted\\\""),
    ("variables", "cd ${HOME}/projects && ls $PWD/src\\n"),
];

fn environment() -> Variables {
    Variables::new()
        .with("HOME", "/home/user")
        .with("PWD", "/home/user/projects/snipterm")
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for (name, template) in TEMPLATES {
        group.throughput(Throughput::Bytes(template.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), template, |b, t| {
            b.iter(|| compile(black_box(t)))
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let env = environment();
    let mut group = c.benchmark_group("evaluate");
    for (name, template) in TEMPLATES {
        let compiled = match compile(template) {
            Ok(snippet) => snippet,
            Err(e) => panic!("benchmark template {name} must compile: {e}"),
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &compiled, |b, s| {
            b.iter(|| evaluate(black_box(s), black_box(&env)))
        });
    }
    group.finish();
}

fn bench_long_template(c: &mut Criterion) {
    let template = "echo $PWD \\e[0m".repeat(256);
    let compiled = match compile(&template) {
        Ok(snippet) => snippet,
        Err(e) => panic!("long template must compile: {e}"),
    };
    let env = environment();

    c.bench_function("compile_long", |b| b.iter(|| compile(black_box(&template))));
    c.bench_function("evaluate_long", |b| {
        b.iter(|| evaluate(black_box(&compiled), black_box(&env)))
    });
}

criterion_group!(benches, bench_compile, bench_evaluate, bench_long_template);
criterion_main!(benches);
