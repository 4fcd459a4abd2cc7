//! Benchmarks for the per-row hot path: column classification, value
//! synthesis and batch planning.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use sqlseed_core::classify::{classify_text_column, TextKind};
use sqlseed_core::generate::batch::plan_batches;
use sqlseed_core::generate::synth::ValueSynthesizer;
use sqlseed_core::schema::types::TypeCategory;

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify/text_column");

    // "email" matches early, "description" near the end, "sku" falls through.
    let cases = [
        ("early_match", "email"),
        ("late_match", "description"),
        ("camel_case", "billingAddress"),
        ("no_match", "sku"),
    ];

    for (label, name) in cases {
        group.bench_with_input(BenchmarkId::new("name", label), &name, |b, name| {
            b.iter(|| classify_text_column(name));
        });
    }
    group.finish();
}

fn bench_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("synth/text");
    group.throughput(Throughput::Elements(1));

    for kind in [
        TextKind::FullName,
        TextKind::Email,
        TextKind::Address,
        TextKind::Message,
        TextKind::Word,
    ] {
        let mut synth = ValueSynthesizer::new(Some(42));
        group.bench_with_input(
            BenchmarkId::new("kind", format!("{:?}", kind)),
            &kind,
            |b, &kind| {
                b.iter(|| synth.text(kind, Some(100)));
            },
        );
    }
    group.finish();
}

fn bench_typed(c: &mut Criterion) {
    let mut group = c.benchmark_group("synth/typed");

    for category in [
        TypeCategory::Integer,
        TypeCategory::Decimal,
        TypeCategory::Timestamp,
        TypeCategory::Uuid,
        TypeCategory::Json,
    ] {
        let mut synth = ValueSynthesizer::new(Some(42));
        group.bench_with_input(
            BenchmarkId::new("category", format!("{:?}", category)),
            &category,
            |b, &category| {
                b.iter(|| synth.typed(category));
            },
        );
    }
    group.finish();
}

fn bench_plan_batches(c: &mut Criterion) {
    c.bench_function("batch/plan_sql_server_ceiling", |b| {
        b.iter(|| {
            for columns in 1..40 {
                let _ = plan_batches("t", columns, 100_000, 2100);
            }
        });
    });
}

criterion_group!(
    benches,
    bench_classify,
    bench_text,
    bench_typed,
    bench_plan_batches
);
criterion_main!(benches);
