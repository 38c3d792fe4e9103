use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;
use tidyframe::{Capture, ColumnType, ColumnValue, Pipeline, Schema, Table};

fn make_table(rows: usize) -> Table {
    let schema = Schema::new(vec![
        ("group".to_string(), ColumnType::String, false),
        ("value".to_string(), ColumnType::Float64, false),
        ("count".to_string(), ColumnType::Int64, false),
    ]);
    let mut table = Table::new("bench".to_string(), schema);

    let groups = ["alpha", "beta", "gamma", "delta"];
    for i in 0..rows {
        let mut row = HashMap::new();
        row.insert(
            "group".to_string(),
            ColumnValue::String(groups[i % groups.len()].to_string()),
        );
        row.insert("value".to_string(), ColumnValue::Float64((i % 100) as f64));
        row.insert("count".to_string(), ColumnValue::Int64(i as i64));
        table.append_row(row).unwrap();
    }
    table
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [100, 1000, 10000].iter() {
        let table = make_table(*size);
        let predicate = [Capture::parse("value > 50").unwrap()];

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(&table).filter(&predicate).unwrap());
        });
    }
    group.finish();
}

fn bench_mutate(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutate");

    for size in [100, 1000, 10000].iter() {
        let table = make_table(*size);
        let capture = Capture::parse("value / (count + 1)").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(&table).mutate("ratio", &capture).unwrap());
        });
    }
    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by");

    for size in [100, 1000, 10000].iter() {
        let table = make_table(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(&table).group_by(&["group"]).unwrap());
        });
    }
    group.finish();
}

fn bench_grouped_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouped_summarize");

    for size in [100, 1000, 10000].iter() {
        let table = make_table(*size);
        let aggregates = vec![
            ("n".to_string(), Capture::parse("n()").unwrap()),
            ("total".to_string(), Capture::parse("sum(value)").unwrap()),
            ("avg".to_string(), Capture::parse("mean(value)").unwrap()),
        ];

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                black_box(&table)
                    .group_by(&["group"])
                    .unwrap()
                    .summarize(&aggregates)
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");

    for size in [100, 1000, 10000].iter() {
        let table = make_table(*size);
        let pipeline = Pipeline::new()
            .filter(vec![Capture::parse("value > 25").unwrap()])
            .mutate("scaled", Capture::parse("value * 2").unwrap())
            .group_by(&["group"])
            .summarize(vec![("peak", Capture::parse("max(scaled)").unwrap())]);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| pipeline.run(black_box(&table)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_filter,
    bench_mutate,
    bench_group_by,
    bench_grouped_summarize,
    bench_full_pipeline
);
criterion_main!(benches);
