//! Criterion benchmarks for statement building, placeholder translation and a small
//! SQLite round trip through [`Model`].
//!
//! `BENCH_ROWS` controls the bulk insert width (default 100).

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sql_record::prelude::*;
use sql_record::{PlaceholderStyle, translate_placeholders};
use std::hint::black_box;
use tokio::runtime::Runtime;

fn bench_rows() -> usize {
    std::env::var("BENCH_ROWS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100)
}

fn payload(i: usize) -> Record {
    record! {
        "name" => format!("item-{i}"),
        "qty" => i as i64,
        "note" => RowValues::Null,
    }
}

fn builders(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder");
    let single = payload(1);
    group.bench_function("insert", |b| {
        b.iter(|| build_insert(black_box("items"), black_box(&single)));
    });

    let filter = record! { "id" => 7, "deleted_at" => RowValues::Null };
    group.bench_function("update", |b| {
        b.iter(|| build_update("items", black_box(&filter), &single, GlueOperator::And));
    });

    let order = Record::order_by("id", SortOrder::Desc);
    group.bench_function("find", |b| {
        b.iter(|| build_find("items", black_box(&filter), &order, GlueOperator::Or));
    });

    let rows = bench_rows();
    let payloads: Vec<Record> = (0..rows).map(payload).collect();
    group.throughput(Throughput::Elements(rows as u64));
    group.bench_with_input(BenchmarkId::new("bulk_insert", rows), &payloads, |b, p| {
        b.iter(|| build_bulk_insert("items", black_box(p)));
    });
    group.finish();
}

fn translation(c: &mut Criterion) {
    let rows = bench_rows();
    let payloads: Vec<Record> = (0..rows).map(payload).collect();
    let Ok(bulk) = build_bulk_insert("items", &payloads) else {
        return;
    };
    let quoted = "SELECT '?', $$ ? $$ FROM items WHERE a = ? AND b IS ? -- ?\n AND c = ?";

    let mut group = c.benchmark_group("translate");
    group.bench_function("bulk_insert_to_postgres", |b| {
        b.iter(|| translate_placeholders(black_box(bulk.sql()), PlaceholderStyle::Postgres, true));
    });
    group.bench_function("literals_and_comments", |b| {
        b.iter(|| translate_placeholders(black_box(quoted), PlaceholderStyle::Postgres, true));
    });
    group.bench_function("disabled", |b| {
        b.iter(|| translate_placeholders(black_box(bulk.sql()), PlaceholderStyle::Postgres, false));
    });
    group.finish();
}

fn sqlite_round_trip(c: &mut Criterion) {
    let Ok(rt) = Runtime::new() else {
        return;
    };
    let Ok(mut db) = rt.block_on(Database::connect(&ConnectOptions::sqlite(":memory:"))) else {
        return;
    };
    let ddl = "CREATE TABLE items (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, \
               qty INTEGER NOT NULL DEFAULT 0, note TEXT)";
    if rt.block_on(db.execute_batch(ddl)).is_err() {
        return;
    }
    let items = db.model("items");

    let mut group = c.benchmark_group("sqlite");
    group.bench_function("insert_then_first", |b| {
        b.to_async(&rt).iter(|| async {
            let id = items.insert(&payload(1)).await.ok()?;
            items.first(&record! { "id" => id }, GlueOperator::And).await.ok()
        });
    });
    group.finish();
}

criterion_group!(benches, builders, translation, sqlite_round_trip);
criterion_main!(benches);
