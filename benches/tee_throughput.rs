//! Tee writer benchmarks
//!
//! Cost of duplicating console output into the run log:
//! - Line-sized writes (typical `writeln!` progress output)
//! - Bulk writes (dumped tables)
//!
//! Toyota Way: Measure before optimizing (Genchi Genbutsu)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::{self, Write};
use trueno_lab::TeeWriter;

/// Benchmark many short lines through the tee
fn bench_line_writes(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let mut group = c.benchmark_group("tee_line_writes");

    for lines in &[100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(*lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), lines, |b, &lines| {
            let mut tee = TeeWriter::open(io::sink(), dir.path().join("lines.log")).unwrap();
            b.iter(|| {
                for step in 0..lines {
                    writeln!(tee, "step {step}: loss={:.4}", black_box(0.5)).unwrap();
                }
            });
        });
    }

    group.finish();
}

/// Benchmark single large writes through the tee
fn bench_bulk_writes(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let mut group = c.benchmark_group("tee_bulk_writes");

    for size in &[4 * 1024usize, 64 * 1024, 1024 * 1024] {
        let payload = vec![b'x'; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            let mut tee = TeeWriter::open(io::sink(), dir.path().join("bulk.log")).unwrap();
            b.iter(|| tee.write_all(black_box(payload)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_line_writes, bench_bulk_writes);
criterion_main!(benches);
