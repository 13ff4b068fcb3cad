use std::sync::Arc;

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use logstream::prelude::*;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

/// Build an exhausting source holding `count` messages; every tenth has an empty key
fn generate_source(count: usize) -> Arc<MemorySource> {
    let source = MemorySource::new().exhausting();
    for i in 0..count {
        let key = if i % 10 == 0 { String::new() } else { format!("id-{i}") };
        source.push(key, format!("event number {i}"));
    }
    Arc::new(source)
}

/// Benchmark end-to-end throughput for different worker pool sizes
fn bench_worker_pool_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_pool_sizes");
    let runtime = Runtime::new().unwrap();

    for workers in [1usize, 4, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.to_async(&runtime).iter_batched(
                || generate_source(10_000),
                |source| async move {
                    let sink = Arc::new(MemorySink::new());
                    let processor = StreamProcessor::new(source, sink.clone())
                        .with_max_workers(workers)
                        .with_error_policy(SilentSkip);
                    processor.start(CancellationToken::new()).await.unwrap();
                    black_box(processor.stats());
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark the cost of envelope decoding versus plain text
fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let plain = RawMessage::new("1", "connection reset by peer", Offset::new(0, 0));
    let envelope = RawMessage::new(
        "1",
        r#"{"id":"1","level":"warn","message":"connection reset by peer","timestamp":"2024-05-01T12:00:00Z"}"#,
        Offset::new(0, 0),
    );

    group.bench_function("plain_text", |b| b.iter(|| black_box(normalize(&plain))));
    group.bench_function("producer_envelope", |b| {
        b.iter(|| black_box(normalize(&envelope)))
    });

    group.finish();
}

/// Benchmark snapshot serialization of a populated sink
fn bench_snapshot(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let sink = MemorySink::new();
    runtime.block_on(async {
        for i in 0..10_000 {
            sink.store(&LogRecord::new(format!("id-{i}"), format!("event {i}")))
                .await
                .unwrap();
        }
    });

    c.bench_function("snapshot_10k", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut output = Vec::new();
            sink.snapshot(&mut output).await.unwrap();
            black_box(output);
        })
    });
}

criterion_group!(benches, bench_worker_pool_sizes, bench_normalize, bench_snapshot);
criterion_main!(benches);
