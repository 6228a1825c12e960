//! Hub dispatch benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tickbook_bench::price_update_frame;
use tickbook_hub::{HubBuilder, InboundMessage, WILDCARD};
use tickbook_transport::memory_connector;

fn benchmark_frame_decode(c: &mut Criterion) {
    let frame = price_update_frame("ETH");

    c.bench_function("inbound_decode", |b| {
        b.iter(|| InboundMessage::from_json(black_box(&frame)))
    });

    let message = InboundMessage::from_json(&frame).unwrap();
    c.bench_function("tick_extract", |b| b.iter(|| black_box(&message).tick()));
}

fn benchmark_dispatch_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let message = InboundMessage::from_json(&price_update_frame("ETH")).unwrap();

    for subscribers in [1usize, 16, 256] {
        let (connector, _listener) = memory_connector();
        let (_driver, hub) = HubBuilder::new(connector).build();
        let hits = Arc::new(AtomicU64::new(0));

        for i in 0..subscribers {
            let hits = Arc::clone(&hits);
            // Every fourth subscriber listens to everything.
            let symbol = if i % 4 == 3 { WILDCARD } else { "ETH" };
            hub.subscribe(symbol, move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }
        // Noise on other symbols.
        for i in 0..subscribers {
            hub.subscribe(format!("TOKEN{i}"), |_| {});
        }

        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &message,
            |b, message| b.iter(|| hub.dispatch(black_box(message))),
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_frame_decode, benchmark_dispatch_fanout);
criterion_main!(benches);
