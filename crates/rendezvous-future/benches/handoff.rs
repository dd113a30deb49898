use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rendezvous_future::{CancelToken, Future};
use std::time::Duration;

const MESSAGES: u64 = 100_000;

fn bench_rendezvous(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendezvous");
    group.throughput(Throughput::Elements(MESSAGES));

    group.bench_function("values", |b| {
        b.iter(|| {
            let future = Future::new(&CancelToken::new(), |emitter| {
                for i in 0..MESSAGES {
                    emitter.send(i)?;
                }
                Ok(())
            });

            let mut sum = 0u64;
            for v in &future {
                sum = sum.wrapping_add(v);
            }
            black_box(sum);
        });
    });

    group.bench_function("get", |b| {
        b.iter(|| {
            let future = Future::new(&CancelToken::new(), |emitter| {
                for i in 0..MESSAGES {
                    emitter.send(i)?;
                }
                Ok(())
            });

            while let (Some(v), _) = future.get() {
                black_box(v);
            }
        });
    });

    group.bench_function("send_timeout", |b| {
        b.iter(|| {
            let future = Future::new(&CancelToken::new(), |emitter| {
                for i in 0..MESSAGES {
                    emitter.send_timeout(i, Duration::from_secs(1))?;
                }
                Ok(())
            });

            black_box(future.values().count());
        });
    });

    group.finish();
}

fn bench_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel");

    for taken in [0u64, 1, 100] {
        group.bench_with_input(BenchmarkId::new("after_reads", taken), &taken, |b, &taken| {
            b.iter(|| {
                let future = Future::new(&CancelToken::new(), |emitter| {
                    let mut n = 0u64;
                    loop {
                        emitter.send(n)?;
                        n += 1;
                    }
                });

                for v in future.values().take(taken as usize) {
                    black_box(v);
                }
                future.cancel();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rendezvous, bench_cancel);
criterion_main!(benches);
