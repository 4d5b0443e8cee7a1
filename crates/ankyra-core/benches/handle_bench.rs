use ankyra_core::{Exclusive, Shareable, SharedRef};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

#[derive(Debug)]
struct Payload(u64);

impl Shareable for Payload {}
impl Shareable<Exclusive> for Payload {}

fn bench_handles(c: &mut Criterion) {
    let _ = env_logger::try_init();

    let atomic_root = SharedRef::<Payload>::new(Payload(7));
    let atomic_weak = atomic_root.downgrade();
    let exclusive_root = SharedRef::<Payload, Exclusive>::new(Payload(7));

    let mut group = c.benchmark_group("Handle Operations");

    group.bench_function("clone + drop (Atomic)", |b| {
        b.iter(|| black_box(atomic_root.clone()))
    });

    group.bench_function("clone + drop (Exclusive)", |b| {
        b.iter(|| black_box(exclusive_root.clone()))
    });

    group.bench_function("pin + drop (Atomic)", |b| {
        b.iter(|| black_box(atomic_weak.pin()))
    });

    group.bench_function("deref (Atomic)", |b| b.iter(|| black_box(atomic_root.0)));

    group.bench_function("is_valid (Atomic)", |b| {
        b.iter(|| black_box(atomic_weak.is_valid()))
    });

    group.finish();
}

criterion_group!(benches, bench_handles);
criterion_main!(benches);
