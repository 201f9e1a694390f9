#[macro_use]
extern crate criterion;

extern crate ifrec;

use criterion::Criterion;

use ifrec::data::{RawId, RawInteraction};
use ifrec::datasets::{Movielens, MovielensVariant};

fn synthetic_records(n: usize) -> Vec<RawInteraction> {
    (0..n)
        .map(|idx| RawInteraction {
            user: (idx % 943) as RawId,
            item: (idx / 943) as RawId,
            rating: (idx % 5 + 1) as f32,
            timestamp: idx,
        })
        .collect()
}

fn bench_preparation(c: &mut Criterion) {
    c.bench_function("prepare_100k", |b| {
        let records = synthetic_records(100_000);

        b.iter(|| Movielens::from_records(MovielensVariant::Ml100K, 4.0, &records))
    });
}

criterion_group!{
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_preparation
}
criterion_main!(benches);
