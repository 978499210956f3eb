use criterion::{black_box, criterion_group, criterion_main, Criterion};

use neurograph::{
    ConstantRate, FeedForward, Features, Logistic, NetworkFunction, Trainer, UniformWeights,
};

fn build_16_32_8() -> FeedForward<Logistic> {
    let mut w = UniformWeights::seeded(-0.05, 0.05, 0).unwrap();
    FeedForward::with_layers(
        &[16, 32, 8],
        || w.sample(),
        Features::BIAS,
        Logistic::default(),
    )
    .unwrap()
}

fn forward_bench(c: &mut Criterion) {
    let ff = build_16_32_8();
    let mut f: NetworkFunction<'_, Logistic> = ff.function().unwrap();
    let input = vec![0.1_f64; 16];

    c.bench_function("forward_16_32_8", |b| {
        b.iter(|| {
            let out = f.call(black_box(&input)).unwrap();
            black_box(out);
        })
    });
}

fn train_one_bench(c: &mut Criterion) {
    let mut ff = build_16_32_8();
    let mut trainer: Trainer = ff.training();
    let mut criterion = ConstantRate::new(0.0, 0.001);
    let input = vec![0.1_f64; 16];
    let target = vec![0.5_f64; 8];

    c.bench_function("train_one_16_32_8", |b| {
        b.iter(|| {
            let err = trainer
                .train_one(
                    ff.topology_mut(),
                    black_box(&input),
                    black_box(&target),
                    &mut criterion,
                )
                .unwrap();
            black_box(err);
        })
    });
}

criterion_group!(benches, forward_bench, train_one_bench);
criterion_main!(benches);
