use ::std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use ngram_trie::{load_model, Model, ModelLoader};

const TOY_ARPA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../tests/data/toy.arpa");

const CONTEXTS: &[&[&str]] = &[
    &[],
    &["que"],
    &["é", "que"],
    &["Para", "é"],
    &["havia", "é"],
    &["<s>", "para"],
    // unknown words
    &["dixit", "xyzzy"],
    // longer than the model order
    &["já", "havia", "é", "que"],
];

fn benchmark_predict(c: &mut Criterion) {
    let model = load_model(TOY_ARPA, None).unwrap();
    let mut group = c.benchmark_group("Predict");

    group.bench_function("top one", |bencher| {
        bencher.iter(|| {
            CONTEXTS.iter().for_each(|context| {
                black_box(model.predict(context, 1));
            });
        });
    });

    group.bench_function("top ten", |bencher| {
        bencher.iter(|| {
            CONTEXTS.iter().for_each(|context| {
                black_box(model.predict(context, 10));
            });
        });
    });

    let predictor = model.predictor();
    group.bench_function("scored top ten", |bencher| {
        bencher.iter(|| {
            CONTEXTS.iter().for_each(|context| {
                black_box(predictor.predict_scored(context, 10));
            });
        });
    });

    group.bench_function("batch top ten", |bencher| {
        bencher.iter(|| black_box(model.predict_batch(CONTEXTS, 10)));
    });
    group.finish();
}

fn benchmark_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("Model load");
    group.sample_size(10);

    let text = ::std::fs::read_to_string(TOY_ARPA).unwrap();
    group.bench_function("from str", |bencher| {
        bencher.iter(|| black_box(Model::from_arpa_str(&text, None).unwrap()));
    });
    group.bench_function("bigrams from file", |bencher| {
        let loader = ModelLoader::new().max_order(2);
        bencher.iter(|| black_box(loader.load_path(TOY_ARPA).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, benchmark_predict, benchmark_load,);
criterion_main!(benches);
