//! Scoring pipeline benchmarks
//!
//! Measures the per-request overhead of preprocessing, calibration and
//! reconciliation using the lexicon adapters (no model weights needed).
//!
//! Run with: cargo bench -p reviewlens-classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;

use reviewlens_classifiers::sentiment::{preprocess, score_distribution};
use reviewlens_classifiers::{
    Distribution, LexiconSarcasmAdapter, LexiconSentimentAdapter, ScoringPipeline,
};

fn benchmark_preprocess(c: &mut Criterion) {
    let text = "I don't think this is worth it. Never again, nothing about it works and nobody answers.";

    c.bench_function("preprocess/negation_heavy", |b| {
        b.iter(|| preprocess(black_box(text)))
    });
}

fn benchmark_score_distribution(c: &mut Criterion) {
    c.bench_function("score_distribution/negative_boost", |b| {
        b.iter(|| {
            let dist = Distribution::new(vec![0.7, 0.2, 0.1]);
            score_distribution(black_box("never_again"), dist).unwrap()
        })
    });
}

fn benchmark_lexicon_pipeline(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let pipeline = ScoringPipeline::new(
        Arc::new(LexiconSentimentAdapter::new().expect("Failed to create sentiment lexicon")),
        Arc::new(LexiconSarcasmAdapter::new().expect("Failed to create sarcasm lexicon")),
    );

    let test_cases = vec![
        ("short_positive", "Great product! Exactly what I needed."),
        ("short_negative", "Not worth the money."),
        ("sarcastic", "Oh great, it broke on day one. Just what I needed."),
        (
            "long_mixed",
            "The packaging was lovely and delivery was fast, but the device is useless. \
             Support told me to wait, then wait again. Thanks a lot. I want a refund, \
             though the screen itself is honestly excellent and I would like to keep it.",
        ),
    ];

    let mut group = c.benchmark_group("Lexicon_Pipeline");
    group.sample_size(100);

    for (name, text) in test_cases {
        group.bench_with_input(BenchmarkId::new("run", name), &text, |b, text| {
            b.iter(|| rt.block_on(async { pipeline.run(black_box(text)).await.unwrap() }));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_preprocess,
    benchmark_score_distribution,
    benchmark_lexicon_pipeline
);
criterion_main!(benches);
