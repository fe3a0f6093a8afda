//! # Flowstate Performance Benchmarks
//!
//! Benchmarks for the hot paths of a `recommend` call.
//!
//! ## Benchmark Categories
//!
//! - **Key Scoring**: Key normalization and wheel compatibility
//! - **Factor Scoring**: One candidate through every default factor
//! - **Recommendation**: Full pipeline over synthetic corpora
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark group
//! cargo bench key_scoring
//! cargo bench recommendation
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use flowstate::camelot;
use flowstate::corpus::Corpus;
use flowstate::engine::RecommendationEngine;
use flowstate::factors::default_factors;
use flowstate::recommendation::Direction;
use flowstate::track::{GrooveStyle, Intensity, Track, Vibe};
use std::hint::black_box;

const KEYS: [&str; 8] = ["8A", "9A", "7A", "8B", "Am", "C", "F#m", "Bb"];

/// Helper function to create a deterministic corpus spread over tempo, key and energy
fn create_test_tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| Track {
            bpm: 118.0 + (i % 16) as f64 * 0.5,
            key: Some(KEYS[i % KEYS.len()].to_string()),
            energy: (i % 10) as u8 + 1,
            danceability: ((i * 3) % 10) as u8 + 1,
            vibe: Vibe::ALL[i % Vibe::ALL.len()],
            intensity: Intensity::ALL[i % Intensity::ALL.len()],
            groove_style: GrooveStyle::ALL[i % GrooveStyle::ALL.len()],
            genre: ["House", "Techno", "Deep House"][i % 3].to_string(),
            ..Track::new(format!("track{i:05}"), format!("Track {i:05}"), format!("Artist {}", i / 20))
        })
        .collect()
}

/// Benchmark key normalization and compatibility
fn benchmark_key_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_scoring");

    group.bench_function("to_wheel_notation", |b| {
        b.iter(|| {
            for key in KEYS {
                black_box(camelot::to_wheel_notation(black_box(key)));
            }
        })
    });

    group.bench_function("compatibility_score", |b| {
        b.iter(|| camelot::compatibility_score(black_box("F#m"), black_box("12A")))
    });

    group.bench_function("compatible_keys_extended", |b| {
        b.iter(|| camelot::compatible_keys(black_box("8A"), black_box(true)))
    });

    group.finish();
}

/// Benchmark every default factor against one candidate
fn benchmark_factor_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("factor_scoring");

    let tracks = create_test_tracks(2);
    let factors = default_factors();

    group.bench_function("all_factors_one_candidate", |b| {
        b.iter(|| {
            factors
                .iter()
                .map(|f| f.score(black_box(&tracks[0]), black_box(&tracks[1]), Direction::Up).weighted_score)
                .sum::<f64>()
        })
    });

    group.finish();
}

/// Benchmark the full pipeline at several corpus sizes
fn benchmark_recommendation(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommendation");

    for size in [100, 1000, 5000].iter() {
        let corpus = Corpus::new(create_test_tracks(*size));
        let current = corpus.tracks()[0].clone();

        group.bench_with_input(BenchmarkId::new("recommend", size), &corpus, |b, corpus| {
            b.iter_batched(
                || RecommendationEngine::with_defaults(corpus),
                |mut engine| engine.recommend(black_box(&current)),
                BatchSize::SmallInput,
            )
        });
    }

    let corpus = Corpus::new(create_test_tracks(1000));
    let current = corpus.tracks()[0].clone();
    group.bench_function("hard_filter_1000_tracks", |b| {
        let engine = RecommendationEngine::with_defaults(&corpus);
        b.iter(|| engine.hard_filter(black_box(&current)).len())
    });

    group.finish();
}

// Group all benchmarks
criterion_group!(
    benches,
    benchmark_key_scoring,
    benchmark_factor_scoring,
    benchmark_recommendation
);

criterion_main!(benches);
