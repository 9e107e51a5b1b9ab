//! Benchmarks for audio analysis operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use chroma_morph::audio::synth::{generate_sine, generate_test_beat, generate_white_noise};
use chroma_morph::audio::{
    reduce, AnalyserSettings, AudioFeatureExtractor, FeatureBands, FrequencyAnalyser,
    SyntheticInput,
};

const SAMPLE_RATE: u32 = 44100;

fn bench_analyser_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("Analyser Refresh");

    for fft_size in [512, 1024, 2048, 4096] {
        let samples = generate_sine(1000.0, SAMPLE_RATE, 0.1, 0.5);

        group.throughput(Throughput::Elements(fft_size as u64));
        group.bench_with_input(BenchmarkId::new("refresh", fft_size), &fft_size, |b, &size| {
            let mut analyser = FrequencyAnalyser::new(AnalyserSettings {
                fft_size: size,
                ..Default::default()
            });
            b.iter(|| {
                analyser.push_samples(&samples[..size.min(samples.len())]);
                black_box(analyser.refresh());
            });
        });
    }

    group.finish();
}

fn bench_band_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Band Reduction");

    for spectrum_samples in [16, 64, 256] {
        let bins: Vec<u8> = (0..1024).map(|i| (i % 256) as u8).collect();
        let bands = FeatureBands {
            spectrum_samples,
            ..Default::default()
        };

        group.bench_with_input(
            BenchmarkId::new("reduce", spectrum_samples),
            &bands,
            |b, &bands| {
                b.iter(|| black_box(reduce(&bins, bands)));
            },
        );
    }

    group.finish();
}

fn bench_extractor_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("Feature Extraction");

    let inputs = [
        ("beat", SyntheticInput::test_beat(120.0, SAMPLE_RATE)),
        ("noise", SyntheticInput::noise(0.5, 42, SAMPLE_RATE)),
    ];

    for (name, input) in inputs {
        let mut extractor = AudioFeatureExtractor::with_input(Box::new(input.with_chunk(735)));
        extractor.start();

        group.bench_function(BenchmarkId::new("get_frequency_data", name), |b| {
            b.iter(|| black_box(extractor.get_frequency_data()));
        });
    }

    group.finish();
}

fn bench_synth_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Audio Synthesis");

    group.bench_function("sine_1s", |b| {
        b.iter(|| {
            black_box(generate_sine(440.0, SAMPLE_RATE, 1.0, 1.0));
        });
    });

    group.bench_function("white_noise_1s", |b| {
        b.iter(|| {
            black_box(generate_white_noise(SAMPLE_RATE, 1.0, 1.0, 42));
        });
    });

    group.bench_function("test_beat_2s", |b| {
        b.iter(|| {
            black_box(generate_test_beat(120.0, SAMPLE_RATE, 2.0));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_analyser_refresh,
    bench_band_reduction,
    bench_extractor_poll,
    bench_synth_generation,
);
criterion_main!(benches);
