//! Benchmarks for the drafting and export core.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use postcraft::render::{measure_text, wrap_text, RenderContext, RenderPipeline};
use postcraft::{DraftStore, HistoryManager, Platform, Quality, Slide};

fn sample_slide() -> Slide {
    Slide::new("Ten minute mobility to start the day")
        .with_subheadline("Start your morning right")
        .with_body_text(
            "A short routine you can do before coffee, no equipment needed. \
             Hips, shoulders, and spine in under ten minutes, every day.",
        )
        .with_cta_text("Follow for more")
}

fn bench_wrap_text(c: &mut Criterion) {
    let text = sample_slide().body_text.unwrap();
    c.bench_function("wrap_body_text", |b| {
        b.iter(|| black_box(wrap_text(&text, 920, |t| measure_text(t, 32))))
    });
}

fn bench_render_slide(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_slide");
    for platform in [Platform::Feed, Platform::Story] {
        group.bench_with_input(
            BenchmarkId::new("platform", platform.as_str()),
            &platform,
            |b, &platform| {
                let pipeline = RenderPipeline::default();
                let slide = sample_slide();
                let ctx = RenderContext::standalone(platform, Quality::Standard);
                b.iter(|| black_box(pipeline.render_slide(&slide, &ctx).unwrap()))
            },
        );
    }
    group.finish();
}

fn bench_render_to_png(c: &mut Criterion) {
    let pipeline = RenderPipeline::default();
    let slide = sample_slide();
    let ctx = RenderContext::standalone(Platform::Feed, Quality::Standard);
    let surface = pipeline.render_slide(&slide, &ctx).unwrap();

    c.bench_function("encode_png", |b| b.iter(|| black_box(surface.to_png().unwrap())));
}

fn bench_history_record(c: &mut Criterion) {
    c.bench_function("history_record_10_slides", |b| {
        let mut store = DraftStore::new("fitness");
        for i in 1..10 {
            store.add_slide(Slide::new(format!("Slide {}", i + 1)));
        }
        let mut history = HistoryManager::new();
        history.init_from_state(&store.content());
        history.start_listening();

        let mut i = 0u64;
        b.iter(|| {
            store.set_caption_a(format!("caption {}", i));
            history.record(&store.content());
            i += 1;
        })
    });
}

criterion_group!(
    benches,
    bench_wrap_text,
    bench_render_slide,
    bench_render_to_png,
    bench_history_record,
);

criterion_main!(benches);
