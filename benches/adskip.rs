use adskip::{
    capture_to_grayscale, correlate, Fingerprint, GrayImage, MatchConfig, MatchEngine,
    MemoryTemplateStore, Rect, TemplateDraft, TemplateStore,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn make_rgba(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.extend_from_slice(&[value as u8, (value / 2) as u8, 255 - value as u8, 255]);
        }
    }
    data
}

fn bench_capture(c: &mut Criterion) {
    let (width, height) = (1280, 720);
    let rgba = make_rgba(width, height);
    c.bench_function("grayscale_720p", |b| {
        b.iter(|| capture_to_grayscale(black_box(&rgba), width, height).unwrap())
    });

    let frame = capture_to_grayscale(&rgba, width, height).unwrap();
    c.bench_function("fingerprint_720p", |b| {
        b.iter(|| Fingerprint::from_view(black_box(frame.view())).unwrap())
    });
}

fn bench_match(c: &mut Criterion) {
    let (width, height) = (1280, 720);
    let frame = capture_to_grayscale(&make_rgba(width, height), width, height).unwrap();

    let mut store = MemoryTemplateStore::new();
    for i in 0..16 {
        let rect = Rect::new(40 * i, 600, 200, 80);
        let draft =
            TemplateDraft::from_frame(frame.view(), "bench.test", Some(rect), 3700).unwrap();
        store.insert(draft).unwrap();
    }
    let engine = MatchEngine::new(MatchConfig {
        threshold: Some(1.0),
        ..MatchConfig::default()
    })
    .unwrap();
    c.bench_function("hash_match_16_templates_no_hit", |b| {
        b.iter(|| {
            engine
                .match_host(&store, black_box(frame.view()), "bench.test")
                .unwrap()
        })
    });

    let search = GrayImage::from_view(frame.view().crop(590, 310, 100, 100).unwrap()).unwrap();
    let tpl = GrayImage::from_view(frame.view().crop(621, 341, 37, 37).unwrap()).unwrap();
    c.bench_function("correlate_37_in_100", |b| {
        b.iter(|| correlate(black_box(tpl.view()), black_box(search.view())))
    });
}

criterion_group!(benches, bench_capture, bench_match);
criterion_main!(benches);
