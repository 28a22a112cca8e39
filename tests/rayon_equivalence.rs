#![cfg(feature = "rayon")]

use adskip::lowlevel::{Kernel, NccRayon, NccScalar, TemplatePlan};
use adskip::{
    CorrelationConfig, GrayImage, MatchConfig, MatchEngine, MatchStrategy, MemoryTemplateStore,
    TemplateDraft, TemplateStore,
};

fn make_image(width: usize, height: usize) -> GrayImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push((((x * 11) ^ (y * 3) ^ (x * y)) & 0xFF) as u8);
        }
    }
    GrayImage::new(data, width, height).unwrap()
}

#[test]
fn parallel_scan_matches_scalar() {
    let search = make_image(90, 70);
    for (x0, y0, w, h) in [(10, 12, 16, 9), (0, 0, 90, 70), (60, 50, 30, 20)] {
        let tpl = search.view().crop(x0, y0, w, h).unwrap();
        let plan = TemplatePlan::from_view(tpl).unwrap();
        let scalar = NccScalar::scan_full(search.view(), &plan);
        let parallel = NccRayon::scan_full(search.view(), &plan);
        assert_eq!(scalar, parallel);
    }
}

#[test]
fn ties_resolve_identically() {
    let search = GrayImage::filled(40, 30, 77).unwrap();
    let tpl = GrayImage::filled(5, 5, 77).unwrap();
    let plan = TemplatePlan::from_view(tpl.view()).unwrap();
    assert_eq!(
        NccScalar::scan_full(search.view(), &plan),
        NccRayon::scan_full(search.view(), &plan)
    );
}

#[test]
fn engine_parallel_flag_changes_nothing_observable() {
    let frame = make_image(120, 120);
    let crop = frame.view().crop(40, 45, 20, 20).unwrap();
    let mut store = MemoryTemplateStore::new();
    let image = GrayImage::from_view(crop).unwrap();
    let draft = TemplateDraft::new("a.test", image, None, 900).unwrap();
    store.insert(draft).unwrap();

    let results: Vec<_> = [false, true]
        .into_iter()
        .map(|parallel| {
            let engine = MatchEngine::new(MatchConfig {
                strategy: MatchStrategy::Correlation,
                correlation: CorrelationConfig {
                    search_window: None,
                    parallel,
                },
                ..MatchConfig::default()
            })
            .unwrap();
            engine.match_host(&store, frame.view(), "a.test").unwrap()
        })
        .collect();
    assert_eq!(results[0], results[1]);
    assert!(results[0].matched);
}
