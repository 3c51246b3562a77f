use criterion::{criterion_group, criterion_main, Criterion};
use image::imageops::crop_imm;
use image::{GrayImage, Luma, Rgb, RgbImage};
use pcbcheck::kernel::zncc_score_map;
use pcbcheck::prep::prepare_for_match;
use pcbcheck::{
    Correlator, GlobalConfig, ImageView, Inspector, Rect, RoiDefinition, ScaleRange, TemplatePlan,
    Workspace,
};
use std::hint::black_box;

fn make_image(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        Luma([(((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF) as u8])
    })
}

fn make_board(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v = (((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF) as u8;
        Rgb([v, v, v])
    })
}

fn bench_correlator(c: &mut Criterion) {
    let gray = make_image(320, 240);
    let search = prepare_for_match(&gray, true).image;
    let tpl_gray = crop_imm(&gray, 100, 80, 64, 48).to_image();
    let tpl = prepare_for_match(&tpl_gray, true).image;

    let image_view = ImageView::from_gray(&search).unwrap();
    let tpl_view = ImageView::from_gray(&tpl).unwrap();
    let plan = TemplatePlan::from_view(tpl_view).unwrap();
    c.bench_function("zncc_score_map_320x240_64x48", |b| {
        b.iter(|| black_box(zncc_score_map(image_view, &plan).unwrap()));
    });

    let correlator = Correlator::new(true);
    c.bench_function("locate_multiscale_default_range", |b| {
        b.iter(|| {
            black_box(
                correlator
                    .locate_multiscale(&search, &tpl_gray, &ScaleRange::default())
                    .unwrap(),
            )
        });
    });

    if cfg!(feature = "rayon") {
        let correlator_par = Correlator::new(true).with_parallel(true);
        c.bench_function("locate_parallel", |b| {
            b.iter(|| black_box(correlator_par.locate(&search, &tpl).unwrap()));
        });
    }
}

fn bench_inspection(c: &mut Criterion) {
    let golden = make_board(640, 480);
    let test = make_board(640, 480);
    let rois: Vec<RoiDefinition> = (0..6)
        .map(|i| RoiDefinition::new(i + 1, Rect::new(40 + 90 * i as i32, 120, 60, 50)))
        .collect();
    let dir = tempfile::tempdir().unwrap();
    let workspace = Workspace::new(dir.path());

    let inspector = Inspector::new(GlobalConfig::default());
    c.bench_function("inspect_6_rois_640x480", |b| {
        b.iter(|| black_box(inspector.inspect(&golden, &test, &rois, &workspace).unwrap()));
    });

    if cfg!(feature = "rayon") {
        let inspector_par = Inspector::new(GlobalConfig {
            parallel: true,
            ..GlobalConfig::default()
        });
        c.bench_function("inspect_6_rois_640x480_parallel", |b| {
            b.iter(|| black_box(inspector_par.inspect(&golden, &test, &rois, &workspace).unwrap()));
        });
    }
}

criterion_group!(benches, bench_correlator, bench_inspection);
criterion_main!(benches);
