use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use scan_normalize::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn unfiltered() -> SheetSpec {
    SheetSpec {
        filters_enabled: false,
        ..Default::default()
    }
}

fn gradient(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn solid(width: u32, height: u32, value: u8) -> GrayImage {
    ImageBuffer::from_pixel(width, height, Luma([value]))
}

fn save(dir: &Path, name: &str, image: DynamicImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

fn args(dir: &Path, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|n| dir.join(n).to_string_lossy().into_owned())
        .collect()
}

fn positional(spec: &SheetSpec, args: &[String]) -> Positional {
    Positional::partition(args, spec.input_pages, spec.output_pages).unwrap()
}

#[test]
fn test_no_op_is_bit_identical() {
    let dir = TempDir::new().unwrap();
    let source = gradient(31, 17);
    save(dir.path(), "in.png", DynamicImage::ImageRgb8(source.clone()));

    let spec = unfiltered();
    let args = args(dir.path(), &["in.png", "out.png"]);
    let report = run_blocking(&spec, &positional(&spec, &args)).unwrap();

    assert_eq!(report.written, vec![dir.path().join("out.png")]);
    let output = image::open(dir.path().join("out.png")).unwrap();
    assert_eq!(output.as_rgb8().unwrap(), &source);
}

#[tokio::test]
async fn test_split_double_layout() {
    let dir = TempDir::new().unwrap();
    let source = gradient(20, 8);
    save(dir.path(), "sheet.png", DynamicImage::ImageRgb8(source.clone()));

    let spec = SheetSpec {
        layout: Layout::Double,
        output_pages: 2,
        ..unfiltered()
    };
    let args = args(dir.path(), &["sheet.png", "left.png", "right.png"]);
    let report = run(&spec, &positional(&spec, &args)).await.unwrap();
    assert_eq!(report.written.len(), 2);

    let left = image::open(dir.path().join("left.png")).unwrap().into_rgb8();
    let right = image::open(dir.path().join("right.png")).unwrap().into_rgb8();
    assert_eq!(left.dimensions(), (10, 8));
    assert_eq!(right.dimensions(), (10, 8));

    for y in 0..8 {
        for x in 0..10 {
            assert_eq!(left.get_pixel(x, y), source.get_pixel(x, y));
            assert_eq!(right.get_pixel(x, y), source.get_pixel(x + 10, y));
        }
    }
}

#[tokio::test]
async fn test_join_two_inputs() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "a.png", DynamicImage::ImageLuma8(solid(3, 4, 10)));
    save(dir.path(), "b.png", DynamicImage::ImageLuma8(solid(5, 4, 200)));

    let spec = SheetSpec {
        input_pages: 2,
        ..unfiltered()
    };
    let args = args(dir.path(), &["a.png", "b.png", "joined.png"]);
    let report = run(&spec, &positional(&spec, &args)).await.unwrap();
    assert_eq!(report.written.len(), 1);

    let joined = image::open(dir.path().join("joined.png")).unwrap().into_luma8();
    assert_eq!(joined.dimensions(), (8, 4));
    assert_eq!(joined.get_pixel(2, 0)[0], 10);
    assert_eq!(joined.get_pixel(3, 0)[0], 200);
    assert_eq!(joined.get_pixel(7, 3)[0], 200);
}

#[test]
fn test_wildcard_enumeration() {
    let dir = TempDir::new().unwrap();
    for i in 1..=3 {
        save(
            dir.path(),
            &format!("scan{:02}.png", i),
            DynamicImage::ImageLuma8(solid(4, 4, i as u8)),
        );
    }

    let spec = unfiltered();
    let args = args(dir.path(), &["scan%02d.png", "page%03d.png"]);
    let report = run_blocking(&spec, &positional(&spec, &args)).unwrap();
    assert_eq!(report.sheets, vec![1, 2, 3]);

    let mut names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("page"))
        .collect();
    names.sort();
    assert_eq!(names, vec!["page001.png", "page002.png", "page003.png"]);

    let second = image::open(dir.path().join("page002.png")).unwrap().into_luma8();
    assert_eq!(second.get_pixel(0, 0)[0], 2);
}

#[test]
fn test_overwrite_refused_leaves_file() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "in.png", DynamicImage::ImageLuma8(solid(4, 4, 0)));
    std::fs::write(dir.path().join("out.png"), b"").unwrap();

    let spec = unfiltered();
    let args = args(dir.path(), &["in.png", "out.png"]);
    let result = run_blocking(&spec, &positional(&spec, &args));

    match result {
        Err(ScanError::DestinationExists { sheet, path }) => {
            assert_eq!(sheet, 1);
            assert_eq!(path, dir.path().join("out.png"));
        }
        other => panic!("Expected DestinationExists error, got {:?}", other),
    }
    assert_eq!(std::fs::metadata(dir.path().join("out.png")).unwrap().len(), 0);
}

#[test]
fn test_overwrite_permitted() {
    let dir = TempDir::new().unwrap();
    let source = gradient(6, 6);
    save(dir.path(), "in.png", DynamicImage::ImageRgb8(source.clone()));
    std::fs::write(dir.path().join("out.png"), b"stale").unwrap();

    let spec = SheetSpec {
        overwrite: true,
        ..unfiltered()
    };
    let args = args(dir.path(), &["in.png", "out.png"]);
    run_blocking(&spec, &positional(&spec, &args)).unwrap();

    let output = image::open(dir.path().join("out.png")).unwrap();
    assert_eq!(output.as_rgb8().unwrap(), &source);
}

#[test]
fn test_failure_stops_later_sheets() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "in01.png", DynamicImage::ImageLuma8(solid(4, 4, 0)));
    std::fs::write(dir.path().join("in02.png"), b"not an image").unwrap();
    save(dir.path(), "in03.png", DynamicImage::ImageLuma8(solid(4, 4, 0)));

    let spec = unfiltered();
    let args = args(dir.path(), &["in%02d.png", "out%02d.png"]);
    let err = run_blocking(&spec, &positional(&spec, &args)).unwrap_err();

    match &err {
        ScanError::Sheet { sheet, .. } => assert_eq!(*sheet, 2),
        other => panic!("Expected error for sheet 2, got {:?}", other),
    }
    assert!(matches!(err.root(), ScanError::Decode { .. }));
    assert!(dir.path().join("out01.png").exists());
    assert!(!dir.path().join("out02.png").exists());
    assert!(!dir.path().join("out03.png").exists());
}

#[test]
fn test_negative_pre_shift_exposes_background() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "in.png", DynamicImage::ImageLuma8(solid(10, 10, 0)));

    let mut spec = unfiltered();
    spec.geometry.pre_shift = Some("-3,-2".parse().unwrap());
    let args = args(dir.path(), &["in.png", "out.png"]);
    run_blocking(&spec, &positional(&spec, &args)).unwrap();

    let out = image::open(dir.path().join("out.png")).unwrap().into_luma8();
    assert_eq!(out.dimensions(), (10, 10));
    assert_eq!(out.get_pixel(0, 0)[0], 0);
    assert_eq!(out.get_pixel(6, 7)[0], 0);
    assert_eq!(out.get_pixel(7, 0)[0], 255);
    assert_eq!(out.get_pixel(0, 8)[0], 255);
}

#[test]
fn test_sheet_size_crop_and_background() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "in.png", DynamicImage::ImageLuma8(solid(20, 6, 100)));

    let mut spec = unfiltered();
    spec.geometry.sheet_size = Some("10,10".parse().unwrap());
    spec.geometry.background = Background::BLACK;
    let args = args(dir.path(), &["in.png", "out.png"]);
    run_blocking(&spec, &positional(&spec, &args)).unwrap();

    let out = image::open(dir.path().join("out.png")).unwrap().into_luma8();
    assert_eq!(out.dimensions(), (10, 10));
    // padded rows above and below
    assert_eq!(out.get_pixel(5, 0)[0], 0);
    assert_eq!(out.get_pixel(5, 5)[0], 100);
    assert_eq!(out.get_pixel(5, 9)[0], 0);
}

#[test]
fn test_size_and_stretch_targets() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "in.png", DynamicImage::ImageLuma8(solid(40, 20, 50)));

    let mut spec = unfiltered();
    spec.geometry.size = Some("1in,1in".parse().unwrap());
    spec.geometry.interpolation = Interpolation::Nearest;
    spec.dpi = 30;
    let args_fit = args(dir.path(), &["in.png", "fit.png"]);
    run_blocking(&spec, &positional(&spec, &args_fit)).unwrap();

    let fit = image::open(dir.path().join("fit.png")).unwrap().into_luma8();
    assert_eq!(fit.dimensions(), (30, 30));
    assert_eq!(fit.get_pixel(15, 0)[0], 255);
    assert_eq!(fit.get_pixel(15, 15)[0], 50);

    spec.geometry.size = None;
    spec.geometry.stretch = Some("15,45".parse().unwrap());
    let args_stretch = args(dir.path(), &["in.png", "stretch.png"]);
    run_blocking(&spec, &positional(&spec, &args_stretch)).unwrap();

    let stretched = image::open(dir.path().join("stretch.png")).unwrap().into_luma8();
    assert_eq!(stretched.dimensions(), (15, 45));
    assert_eq!(stretched.get_pixel(7, 0)[0], 50);
}

#[test]
fn test_inserted_blank_copies_size() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "a.png", DynamicImage::ImageLuma8(solid(4, 6, 0)));

    let spec = SheetSpec {
        input_pages: 2,
        insert_blank: Some(MultiIndex::parse("2").unwrap()),
        ..unfiltered()
    };
    // one input and one output per sheet on the command line
    let args = args(dir.path(), &["a.png", "out.png"]);
    let positional = Positional::partition(&args, 1, 1).unwrap();
    run_blocking(&spec, &positional).unwrap();

    let out = image::open(dir.path().join("out.png")).unwrap().into_luma8();
    assert_eq!(out.dimensions(), (8, 6));
    assert_eq!(out.get_pixel(0, 0)[0], 0);
    assert_eq!(out.get_pixel(7, 5)[0], 255);
}

#[test]
fn test_filters_respect_no_processing() {
    let dir = TempDir::new().unwrap();
    let mut speckled = solid(20, 20, 255);
    speckled.put_pixel(10, 10, Luma([0]));
    save(dir.path(), "in01.png", DynamicImage::ImageLuma8(speckled.clone()));
    save(dir.path(), "in02.png", DynamicImage::ImageLuma8(speckled));

    let spec = SheetSpec {
        no_processing: Some(MultiIndex::parse("2").unwrap()),
        ..Default::default()
    };
    let args = args(dir.path(), &["in%02d.png", "out%02d.png"]);
    run_blocking(&spec, &positional(&spec, &args)).unwrap();

    let cleaned = image::open(dir.path().join("out01.png")).unwrap().into_luma8();
    let untouched = image::open(dir.path().join("out02.png")).unwrap().into_luma8();
    assert_eq!(cleaned.get_pixel(10, 10)[0], 255);
    assert_eq!(untouched.get_pixel(10, 10)[0], 0);
}

#[tokio::test]
async fn test_custom_filter() {
    struct Invert;

    impl PageFilter for Invert {
        fn apply(&self, mut page: PageBuffer, _config: &FilterConfig) -> Result<PageBuffer> {
            page.image.invert();
            Ok(page)
        }
    }

    let dir = TempDir::new().unwrap();
    save(dir.path(), "in.png", DynamicImage::ImageLuma8(solid(2, 2, 0)));

    let spec = SheetSpec::default();
    let args = args(dir.path(), &["in.png", "out.png"]);
    run_with_filter(&spec, &positional(&spec, &args), Invert)
        .await
        .unwrap();

    let out = image::open(dir.path().join("out.png")).unwrap().into_luma8();
    assert_eq!(out.get_pixel(0, 0)[0], 255);
}

#[test]
fn test_split_outputs_follow_page_widths() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "wide.png", DynamicImage::ImageLuma8(solid(6, 4, 10)));
    save(dir.path(), "narrow.png", DynamicImage::ImageLuma8(solid(2, 4, 200)));

    let spec = SheetSpec {
        input_pages: 2,
        output_pages: 2,
        ..unfiltered()
    };
    let args = args(dir.path(), &["wide.png", "narrow.png", "o1.png", "o2.png"]);
    run_blocking(&spec, &positional(&spec, &args)).unwrap();

    let first = image::open(dir.path().join("o1.png")).unwrap().into_luma8();
    let second = image::open(dir.path().join("o2.png")).unwrap().into_luma8();
    assert_eq!(first.dimensions(), (6, 4));
    assert_eq!(second.dimensions(), (2, 4));
    assert!(first.pixels().all(|p| p[0] == 10));
    assert!(second.pixels().all(|p| p[0] == 200));
}

#[test]
fn test_split_outputs_scale_with_geometry() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "wide.png", DynamicImage::ImageLuma8(solid(6, 4, 10)));
    save(dir.path(), "narrow.png", DynamicImage::ImageLuma8(solid(2, 4, 200)));

    let mut spec = SheetSpec {
        input_pages: 2,
        output_pages: 2,
        ..unfiltered()
    };
    spec.geometry.stretch = Some("16,4".parse().unwrap());
    spec.geometry.interpolation = Interpolation::Nearest;
    let args = args(dir.path(), &["wide.png", "narrow.png", "o1.png", "o2.png"]);
    run_blocking(&spec, &positional(&spec, &args)).unwrap();

    let first = image::open(dir.path().join("o1.png")).unwrap().into_luma8();
    let second = image::open(dir.path().join("o2.png")).unwrap().into_luma8();
    assert_eq!(first.dimensions(), (12, 4));
    assert_eq!(second.dimensions(), (4, 4));
    assert_eq!(second.get_pixel(3, 2)[0], 200);
}

#[test]
fn test_double_layout_single_output_keeps_depth() {
    let dir = TempDir::new().unwrap();
    let source: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_fn(9, 3, |x, y| Luma([(x * 1000 + y) as u16]));
    save(dir.path(), "in.png", DynamicImage::ImageLuma16(source.clone()));

    let spec = SheetSpec {
        layout: Layout::Double,
        ..unfiltered()
    };
    let args = args(dir.path(), &["in.png", "out.png"]);
    run_blocking(&spec, &positional(&spec, &args)).unwrap();

    let output = image::open(dir.path().join("out.png")).unwrap();
    assert_eq!(output.as_luma16().unwrap(), &source);
}

#[test]
fn test_post_shift_runs_after_sizing() {
    let dir = TempDir::new().unwrap();
    save(dir.path(), "in.png", DynamicImage::ImageLuma8(solid(20, 6, 100)));

    let mut spec = unfiltered();
    spec.geometry.sheet_size = Some("10,10".parse().unwrap());
    spec.geometry.post_shift = Some("3,0".parse().unwrap());
    let args = args(dir.path(), &["in.png", "out.png"]);
    run_blocking(&spec, &positional(&spec, &args)).unwrap();

    let out = image::open(dir.path().join("out.png")).unwrap().into_luma8();
    assert_eq!(out.dimensions(), (10, 10));
    // left edge exposed by the shift, after the crop
    assert_eq!(out.get_pixel(1, 5)[0], 255);
    assert_eq!(out.get_pixel(3, 5)[0], 100);
    assert_eq!(out.get_pixel(9, 5)[0], 100);
    // padding from the crop stays
    assert_eq!(out.get_pixel(5, 0)[0], 255);
}

#[test]
fn test_mirror_and_post_rotate() {
    let dir = TempDir::new().unwrap();
    let mut marked = solid(8, 4, 100);
    marked.put_pixel(0, 0, Luma([0]));
    save(dir.path(), "in.png", DynamicImage::ImageLuma8(marked));

    let mut spec = unfiltered();
    spec.geometry.pre_mirror = Some(Mirror::Horizontal);
    spec.geometry.post_mirror = Some(Mirror::Vertical);
    let args_mirror = args(dir.path(), &["in.png", "mirrored.png"]);
    run_blocking(&spec, &positional(&spec, &args_mirror)).unwrap();

    let mirrored = image::open(dir.path().join("mirrored.png")).unwrap().into_luma8();
    assert_eq!(mirrored.dimensions(), (8, 4));
    assert_eq!(mirrored.get_pixel(7, 3)[0], 0);
    assert_eq!(mirrored.get_pixel(0, 0)[0], 100);

    let mut spec = unfiltered();
    spec.geometry.post_rotate = Rotation::from_degrees(90).unwrap();
    let args_rotate = args(dir.path(), &["in.png", "rotated.png"]);
    run_blocking(&spec, &positional(&spec, &args_rotate)).unwrap();

    let rotated = image::open(dir.path().join("rotated.png")).unwrap().into_luma8();
    assert_eq!(rotated.dimensions(), (4, 8));
    assert_eq!(rotated.get_pixel(3, 0)[0], 0);
}
