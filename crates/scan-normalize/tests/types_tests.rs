use scan_normalize::*;

#[test]
fn test_paper_size_dimensions() {
    assert_eq!(PaperSize::A4.dimensions_mm(), (210.0, 297.0));
    assert_eq!(PaperSize::A0.dimensions_mm(), (841.0, 1189.0));
    assert_eq!(PaperSize::A10.dimensions_mm(), (26.0, 37.0));
    assert_eq!(PaperSize::Letter.dimensions_mm(), (215.9, 279.4));
    assert_eq!(
        PaperSize::Legal.dimensions_with_orientation(Orientation::Landscape),
        (355.6, 215.9)
    );
}

#[test]
fn test_layout_pages_per_file() {
    assert_eq!(Layout::Single.pages_per_file(), 1);
    assert_eq!(Layout::Double.pages_per_file(), 2);
    assert_eq!("DOUBLE".parse::<Layout>().unwrap(), Layout::Double);
    assert!("triple".parse::<Layout>().is_err());
}

#[test]
fn test_background_parsing() {
    assert_eq!("black".parse::<Background>().unwrap(), Background::BLACK);
    assert_eq!("White".parse::<Background>().unwrap(), Background::WHITE);
    assert_eq!(
        "#ff8000".parse::<Background>().unwrap(),
        Background::rgb(255, 128, 0)
    );
    assert_eq!(
        "#f80".parse::<Background>().unwrap(),
        Background::rgb(255, 136, 0)
    );
    assert!("#ff80".parse::<Background>().is_err());
    assert!("purple".parse::<Background>().is_err());
    assert_eq!(Background::WHITE.luma(), 255);
    assert_eq!(Background::BLACK.luma(), 0);
}

#[test]
fn test_rotation_from_degrees() {
    assert_eq!(Rotation::from_degrees(-90).unwrap(), Rotation::Clockwise270);
    assert_eq!(Rotation::from_degrees(90).unwrap(), Rotation::Clockwise90);
    assert_eq!(Rotation::from_degrees(540).unwrap(), Rotation::Clockwise180);
    assert!(Rotation::from_degrees(45).is_err());
}

#[test]
fn test_mirror_parsing() {
    assert_eq!("h".parse::<Mirror>().unwrap(), Mirror::Horizontal);
    assert_eq!("v".parse::<Mirror>().unwrap(), Mirror::Vertical);
    assert_eq!("hv".parse::<Mirror>().unwrap(), Mirror::Both);
    assert!("x".parse::<Mirror>().is_err());
}

#[test]
fn test_rounding_modes() {
    assert_eq!(Rounding::HalfUp.apply(2.5), 3);
    assert_eq!(Rounding::HalfEven.apply(2.5), 2);
    assert_eq!(Rounding::HalfEven.apply(3.5), 4);
    assert_eq!(Rounding::Truncate.apply(2.9), 2);
    assert_eq!("half-even".parse::<Rounding>().unwrap(), Rounding::HalfEven);
}

#[test]
fn test_at_sheet_keeps_existing_context() {
    let err = ScanError::Config("bad".to_string()).at_sheet(4);
    assert!(matches!(err, ScanError::Sheet { sheet: 4, .. }));
    assert!(matches!(err.root(), ScanError::Config(_)));

    let err = ScanError::MissingInput {
        sheet: 2,
        path: "x.png".into(),
    }
    .at_sheet(9);
    assert!(matches!(err, ScanError::MissingInput { sheet: 2, .. }));
}
