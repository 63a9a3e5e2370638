//! End-to-end decoding of synthesized symbols
//!
//! Every image here is rendered from the crate's own encoders, so the
//! expected payload is always known exactly.

use rust_barcode::encoder::qr::encode;
use rust_barcode::encoder::render::{render_transformed, rotate};
use rust_barcode::{
    DecodeError, DecodeOptions, DecodeResult, Detector, ECLevel, LumaImage, Point,
    QrEncodeOptions, SymbolGrid, Symbology, decode, decode_luma, encode_code128, encode_ean13,
    encode_upca, render_bars, render_grid,
};

/// Options independent of the BARCODE_* environment
fn options() -> DecodeOptions {
    DecodeOptions::default()
        .with_try_harder(false)
        .with_max_symbols(0)
        .with_parallel(true)
}

fn qr(text: &str, ec: ECLevel) -> SymbolGrid {
    encode(text, ec, &QrEncodeOptions::default()).expect("payload fits")
}

/// Paste `src` into a light canvas with its top-left corner at (`left`, `top`)
fn embed(src: &LumaImage<'_>, width: usize, height: usize, left: usize, top: usize) -> LumaImage<'static> {
    let mut pixels = vec![255u8; width * height];
    for y in 0..src.height() {
        let row = src.row(y);
        let start = (top + y) * width + left;
        pixels[start..start + row.len()].copy_from_slice(row);
    }
    LumaImage::from_vec(pixels, width, height).expect("canvas dimensions")
}

fn mirror(src: &LumaImage<'_>) -> LumaImage<'static> {
    let mut pixels = Vec::with_capacity(src.pixels().len());
    for y in 0..src.height() {
        pixels.extend(src.row(y).iter().rev());
    }
    LumaImage::from_vec(pixels, src.width(), src.height()).expect("same dimensions")
}

fn texts(results: &[DecodeResult]) -> Vec<&str> {
    results.iter().map(|r| r.text.as_str()).collect()
}

// ── QR ─────────────────────────────────────────────────────────────────

#[test]
fn test_hello_version_1() {
    let grid = qr("HELLO", ECLevel::M);
    assert_eq!(grid.dimension(), 21);
    let image = embed(&render_grid(&grid, 6, 0), 200, 200, 37, 37);

    let results = decode(&image, &options()).unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.symbology, Symbology::Qr);
    assert_eq!(result.text, "HELLO");
    assert_eq!(result.bytes, b"HELLO");
    assert_eq!(result.error_count, 0);

    let meta = result.qr.expect("qr metadata");
    assert_eq!(meta.version.number(), 1);
    assert_eq!(meta.ec_level, ECLevel::M);
    assert!(!meta.mirrored);
    assert!(result.position[0].distance(&Point::new(37.0, 37.0)) < 3.0);
    assert!(result.position[2].distance(&Point::new(163.0, 163.0)) < 3.0);
}

#[test]
fn test_version_1_at_two_pixels_per_module() {
    let grid = qr("SMALL PRINT", ECLevel::M);
    assert_eq!(grid.dimension(), 21);
    let bare = render_grid(&grid, 2, 4);
    assert_eq!(texts(&decode(&bare, &options()).unwrap()), vec!["SMALL PRINT"]);

    let image = embed(&bare, 200, 200, 71, 59);
    let results = decode(&image, &options()).unwrap();
    assert_eq!(texts(&results), vec!["SMALL PRINT"]);
    assert_eq!(results[0].error_count, 0);
}

#[test]
fn test_all_white_is_empty() {
    let image = LumaImage::filled(50, 50, 255);
    assert_eq!(decode(&image, &options()), Ok(Vec::new()));
}

#[test]
fn test_invalid_image_rejected() {
    assert_eq!(
        decode_luma(&[], 0, 10, &options()),
        Err(DecodeError::InvalidImage {
            width: 0,
            height: 10,
            len: 0
        })
    );
    assert!(decode_luma(&[0u8; 99], 10, 10, &options()).is_err());
}

#[test]
fn test_larger_version_with_alignment() {
    let text = "https://example.com/barcodes/decoding-pipeline?version=large";
    let grid = qr(text, ECLevel::H);
    assert!(grid.dimension() > 25);
    let image = render_grid(&grid, 4, 4);

    let results = decode(&image, &options()).unwrap();
    assert_eq!(texts(&results), vec![text]);
    assert_eq!(results[0].qr.unwrap().ec_level, ECLevel::H);
}

#[test]
fn test_rotations_decode_same_payload() {
    let image = render_grid(&qr("ROTATE ME", ECLevel::Q), 5, 4);
    for degrees in [30.0, 90.0, 180.0, 270.0] {
        let rotated = rotate(&image, degrees).expect("rotation");
        let results = decode(&rotated, &options().with_try_harder(true)).unwrap();
        assert_eq!(texts(&results), vec!["ROTATE ME"], "rotated {degrees} degrees");
    }
}

#[test]
fn test_perspective_skew() {
    let image = render_grid(&qr("SKEWED 12345", ECLevel::M), 6, 4);
    let corners = [
        Point::new(40.0, 30.0),
        Point::new(230.0, 50.0),
        Point::new(220.0, 240.0),
        Point::new(30.0, 220.0),
    ];
    let skewed = render_transformed(&image, &corners, 270, 270).expect("warp");
    let results = decode(&skewed, &options().with_try_harder(true)).unwrap();
    assert_eq!(texts(&results), vec!["SKEWED 12345"]);
}

#[test]
fn test_mirrored_symbol() {
    let image = mirror(&render_grid(&qr("MIRROR", ECLevel::L), 5, 4));
    let results = decode(&image, &options()).unwrap();
    assert_eq!(texts(&results), vec!["MIRROR"]);
    assert!(results[0].qr.unwrap().mirrored);
}

#[test]
fn test_inverted_needs_try_invert() {
    let image = render_grid(&qr("INVERTED", ECLevel::M), 5, 4);
    let inverted: Vec<u8> = image.pixels().iter().map(|p| 255 - p).collect();
    let inverted = LumaImage::from_vec(inverted, image.width(), image.height()).unwrap();

    assert!(decode(&inverted, &options()).unwrap().is_empty());
    let results = decode(&inverted, &options().with_try_invert(true)).unwrap();
    assert_eq!(texts(&results), vec!["INVERTED"]);
}

#[test]
fn test_correctable_damage_is_reported() {
    let mut grid = qr("DAMAGED", ECLevel::H);
    grid.toggle(12, 12);
    grid.toggle(18, 17);
    let results = decode(&render_grid(&grid, 5, 4), &options()).unwrap();
    assert_eq!(texts(&results), vec!["DAMAGED"]);
    assert!((1..=2).contains(&results[0].error_count));
}

#[test]
fn test_damage_beyond_capacity_yields_nothing() {
    let mut grid = qr("TOO MUCH DAMAGE", ECLevel::L);
    for y in 10..20 {
        for x in 10..20 {
            grid.toggle(x, y);
        }
    }
    let results = decode(&render_grid(&grid, 5, 4), &options()).unwrap();
    assert!(results.is_empty(), "decoded {:?}", texts(&results));
}

#[test]
fn test_decoding_is_idempotent() {
    let image = embed(&render_grid(&qr("AGAIN", ECLevel::M), 4, 4), 240, 160, 20, 30);
    let first = decode(&image, &options()).unwrap();
    let second = decode(&image, &options()).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);

    let sequential = decode(&image, &options().with_parallel(false)).unwrap();
    assert_eq!(first, sequential);
}

#[test]
fn test_multiple_symbols_and_limit() {
    let left = render_grid(&qr("LEFT", ECLevel::M), 4, 4);
    let right = render_grid(&qr("RIGHT", ECLevel::M), 4, 4);
    let width = left.width() + right.width() + 40;
    let mut pixels = vec![255u8; width * left.height()];
    for y in 0..left.height() {
        let row = y * width;
        pixels[row..row + left.width()].copy_from_slice(left.row(y));
        let offset = row + left.width() + 40;
        pixels[offset..offset + right.width()].copy_from_slice(right.row(y));
    }
    let image = LumaImage::from_vec(pixels, width, left.height()).unwrap();

    let mut found = texts(&decode(&image, &options()).unwrap())
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    found.sort();
    assert_eq!(found, vec!["LEFT", "RIGHT"]);

    assert_eq!(decode(&image, &options().with_max_symbols(1)).unwrap().len(), 1);
}

#[test]
fn test_qr_filtered_out() {
    let image = render_grid(&qr("HIDDEN", ECLevel::M), 4, 4);
    let only_1d = options().with_symbologies([Symbology::Code128, Symbology::Ean13]);
    assert!(decode(&image, &only_1d).unwrap().is_empty());
}

#[test]
fn test_decoders_disabled() {
    let image = LumaImage::filled(50, 50, 255);
    assert_eq!(
        decode(&image, &options().with_decoders(false)),
        Err(DecodeError::DecodersDisabled)
    );
}

#[test]
fn test_detector_with_dedicated_pool() {
    let image = render_grid(&qr("POOLED", ECLevel::M), 4, 4);
    let detector = Detector::with_threads(options(), 2);
    let results = detector.decode(&image).unwrap();
    assert_eq!(texts(&results), vec!["POOLED"]);
}

// ── 1D ─────────────────────────────────────────────────────────────────

#[test]
fn test_code128() {
    let widths = encode_code128("Code-128 #42", &options()).unwrap();
    let image = render_bars(&widths, 2, 50, 12);
    let results = decode(&image, &options()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].symbology, Symbology::Code128);
    assert_eq!(results[0].text, "Code-128 #42");
    assert!(results[0].qr.is_none());
}

#[test]
fn test_code128_numeric_run() {
    let widths = encode_code128("0123456789012", &options()).unwrap();
    let image = embed(&render_bars(&widths, 3, 40, 10), 480, 80, 10, 20);
    let results = decode(&image, &options()).unwrap();
    assert_eq!(texts(&results), vec!["0123456789012"]);
}

#[test]
fn test_code128_upside_down() {
    let widths = encode_code128("FLIPPED", &options()).unwrap();
    let image = rotate(&render_bars(&widths, 2, 40, 12), 180.0).unwrap();
    let results = decode(&image, &options()).unwrap();
    assert_eq!(texts(&results), vec!["FLIPPED"]);
}

#[test]
fn test_code128_uniform_bar_gain() {
    // Ink spread of half a module on each edge at 2 px per module
    let widths = encode_code128("INK SPREAD", &options()).unwrap();
    let mut row = vec![255u8; 24];
    for (i, &w) in widths.iter().enumerate() {
        let (value, width) = if i % 2 == 0 {
            (0u8, 2 * w as usize + 1)
        } else {
            (255u8, 2 * w as usize - 1)
        };
        row.extend(std::iter::repeat_n(value, width));
    }
    row.extend([255u8; 24]);
    let (width, height) = (row.len(), 40);
    let image = LumaImage::from_vec(row.repeat(height), width, height).unwrap();

    let results = decode(&image, &options()).unwrap();
    assert_eq!(texts(&results), vec!["INK SPREAD"]);
    assert_eq!(results[0].symbology, Symbology::Code128);
}

#[test]
fn test_ean13() {
    let widths = encode_ean13("4006381333931", &options()).unwrap();
    let image = render_bars(&widths, 2, 60, 10);
    let results = decode(&image, &options()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].symbology, Symbology::Ean13);
    assert_eq!(results[0].text, "4006381333931");
}

#[test]
fn test_upca_reporting() {
    let widths = encode_upca("036000291452", &options()).unwrap();
    let image = render_bars(&widths, 2, 60, 10);

    let as_ean = decode(&image, &options()).unwrap();
    assert_eq!(as_ean[0].symbology, Symbology::Ean13);
    assert_eq!(as_ean[0].text, "0036000291452");

    let as_upca = decode(&image, &options().with_report_upca(true)).unwrap();
    assert_eq!(as_upca[0].symbology, Symbology::UpcA);
    assert_eq!(as_upca[0].text, "036000291452");
}

#[test]
fn test_vertical_barcode_needs_rotation() {
    let widths = encode_ean13("4006381333931", &options()).unwrap();
    let image = rotate(&render_bars(&widths, 2, 60, 10), 90.0).unwrap();

    let results = decode(&image, &options()).unwrap();
    assert_eq!(texts(&results), vec!["4006381333931"]);
    assert!(decode(&image, &options().with_try_rotate(false)).unwrap().is_empty());
}

#[test]
fn test_mixed_symbologies() {
    let code = render_grid(&qr("QR PART", ECLevel::M), 4, 4);
    let bars = render_bars(&encode_code128("BARS", &options()).unwrap(), 2, 120, 10);
    let width = code.width().max(bars.width());
    let height = code.height() + bars.height() + 20;
    let mut pixels = vec![255u8; width * height];
    for y in 0..code.height() {
        pixels[y * width..y * width + code.width()].copy_from_slice(code.row(y));
    }
    for y in 0..bars.height() {
        let row = (code.height() + 20 + y) * width;
        pixels[row..row + bars.width()].copy_from_slice(bars.row(y));
    }
    let image = LumaImage::from_vec(pixels, width, height).unwrap();

    let results = decode(&image, &options()).unwrap();
    let kinds: Vec<Symbology> = results.iter().map(|r| r.symbology).collect();
    assert!(kinds.contains(&Symbology::Qr));
    assert!(kinds.contains(&Symbology::Code128));
    assert_eq!(results.len(), 2);
}
