//! Detection tests: synthetic staff strips run through the sampler and the
//! bar detector.

use flowscore::{analyze, analyze_bytes, encode_png, Bar, InkRule, PixelGrid};
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A staff strip: five 1 px staff lines across the full width and 2 px bar
/// strokes spanning the staff at the given columns.
fn staff_image(width: u32, height: u32, bar_columns: &[u32]) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    let lines: Vec<u32> = (0..5).map(|i| height / 10 + i * height / 5).collect();
    for &y in &lines {
        for x in 0..width {
            img.put_pixel(x, y, INK);
        }
    }
    let (top, bottom) = (lines[0], lines[4]);
    for &x in bar_columns {
        for y in top..=bottom {
            img.put_pixel(x, y, INK);
            img.put_pixel(x + 1, y, INK);
        }
    }
    img
}

/// Single-pixel bar columns only, inside a staff line that fixes the extent.
fn bar_columns_image(width: u32, height: u32, columns: &[u32]) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for x in 0..width {
        img.put_pixel(x, height - 1, INK);
    }
    for &x in columns {
        for y in 0..height - 1 {
            img.put_pixel(x, y, INK);
        }
    }
    img
}

#[test]
fn extents_bound_every_bar() {
    let images = vec![
        staff_image(300, 100, &[96, 196, 296]),
        staff_image(300, 100, &[96, 196, 296]),
    ];
    let grid = PixelGrid::new(images, InkRule::Alpha).unwrap();
    let analysis = analyze(&grid);

    assert_eq!(analysis.width, 600);
    assert_eq!(analysis.height, 100);
    assert_eq!(analysis.left_edge, 0);
    assert_eq!(analysis.right_edge, 599);
    assert_eq!(analysis.bars.len(), 6);

    for bar in &analysis.bars {
        assert!(analysis.left_edge <= bar.left_edge);
        assert!(bar.left_edge <= bar.right_edge);
        assert!(bar.right_edge <= analysis.right_edge);
    }
    for pair in analysis.bars.windows(2) {
        assert!(pair[0].right_edge <= pair[1].left_edge);
    }
    assert_eq!(analysis.bars[3], Bar { left_edge: 396, right_edge: 397 });
    println!("✓ {} bars inside {}..{}", analysis.bars.len(), analysis.left_edge, analysis.right_edge);
}

#[test]
fn columns_twenty_apart_merge() {
    let grid = PixelGrid::new(vec![bar_columns_image(200, 40, &[50, 70])], InkRule::Alpha).unwrap();
    let analysis = analyze(&grid);
    assert_eq!(analysis.bars, vec![Bar { left_edge: 50, right_edge: 70 }]);
}

#[test]
fn columns_twenty_one_apart_split() {
    let grid = PixelGrid::new(vec![bar_columns_image(200, 40, &[50, 71])], InkRule::Alpha).unwrap();
    let analysis = analyze(&grid);
    assert_eq!(
        analysis.bars,
        vec![
            Bar { left_edge: 50, right_edge: 50 },
            Bar { left_edge: 71, right_edge: 71 },
        ]
    );
}

#[test]
fn short_strokes_are_not_bars() {
    // Stems reaching exactly half the height do not qualify.
    let mut img = bar_columns_image(100, 40, &[]);
    for y in 0..20 {
        img.put_pixel(30, y, INK);
    }
    let grid = PixelGrid::new(vec![img], InkRule::Alpha).unwrap();
    assert!(analyze(&grid).bars.is_empty());
}

#[test]
fn blank_strip_is_degenerate() {
    let grid = PixelGrid::new(vec![RgbaImage::new(64, 32)], InkRule::Alpha).unwrap();
    let analysis = analyze(&grid);
    assert_eq!(analysis.left_edge, 64);
    assert_eq!(analysis.right_edge, 0);
    assert!(analysis.bars.is_empty());
    assert!(analysis.is_degenerate());
}

#[test]
fn encoded_images_analyze_like_decoded_ones() {
    let img = staff_image(300, 100, &[96, 196]);
    let png = encode_png(&img).unwrap();
    let from_bytes = analyze_bytes(&[png.clone(), png], InkRule::Alpha).unwrap();

    let grid = PixelGrid::new(vec![img.clone(), img], InkRule::Alpha).unwrap();
    let direct = analyze(&grid);
    assert_eq!(from_bytes.bars, direct.bars);
    assert_eq!(from_bytes.width, 600);
}

#[test]
fn undecodable_image_names_its_index() {
    let png = encode_png(&staff_image(50, 40, &[])).unwrap();
    let err = analyze_bytes(&[png, b"not an image".to_vec()], InkRule::Alpha).unwrap_err();
    assert!(err.is_fetch());
    assert!(err.to_string().contains("#1"), "unexpected error: {err}");
}

#[test]
fn mixed_width_sources_are_composited() {
    let images = vec![staff_image(120, 100, &[60]), staff_image(200, 100, &[100])];
    let grid = PixelGrid::new(images, InkRule::Alpha).unwrap();
    let analysis = analyze(&grid);
    assert_eq!(analysis.width, 320);
    assert_eq!(
        analysis.bars,
        vec![
            Bar { left_edge: 60, right_edge: 61 },
            Bar { left_edge: 220, right_edge: 221 },
        ]
    );
}
