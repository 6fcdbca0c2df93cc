//! Pagination tests: analyzed strips re-flowed into pages, plus SVG and
//! bitmap page output.

use flowscore::compositor::{paint_page, render_page_bitmap, render_page_svg, PageHeader};
use flowscore::overlay::{align_row, AnnotationOverlay};
use flowscore::pager::Pager;
use flowscore::{
    analyze, paginate, AnalysisResult, Bar, InkRule, LayoutConfig, PixelGrid, ScoreMetrics, Viewport,
    ZoomScale,
};
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn staff_image(width: u32, height: u32, bar_columns: &[u32]) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    let lines: Vec<u32> = (0..5).map(|i| height / 10 + i * height / 5).collect();
    for &y in &lines {
        for x in 0..width {
            img.put_pixel(x, y, INK);
        }
    }
    for &x in bar_columns {
        for y in lines[0]..=lines[4] {
            img.put_pixel(x, y, INK);
            img.put_pixel(x + 1, y, INK);
        }
    }
    img
}

/// Two 300 px staff images with three bars each.
fn two_staff_grid() -> PixelGrid {
    let staff = staff_image(300, 100, &[96, 196, 296]);
    PixelGrid::new(vec![staff.clone(), staff], InkRule::Alpha).unwrap()
}

fn evenly_spaced(count: u32, spacing: u32) -> AnalysisResult {
    AnalysisResult {
        width: (count + 1) * spacing,
        height: 100,
        left_edge: 0,
        right_edge: (count + 1) * spacing - 10,
        bars: (1..=count)
            .map(|i| Bar { left_edge: i * spacing, right_edge: i * spacing + 1 })
            .collect(),
        strip: None,
    }
}

#[test]
fn six_bars_fill_one_page_of_two_rows() {
    let analysis = analyze(&two_staff_grid());
    assert_eq!(analysis.bars.len(), 6);
    let metrics = ScoreMetrics::natural(300, 100);

    // 340 px drawable width: three bars per row. 240 px below the header: two rows.
    let pages = paginate(
        &analysis,
        &metrics,
        &LayoutConfig::default(),
        ZoomScale::default(),
        Viewport::new(400.0, 400.0),
    );

    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert!(page.has_header());
    assert_eq!(page.rows.len(), 2);
    assert_eq!((page.rows[0].first_bar, page.rows[0].last_bar), (0, 2));
    assert_eq!((page.rows[1].first_bar, page.rows[1].last_bar), (3, 5));
    assert_eq!(page.rows[0].left, 0);
    assert_eq!(page.rows[1].left, 296);
    assert_eq!(page.rows[1].right, 598);
    assert_eq!(page.bar_end, 6);
    println!("✓ 6 bars → {} page, rows {:?}", pages.len(), page.rows.iter().map(|r| r.bar_count()).collect::<Vec<_>>());
}

#[test]
fn paint_always_progresses() {
    let analysis = evenly_spaced(8, 400);
    let metrics = ScoreMetrics::natural(400, 100);
    let config = LayoutConfig::default();

    // Every bar is wider than the 40 px drawable width.
    for start in 0..analysis.bars.len() {
        let page = paint_page(
            &analysis,
            &metrics,
            &config,
            ZoomScale::default(),
            Viewport::new(100.0, 500.0),
            start,
            0.0,
        );
        assert!(page.bar_end > start, "page starting at bar {start} made no progress");
    }
}

#[test]
fn pages_cover_every_bar_once() {
    let analysis = evenly_spaced(25, 100);
    let metrics = ScoreMetrics::natural(400, 100);
    let pages = paginate(
        &analysis,
        &metrics,
        &LayoutConfig::default(),
        ZoomScale::new(0.8),
        Viewport::new(500.0, 500.0),
    );

    let mut next = 0;
    for (index, page) in pages.iter().enumerate() {
        assert_eq!(page.index, index);
        assert_eq!(page.bar_start, next);
        assert!(!page.rows.is_empty());
        for row in &page.rows {
            assert_eq!(row.first_bar, next);
            next = row.last_bar + 1;
        }
        assert_eq!(page.bar_end, next);
    }
    assert_eq!(next, 25);
}

#[test]
fn tiny_viewport_still_gets_one_row() {
    let analysis = evenly_spaced(4, 100);
    let metrics = ScoreMetrics::natural(400, 100);
    let pages = paginate(
        &analysis,
        &metrics,
        &LayoutConfig::default(),
        ZoomScale::new(3.0),
        Viewport::new(200.0, 10.0),
    );
    assert!(pages.iter().all(|page| page.rows.len() == 1));
    assert_eq!(pages.iter().map(|page| page.bar_count()).sum::<usize>(), 4);
}

#[test]
fn zooming_in_never_adds_bars_per_row() {
    let analysis = evenly_spaced(30, 80);
    let metrics = ScoreMetrics::natural(400, 100);
    let config = LayoutConfig::default();
    let viewport = Viewport::new(1200.0, 900.0);

    let mut previous = usize::MAX;
    for step in 0..20 {
        let scale = ZoomScale::new(0.5 + step as f64 * 0.1);
        let pages = paginate(&analysis, &metrics, &config, scale, viewport);
        let widest = pages
            .iter()
            .flat_map(|page| &page.rows)
            .map(|row| row.bar_count())
            .max()
            .unwrap();
        let first_row = pages[0].rows[0].bar_count();
        assert!(first_row <= previous, "first row grew at {}", scale.percent_label());
        assert!(widest >= 1);
        previous = first_row;
    }
}

#[test]
fn pager_keeps_the_anchor_bar_on_rescale() {
    let analysis = evenly_spaced(40, 100);
    let metrics = ScoreMetrics::natural(400, 100);
    let mut pager = Pager::new(LayoutConfig::default());
    pager.open(&analysis, &metrics, Viewport::new(600.0, 600.0), ZoomScale::default());
    pager.next();
    pager.next();
    let anchor = pager.current_page().unwrap().bar_start;

    let change = pager.rescale(&analysis, &metrics, ZoomScale::new(1.5)).unwrap();
    assert_eq!(change.detach, Some(2));
    assert!(pager.current_page().unwrap().contains_bar(anchor));

    pager.resize(&analysis, &metrics, Viewport::new(1400.0, 900.0)).unwrap();
    assert!(pager.current_page().unwrap().contains_bar(anchor));
    assert_eq!(pager.scale(), ZoomScale::new(1.5));
}

#[test]
fn page_svg_places_slices_and_overlays() {
    let analysis = analyze(&two_staff_grid());
    let metrics = ScoreMetrics::natural(300, 100);
    let scale = ZoomScale::default();
    let pages = paginate(&analysis, &metrics, &LayoutConfig::default(), scale, Viewport::new(400.0, 400.0));

    let mut overlay = AnnotationOverlay::new();
    overlay.insert("a1".into(), "M300 50l10 10".into());
    let header = PageHeader {
        title: "Etude & Fugue".into(),
        artist: "Anon".into(),
    };
    let svg = render_page_svg(
        &pages[0],
        &header,
        "strip.png",
        analysis.width,
        analysis.height,
        &metrics,
        scale,
        Some(&overlay.render_passive()),
    )
    .unwrap();

    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Etude &amp; Fugue"));
    assert_eq!(svg.matches("strip.png").count(), 2);
    assert_eq!(svg.matches("flowscore-annotations").count(), 2);
    assert!(svg.contains("M300 50l10 10"));

    // The second row starts at column 296 of the strip.
    let aligned = align_row(&pages[0].rows[1], &metrics, scale);
    assert_eq!(aligned.to_local(300.0, 50.0), (4.0, 50.0));
}

#[test]
fn page_bitmap_copies_row_pixels() {
    let grid = two_staff_grid();
    let analysis = analyze(&grid);
    let metrics = ScoreMetrics::natural(300, 100);
    let pages = paginate(
        &analysis,
        &metrics,
        &LayoutConfig::default(),
        ZoomScale::default(),
        Viewport::new(400.0, 400.0),
    );

    let bitmap = render_page_bitmap(&pages[0], &grid);
    assert_eq!(bitmap.width(), 340);
    assert_eq!(bitmap.height(), 340);
    // First row: bar 0 sits at x = 96, below the 100 px header. Row 60 of the
    // strip lies between two staff lines.
    assert!(bitmap.get_pixel(96, 100 + 60)[0] < 64);
    assert_eq!(bitmap.get_pixel(90, 100 + 60), &Rgba([255, 255, 255, 255]));
    assert_eq!(bitmap.get_pixel(96, 20), &Rgba([255, 255, 255, 255]));
}

#[test]
fn thin_closing_bar_is_drawn() {
    // 1 px bars at x = 50 and x = 90 over a baseline that fixes the extent.
    let mut strip = RgbaImage::new(120, 40);
    for x in 0..120 {
        strip.put_pixel(x, 39, INK);
    }
    for x in [50, 90] {
        for y in 0..39 {
            strip.put_pixel(x, y, INK);
        }
    }
    let grid = PixelGrid::new(vec![strip], InkRule::Alpha).unwrap();
    let analysis = analyze(&grid);
    assert_eq!(
        analysis.bars,
        vec![Bar { left_edge: 50, right_edge: 50 }, Bar { left_edge: 90, right_edge: 90 }]
    );

    let metrics = ScoreMetrics::natural(120, 40);
    let pages = paginate(
        &analysis,
        &metrics,
        &LayoutConfig::default(),
        ZoomScale::default(),
        Viewport::new(400.0, 400.0),
    );
    let row = &pages[0].rows[0];
    assert_eq!((row.left, row.right), (0, 91));

    let bitmap = render_page_bitmap(&pages[0], &grid);
    assert!(bitmap.get_pixel(50, 100 + 20)[0] < 64);
    assert!(bitmap.get_pixel(90, 100 + 20)[0] < 64);
    assert_eq!(bitmap.get_pixel(70, 100 + 20), &Rgba([255, 255, 255, 255]));
}
