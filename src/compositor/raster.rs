//! Bitmap page output: blits each row's strip slice, scaled to its display
//! size, into one RGBA page.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::layout::PageLayout;
use crate::sampler::StripSource;

/// Render a page into a bitmap the size of its drawable area.
///
/// The header band of the first page is left blank; text is the host's job.
pub fn render_page_bitmap<S: StripSource + ?Sized>(page: &PageLayout, source: &S) -> RgbaImage {
    let width = page.width.max(1.0).ceil() as u32;
    let height = page.height.max(1.0).ceil() as u32;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    for row in &page.rows {
        let slice_width = row.width.round() as u32;
        let slice_height = row.height.round() as u32;
        if slice_width == 0 || slice_height == 0 || row.source_width() == 0 {
            continue;
        }
        let slice = source.crop_columns(row.left, row.right);
        let scaled = imageops::resize(&slice, slice_width, slice_height, FilterType::Triangle);
        let y = (page.header_height + row.top).round() as i64;
        imageops::overlay(&mut canvas, &scaled, 0, y);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::StaffRow;

    #[test]
    fn rows_land_at_their_offsets() {
        let mut strip = RgbaImage::new(40, 10);
        for y in 0..10 {
            strip.put_pixel(20, y, Rgba([0, 0, 0, 255]));
        }
        let page = PageLayout {
            index: 1,
            bar_start: 0,
            bar_end: 1,
            width: 60.0,
            height: 50.0,
            header_height: 0.0,
            rows: vec![StaffRow {
                first_bar: 0,
                last_bar: 0,
                left: 10,
                right: 30,
                top: 25.0,
                width: 20.0,
                height: 10.0,
            }],
        };

        let bitmap = render_page_bitmap(&page, &strip);
        assert_eq!(bitmap.dimensions(), (60, 50));
        assert_eq!(bitmap.get_pixel(10, 30), &Rgba([0, 0, 0, 255]));
        assert_eq!(bitmap.get_pixel(10, 5), &Rgba([255, 255, 255, 255]));
    }
}
