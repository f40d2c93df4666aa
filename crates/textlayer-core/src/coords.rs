//! Coordinate transformation between canvas pixel space and PDF point space
//!
//! Pixel space has its origin at the top-left with Y growing down;
//! point space has its origin at the bottom-left with Y growing up.
//! Both axes scale independently by the page-size ratio, so non-uniform
//! canvases still map correctly.

/// Convert a pixel-space position and font size to document points.
///
/// The returned Y is baseline-adjusted: subtracting the mapped font
/// size approximates placing the glyph baseline at the bottom of the
/// item's bounding box.
#[allow(clippy::too_many_arguments)]
pub fn to_document_space(
    pixel_x: f64,
    pixel_y: f64,
    font_size_px: f64,
    page_height_pt: f64,
    page_height_px: f64,
    page_width_pt: f64,
    page_width_px: f64,
) -> (f64, f64, f64) {
    let scale_x = page_width_pt / page_width_px;
    let scale_y = page_height_pt / page_height_px;

    let font_size_pt = font_size_px * scale_y;
    let doc_x = pixel_x * scale_x;
    let doc_y = page_height_pt - (pixel_y * scale_y) - font_size_pt;

    (doc_x, doc_y, font_size_pt)
}

/// Inverse of [`to_document_space`]: map a baseline-adjusted document
/// position back to the pixel-space top-left corner.
#[allow(clippy::too_many_arguments)]
pub fn to_pixel_space(
    doc_x: f64,
    doc_y: f64,
    font_size_pt: f64,
    page_height_pt: f64,
    page_height_px: f64,
    page_width_pt: f64,
    page_width_px: f64,
) -> (f64, f64, f64) {
    let scale_x = page_width_pt / page_width_px;
    let scale_y = page_height_pt / page_height_px;

    let font_size_px = font_size_pt / scale_y;
    let pixel_x = doc_x / scale_x;
    let pixel_y = (page_height_pt - doc_y - font_size_pt) / scale_y;

    (pixel_x, pixel_y, font_size_px)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER_PT: (f64, f64) = (612.0, 792.0);

    #[test]
    fn test_identity_scale_maps_to_baseline() {
        // 1:1 canvas: a 12px item at (72, 80) lands at (72pt, 700pt)
        let (x, y, size) =
            to_document_space(72.0, 80.0, 12.0, LETTER_PT.1, 792.0, LETTER_PT.0, 612.0);
        assert!((x - 72.0).abs() < 1e-9);
        assert!((y - 700.0).abs() < 1e-9);
        assert!((size - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoomed_canvas() {
        // Canvas at 1.5x zoom: pixel values scale up, points stay put
        let scale = 1.5;
        let (x, y, size) = to_document_space(
            72.0 * scale,
            80.0 * scale,
            12.0 * scale,
            LETTER_PT.1,
            792.0 * scale,
            LETTER_PT.0,
            612.0 * scale,
        );
        assert!((x - 72.0).abs() < 1e-9);
        assert!((y - 700.0).abs() < 1e-9);
        assert!((size - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_left_pixel_maps_below_page_top() {
        // Pixel origin is the page top; the baseline sits one font size down
        let (x, y, _) = to_document_space(0.0, 0.0, 10.0, 792.0, 792.0, 612.0, 612.0);
        assert_eq!(x, 0.0);
        assert_eq!(y, 782.0);
    }

    #[test]
    fn test_round_trip() {
        let (dx, dy, ds) = to_document_space(123.0, 456.0, 14.0, 792.0, 1188.0, 612.0, 918.0);
        let (px, py, ps) = to_pixel_space(dx, dy, ds, 792.0, 1188.0, 612.0, 918.0);
        assert!((px - 123.0).abs() < 1e-9);
        assert!((py - 456.0).abs() < 1e-9);
        assert!((ps - 14.0).abs() < 1e-9);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..4000.0
    }

    proptest! {
        /// Property: pixel -> document -> pixel returns the original values
        #[test]
        fn roundtrip_pixel_document_pixel(
            px in 0.0f64..2000.0,
            py in 0.0f64..2000.0,
            font_px in 1.0f64..100.0,
            page_h_pt in dimension(),
            page_h_px in dimension(),
            page_w_pt in dimension(),
            page_w_px in dimension(),
        ) {
            let (dx, dy, ds) = to_document_space(
                px, py, font_px, page_h_pt, page_h_px, page_w_pt, page_w_px,
            );
            let (bx, by, bs) = to_pixel_space(
                dx, dy, ds, page_h_pt, page_h_px, page_w_pt, page_w_px,
            );

            let tol = 1e-6 * (1.0 + px.abs() + py.abs());
            prop_assert!((bx - px).abs() < tol, "X: {} vs {}", bx, px);
            prop_assert!((by - py).abs() < tol, "Y: {} vs {}", by, py);
            prop_assert!((bs - font_px).abs() < tol, "size: {} vs {}", bs, font_px);
        }

        /// Property: X mapping is linear in the pixel coordinate
        #[test]
        fn x_axis_scales_linearly(
            page_w_pt in dimension(),
            page_w_px in dimension(),
        ) {
            let (x1, _, _) = to_document_space(
                page_w_px * 0.25, 0.0, 10.0, 792.0, 792.0, page_w_pt, page_w_px,
            );
            let (x2, _, _) = to_document_space(
                page_w_px * 0.50, 0.0, 10.0, 792.0, 792.0, page_w_pt, page_w_px,
            );
            prop_assert!((x2 - 2.0 * x1).abs() < 1e-6 * page_w_pt);
        }

        /// Property: mapped font size is always positive for positive input
        #[test]
        fn font_size_stays_positive(
            font_px in 0.1f64..500.0,
            page_h_pt in dimension(),
            page_h_px in dimension(),
        ) {
            let (_, _, size) = to_document_space(
                0.0, 0.0, font_px, page_h_pt, page_h_px, 612.0, 612.0,
            );
            prop_assert!(size > 0.0);
        }
    }
}
