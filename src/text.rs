use ab_glyph::{point, Font, FontVec, Glyph, GlyphId, Point, PxScale, ScaleFont};
use image::{imageops, GrayImage, Luma, Pixel, Rgba, RgbaImage};

#[derive(Clone, Debug)]
pub struct GlyphData {
    pub glyphs: Vec<Glyph>,
    pub width: u32,
    pub height: u32,
}

//把文本转换为字体，方便画图
pub fn text_to_glyphs(text: &str, font: &FontVec, scale: PxScale) -> GlyphData {
    let scaled_font = font.as_scaled(scale);

    let mut glyphs: Vec<Glyph> = vec![];
    layout_paragraph(&scaled_font, point(0.0, 0.0), text, &mut glyphs);

    let glyphs_height = scaled_font.height().ceil() as u32;
    let glyphs_width = match (glyphs.first(), glyphs.last()) {
        (Some(first), Some(last)) => {
            let min_x = first.position.x;
            let max_x = last.position.x + scaled_font.h_advance(last.id);
            (max_x - min_x).ceil() as u32
        }
        _ => 0,
    };

    GlyphData {
        glyphs,
        width: glyphs_width,
        height: glyphs_height,
    }
}

/// Rasterizes laid out glyphs into a coverage map the size of the text box.
pub fn glyphs_to_coverage(glyph_data: &GlyphData, font: &FontVec) -> GrayImage {
    let mut coverage = GrayImage::new(glyph_data.width.max(1), glyph_data.height.max(1));
    draw_glyphs_to_gray_buffer(&mut coverage, glyph_data, font, point(0.0, 0.0));
    coverage
}

/// 竖排的词逆时针转 90 度
pub fn rotate_coverage(coverage: &GrayImage) -> GrayImage {
    imageops::rotate270(coverage)
}

pub fn draw_glyphs_to_gray_buffer(
    buffer: &mut GrayImage,
    glyph_data: &GlyphData,
    font: &FontVec,
    origin: Point,
) {
    for glyph in glyph_data.glyphs.iter().cloned() {
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();

            outlined.draw(|x, y, v| {
                let final_x = origin.x + bounds.min.x + x as f32;
                let final_y = origin.y + bounds.min.y + y as f32;
                if final_x < 0.0 || final_y < 0.0 {
                    return;
                }
                let (final_x, final_y) = (final_x as u32, final_y as u32);
                if final_x >= buffer.width() || final_y >= buffer.height() {
                    return;
                }
                let px = buffer.get_pixel_mut(final_x, final_y);
                let value = (v.clamp(0.0, 1.0) * 255.0) as u8;
                *px = Luma([px.0[0].max(value)]);
            })
        }
    }
}

/// Blends `color` into `buffer` at (`x`, `y`) using `coverage` as alpha.
pub fn draw_coverage_to_rgba_buffer(
    buffer: &mut RgbaImage,
    coverage: &GrayImage,
    x: u32,
    y: u32,
    color: Rgba<u8>,
) {
    for (cx, cy, value) in coverage.enumerate_pixels() {
        let v = value.0[0] as f32 / 255.0;
        if v == 0.0 {
            continue;
        }
        let (final_x, final_y) = (x + cx, y + cy);
        if final_x >= buffer.width() || final_y >= buffer.height() {
            continue;
        }

        let px = buffer.get_pixel_mut(final_x, final_y);
        px.apply2(&color, |old, new| {
            ((v * new as f32) + (1.0 - v) * old as f32) as u8
        });
        px.0[3] = 0xFF;
    }
}

/// Marks every covered pixel of `coverage` as occupied in `grid`.
pub fn mark_occupied(grid: &mut GrayImage, coverage: &GrayImage, x: u32, y: u32) {
    for (cx, cy, value) in coverage.enumerate_pixels() {
        if value.0[0] == 0 {
            continue;
        }
        let (final_x, final_y) = (x + cx, y + cy);
        if final_x < grid.width() && final_y < grid.height() {
            grid.put_pixel(final_x, final_y, Luma([1]));
        }
    }
}

/// Draws a single line of text with its top-left corner at `origin`.
pub fn draw_text(
    buffer: &mut RgbaImage,
    text: &str,
    font: &FontVec,
    scale: PxScale,
    origin: Point,
    color: Rgba<u8>,
) {
    let glyphs = text_to_glyphs(text, font, scale);
    if glyphs.width == 0 {
        return;
    }
    let coverage = glyphs_to_coverage(&glyphs, font);
    let (x, y) = (origin.x.max(0.0) as u32, origin.y.max(0.0) as u32);
    draw_coverage_to_rgba_buffer(buffer, &coverage, x, y, color);
}

pub fn layout_paragraph<F, SF>(font: &SF, position: Point, text: &str, target: &mut Vec<Glyph>)
where
    F: Font,
    SF: ScaleFont<F>,
{
    let v_advance = font.height() + font.line_gap();
    let mut caret = position + point(0.0, font.ascent());
    let mut last_glyph: Option<GlyphId> = None;
    for c in text.chars() {
        if c.is_control() {
            if c == '\n' {
                //进行换行
                caret = point(position.x, caret.y + v_advance);
            }
            continue;
        }

        let mut glyph = font.scaled_glyph(c);
        if let Some(previous) = last_glyph.take() {
            caret.x += font.kern(previous, glyph.id);
        }
        glyph.position = caret;
        last_glyph = Some(glyph.id);
        caret.x += font.h_advance(glyph.id);

        target.push(glyph);
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    use super::{draw_coverage_to_rgba_buffer, mark_occupied, rotate_coverage};

    fn coverage() -> GrayImage {
        let mut coverage = GrayImage::new(3, 2);
        coverage.put_pixel(0, 0, Luma([255]));
        coverage.put_pixel(2, 1, Luma([128]));
        coverage
    }

    #[test]
    fn rotation_swaps_dimensions() {
        let rotated = rotate_coverage(&coverage());
        assert_eq!(rotated.dimensions(), (2, 3));
        // top-left corner ends up bottom-left
        assert_eq!(rotated.get_pixel(0, 2).0[0], 255);
    }

    #[test]
    fn marks_only_covered_pixels() {
        let mut grid = GrayImage::new(5, 5);
        mark_occupied(&mut grid, &coverage(), 1, 1);

        assert_eq!(grid.get_pixel(1, 1).0[0], 1);
        assert_eq!(grid.get_pixel(3, 2).0[0], 1);
        assert_eq!(grid.get_pixel(2, 1).0[0], 0);
    }

    #[test]
    fn blends_color_by_coverage() {
        let mut buffer = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        draw_coverage_to_rgba_buffer(&mut buffer, &coverage(), 0, 0, Rgba([200, 100, 50, 255]));

        assert_eq!(buffer.get_pixel(0, 0), &Rgba([200, 100, 50, 255]));
        assert_eq!(buffer.get_pixel(1, 0), &Rgba([0, 0, 0, 255]));
        let half = buffer.get_pixel(2, 1);
        assert!(half.0[0] > 90 && half.0[0] < 110);
    }

    #[test]
    fn drawing_past_the_edge_is_clipped() {
        let mut buffer = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        draw_coverage_to_rgba_buffer(&mut buffer, &coverage(), 1, 1, Rgba([255, 255, 255, 255]));
        assert_eq!(buffer.get_pixel(1, 1), &Rgba([255, 255, 255, 255]));
    }
}
