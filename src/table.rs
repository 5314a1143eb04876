use ab_glyph::{point, FontVec, PxScale};
use image::{Rgba, RgbaImage};

use crate::{report::ReportRow, text};

pub const HEADERS: [&str; 4] = ["序号", "主题词", "词频 / 次", "占比"];

const COLUMN_WIDTHS: [u32; 4] = [80, 180, 130, 110];
pub(crate) const HEADER_FILL: Rgba<u8> = Rgba([0xf0, 0xf0, 0xf0, 0xff]);
pub(crate) const BACKGROUND: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
pub(crate) const INK: Rgba<u8> = Rgba([0, 0, 0, 0xff]);

/// Table geometry, in pixels.
#[derive(Clone, Copy, Debug)]
pub struct TableLayout {
    /// Entries shown, at most `rows_per_block * blocks`.
    pub rows: usize,
    pub blocks: usize,
    pub rows_per_block: usize,
    pub row_height: u32,
    pub title_height: u32,
    pub padding: u32,
    pub font_size: f32,
}

impl TableLayout {
    /// `rows` split over `blocks` side-by-side column groups.
    pub fn new(rows: usize, blocks: usize) -> Self {
        let blocks = blocks.max(1);
        TableLayout {
            rows,
            blocks,
            rows_per_block: (rows + blocks - 1) / blocks,
            row_height: 40,
            title_height: 70,
            padding: 20,
            font_size: 22.0,
        }
    }

    fn block_width(&self) -> u32 {
        COLUMN_WIDTHS.iter().sum()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let width = self.block_width() * self.blocks as u32 + self.padding * 2;
        let height = self.title_height
            + self.row_height * (self.rows_per_block as u32 + 1)
            + self.padding * 2;
        (width, height)
    }

    /// Row for the `i`th entry: (block, line), line 0 is the header.
    pub fn cell_of(&self, i: usize) -> (usize, usize) {
        let per_block = self.rows_per_block.max(1);
        (i / per_block, i % per_block + 1)
    }
}

pub fn title(region: &str, rows: usize) -> String {
    format!("{region} 词频排名前{rows}位")
}

/// 生成词频总表图片
pub fn render_frequency_table(
    font: &FontVec,
    region: &str,
    rows: &[ReportRow],
    layout: TableLayout,
) -> RgbaImage {
    let (width, height) = layout.dimensions();
    let mut buffer = RgbaImage::from_pixel(width, height, BACKGROUND);
    let scale = PxScale::from(layout.font_size);
    let title_scale = PxScale::from(layout.font_size * 1.3);

    let title = title(region, layout.rows);
    let title_glyphs = text::text_to_glyphs(&title, font, title_scale);
    let title_x = width.saturating_sub(title_glyphs.width) / 2;
    text::draw_text(
        &mut buffer,
        &title,
        font,
        title_scale,
        point(title_x as f32, layout.padding as f32),
        INK,
    );

    let top = layout.padding + layout.title_height;
    let block_width = layout.block_width();

    let headers = HEADERS.map(String::from);
    for block in 0..layout.blocks {
        let left = layout.padding + block as u32 * block_width;
        fill_rect(&mut buffer, left, top, block_width, layout.row_height, HEADER_FILL);
        draw_row(
            &mut buffer,
            font,
            scale,
            (left, top),
            layout.row_height,
            &COLUMN_WIDTHS,
            &headers,
        );
    }

    for (i, row) in rows.iter().take(layout.rows).enumerate() {
        let (block, line) = layout.cell_of(i);
        let left = layout.padding + block as u32 * block_width;
        let y = top + line as u32 * layout.row_height;
        let cells = [
            row.rank.to_string(),
            row.token.clone(),
            row.score_label(),
            row.share_label(),
        ];
        draw_row(&mut buffer, font, scale, (left, y), layout.row_height, &COLUMN_WIDTHS, &cells);
    }

    let columns: Vec<u32> = (0..layout.blocks).flat_map(|_| COLUMN_WIDTHS).collect();
    let lines = layout.rows_per_block as u32 + 1;
    draw_grid(&mut buffer, (layout.padding, top), &columns, lines, layout.row_height);
    buffer
}

/// Centers each cell's text in its column, starting at `origin` (top-left).
pub(crate) fn draw_row(
    buffer: &mut RgbaImage,
    font: &FontVec,
    scale: PxScale,
    origin: (u32, u32),
    row_height: u32,
    columns: &[u32],
    cells: &[String],
) {
    let (mut x, top) = origin;
    for (cell, &column_width) in cells.iter().zip(columns) {
        let glyphs = text::text_to_glyphs(cell, font, scale);
        let cell_x = x + column_width.saturating_sub(glyphs.width) / 2;
        let cell_y = top + row_height.saturating_sub(glyphs.height) / 2;
        text::draw_text(
            buffer,
            cell,
            font,
            scale,
            point(cell_x as f32, cell_y as f32),
            INK,
        );
        x += column_width;
    }
}

pub(crate) fn fill_rect(
    buffer: &mut RgbaImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    color: Rgba<u8>,
) {
    for py in y..(y + height).min(buffer.height()) {
        for px in x..(x + width).min(buffer.width()) {
            buffer.put_pixel(px, py, color);
        }
    }
}

/// One-pixel cell borders for `lines` rows of `columns`.
pub(crate) fn draw_grid(
    buffer: &mut RgbaImage,
    origin: (u32, u32),
    columns: &[u32],
    lines: u32,
    row_height: u32,
) {
    let (left, top) = origin;
    let bottom = top + lines * row_height;
    let right = left + columns.iter().sum::<u32>();

    for line in 0..=lines {
        let y = top + line * row_height;
        fill_rect(buffer, left, y, right - left + 1, 1, INK);
    }

    let mut x = left;
    fill_rect(buffer, x, top, 1, bottom - top + 1, INK);
    for column_width in columns {
        x += column_width;
        fill_rect(buffer, x, top, 1, bottom - top + 1, INK);
    }
}

#[cfg(test)]
mod tests {
    use super::{render_frequency_table, title, TableLayout, BACKGROUND, HEADER_FILL, INK};
    use crate::{report::ReportRow, test_font};

    fn report_rows(n: usize) -> Vec<ReportRow> {
        (1..=n)
            .map(|rank| ReportRow {
                rank,
                token: format!("word{rank}"),
                score: (100 - rank) as f64,
                share: 1.0,
            })
            .collect()
    }

    #[test]
    fn fifty_rows_in_two_blocks() {
        let layout = TableLayout::new(50, 2);
        assert_eq!(layout.rows_per_block, 25);
        assert_eq!(layout.cell_of(0), (0, 1));
        assert_eq!(layout.cell_of(24), (0, 25));
        assert_eq!(layout.cell_of(25), (1, 1));
        assert_eq!(layout.cell_of(49), (1, 25));
    }

    #[test]
    fn odd_row_counts_round_up() {
        let layout = TableLayout::new(11, 2);
        assert_eq!(layout.rows_per_block, 6);
        assert_eq!(TableLayout::new(10, 0).blocks, 1);
    }

    #[test]
    fn dimensions_grow_with_blocks() {
        let one = TableLayout::new(10, 1).dimensions();
        let two = TableLayout::new(20, 2).dimensions();
        assert!(two.0 > one.0);
        assert_eq!(two.1, one.1);
    }

    #[test]
    fn title_names_region_and_count() {
        assert_eq!(title("黄浦区", 50), "黄浦区 词频排名前50位");
    }

    #[test]
    fn title_uses_the_configured_row_count() {
        let layout = TableLayout::new(11, 2);
        assert_eq!(layout.rows, 11);
        assert_eq!(title("黄浦区", layout.rows), "黄浦区 词频排名前11位");
    }

    #[test]
    fn renders_fifty_rows_in_two_blocks() {
        let font = test_font();
        let layout = TableLayout::new(50, 2);
        let image = render_frequency_table(&font, "Huangpu", &report_rows(60), layout);

        assert_eq!(image.dimensions(), layout.dimensions());
        assert_eq!(image.dimensions(), (1040, 1150));

        // header band of both blocks is filled, body stays white
        let header_y = layout.padding + layout.title_height + 2;
        let second_block = layout.padding + 500 + 3;
        assert_eq!(image.get_pixel(layout.padding + 3, header_y), &HEADER_FILL);
        assert_eq!(image.get_pixel(second_block, header_y), &HEADER_FILL);
        assert_eq!(image.get_pixel(3, 3), &BACKGROUND);
        // outer border
        assert_eq!(image.get_pixel(layout.padding, header_y), &INK);
    }

    #[test]
    fn rows_past_the_configured_count_are_not_drawn() {
        let font = test_font();
        let layout = TableLayout::new(3, 2);
        assert_eq!(layout.rows_per_block, 2);
        let image = render_frequency_table(&font, "Huangpu", &report_rows(10), layout);

        // entry 4 would land on the second line of the second block
        let top = layout.padding + layout.title_height + 2 * layout.row_height;
        let left = layout.padding + 500;
        for y in top + 2..top + layout.row_height - 1 {
            for x in (left + 2..left + 79).chain(left + 82..left + 259) {
                assert_eq!(image.get_pixel(x, y), &BACKGROUND, "ink at ({x}, {y})");
            }
        }
        // while entry 3 on its first line is drawn
        let first = layout.padding + layout.title_height + layout.row_height;
        let inked = (first + 2..first + layout.row_height - 1)
            .flat_map(|y| (left + 82..left + 259).map(move |x| (x, y)))
            .filter(|&(x, y)| image.get_pixel(x, y) != &BACKGROUND)
            .count();
        assert!(inked > 0);
    }
}
