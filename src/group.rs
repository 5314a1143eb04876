//! 分组对比图：同组各区的 Top 词表在上，各自的词云图并排在下

use ab_glyph::{point, FontVec, PxScale};
use image::{
    imageops::{self, FilterType},
    RgbaImage,
};

use crate::{
    report::{RegionReport, ReportRow},
    table::{draw_grid, draw_row, fill_rect, BACKGROUND, HEADER_FILL, INK},
    text,
};

pub const SCORE_HEADER: &str = "词频";

pub fn group_name(index: usize) -> String {
    format!("第{}组", index + 1)
}

pub fn group_title(prefix: &str, top_k: usize, index: usize) -> String {
    format!("{prefix}Top{top_k}高频特征词与词云图 - {}", group_name(index))
}

pub fn group_file_name(prefix: &str, top_k: usize, index: usize) -> String {
    format!("{prefix}_{}_Top{top_k}高频特征词与词云图.png", group_name(index))
}

/// Reports of the regions in `members` that were processed, in member order.
pub fn select_members<'a>(
    members: &[String],
    reports: &'a [RegionReport],
) -> Vec<&'a RegionReport> {
    members
        .iter()
        .filter_map(|member| reports.iter().find(|report| &report.region == member))
        .collect()
}

/// One region's column pair and word cloud.
pub struct GroupPanel<'a> {
    pub region: &'a str,
    pub rows: &'a [ReportRow],
    pub cloud: Option<RgbaImage>,
}

/// Group image geometry, in pixels.
#[derive(Clone, Copy, Debug)]
pub struct GroupLayout {
    pub top_k: usize,
    pub rank_width: u32,
    pub word_width: u32,
    pub score_width: u32,
    pub row_height: u32,
    pub title_height: u32,
    pub caption_height: u32,
    pub cloud_height: u32,
    pub padding: u32,
    pub font_size: f32,
}

impl GroupLayout {
    pub fn new(top_k: usize) -> Self {
        GroupLayout {
            top_k,
            rank_width: 90,
            word_width: 160,
            score_width: 100,
            row_height: 40,
            title_height: 70,
            caption_height: 40,
            cloud_height: 320,
            padding: 20,
            font_size: 20.0,
        }
    }

    fn columns(&self, panels: usize) -> Vec<u32> {
        let mut columns = vec![self.rank_width];
        for _ in 0..panels {
            columns.extend([self.word_width, self.score_width]);
        }
        columns
    }

    fn table_height(&self) -> u32 {
        self.row_height * (self.top_k as u32 + 1)
    }

    fn cloud_top(&self) -> u32 {
        self.padding * 2 + self.title_height + self.table_height() + self.caption_height
    }

    pub fn dimensions(&self, panels: usize) -> (u32, u32) {
        let width = self.columns(panels).iter().sum::<u32>() + self.padding * 2;
        let height = self.cloud_top() + self.cloud_height + self.padding;
        (width, height)
    }

    /// Box the `i`th cloud is fitted into: (x, y, width, height).
    pub fn cloud_box(&self, panels: usize, i: usize) -> (u32, u32, u32, u32) {
        let (width, _) = self.dimensions(panels);
        let panel_width = (width - self.padding * 2) / panels.max(1) as u32;
        let x = self.padding + i as u32 * panel_width;
        (x + 5, self.cloud_top(), panel_width.saturating_sub(10), self.cloud_height)
    }
}

/// Fits `width` x `height` into the box, keeping the aspect ratio.
fn fit(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scale = (max_width as f32 / width as f32).min(max_height as f32 / height as f32);
    (
        ((width as f32 * scale) as u32).max(1),
        ((height as f32 * scale) as u32).max(1),
    )
}

/// 生成一组的对比图
pub fn render_group(
    font: &FontVec,
    title: &str,
    panels: &[GroupPanel],
    layout: GroupLayout,
) -> RgbaImage {
    let (width, height) = layout.dimensions(panels.len());
    let mut buffer = RgbaImage::from_pixel(width, height, BACKGROUND);
    let scale = PxScale::from(layout.font_size);
    let title_scale = PxScale::from(layout.font_size * 1.3);

    let title_glyphs = text::text_to_glyphs(title, font, title_scale);
    let title_x = width.saturating_sub(title_glyphs.width) / 2;
    text::draw_text(
        &mut buffer,
        title,
        font,
        title_scale,
        point(title_x as f32, layout.padding as f32),
        INK,
    );

    let columns = layout.columns(panels.len());
    let left = layout.padding;
    let top = layout.padding + layout.title_height;

    let mut headers = vec![String::new()];
    for panel in panels {
        headers.extend([panel.region.to_string(), SCORE_HEADER.to_string()]);
    }
    fill_rect(&mut buffer, left, top, width - left * 2, layout.row_height, HEADER_FILL);
    draw_row(&mut buffer, font, scale, (left, top), layout.row_height, &columns, &headers);

    for i in 0..layout.top_k {
        let mut cells = vec![format!("Top{}", i + 1)];
        for panel in panels {
            match panel.rows.get(i) {
                Some(row) => cells.extend([row.token.clone(), row.score_label()]),
                None => cells.extend([String::new(), String::new()]),
            }
        }
        let y = top + (i as u32 + 1) * layout.row_height;
        draw_row(&mut buffer, font, scale, (left, y), layout.row_height, &columns, &cells);
    }
    draw_grid(&mut buffer, (left, top), &columns, layout.top_k as u32 + 1, layout.row_height);

    for (i, panel) in panels.iter().enumerate() {
        let (x, y, box_width, box_height) = layout.cloud_box(panels.len(), i);

        let caption = text::text_to_glyphs(panel.region, font, scale);
        let caption_x = x + box_width.saturating_sub(caption.width) / 2;
        let caption_y = y - layout.caption_height
            + layout.caption_height.saturating_sub(caption.height) / 2;
        text::draw_text(
            &mut buffer,
            panel.region,
            font,
            scale,
            point(caption_x as f32, caption_y as f32),
            INK,
        );

        let Some(cloud) = &panel.cloud else {
            continue;
        };
        if cloud.width() == 0 || cloud.height() == 0 || box_width == 0 {
            continue;
        }
        let (cloud_width, cloud_height) =
            fit(cloud.width(), cloud.height(), box_width, box_height);
        let resized = imageops::resize(cloud, cloud_width, cloud_height, FilterType::Triangle);
        let cloud_x = x + (box_width - cloud_width) / 2;
        let cloud_y = y + (box_height - cloud_height) / 2;
        imageops::overlay(&mut buffer, &resized, cloud_x as i64, cloud_y as i64);
    }

    buffer
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{Rgba, RgbaImage};

    use super::{
        fit, group_file_name, group_title, render_group, select_members, GroupLayout, GroupPanel,
    };
    use crate::{
        report::{RegionReport, ReportRow},
        table::{BACKGROUND, HEADER_FILL},
        test_font,
    };

    fn report(region: &str) -> RegionReport {
        RegionReport {
            region: region.to_string(),
            document: PathBuf::from(format!("{region}.txt")),
            mask: None,
            vocabulary_size: 0,
            total: 0.0,
            rows: vec![],
            cloud_image: None,
            table_image: None,
        }
    }

    fn rows(words: &[&str]) -> Vec<ReportRow> {
        words
            .iter()
            .enumerate()
            .map(|(i, word)| ReportRow {
                rank: i + 1,
                token: word.to_string(),
                score: (10 - i) as f64,
                share: 10.0,
            })
            .collect()
    }

    #[test]
    fn names_follow_the_group_index() {
        assert_eq!(
            group_title("上海市十六区", 10, 0),
            "上海市十六区Top10高频特征词与词云图 - 第1组"
        );
        assert_eq!(
            group_file_name("上海市十六区", 10, 3),
            "上海市十六区_第4组_Top10高频特征词与词云图.png"
        );
    }

    #[test]
    fn members_are_selected_in_group_order() {
        let reports = vec![report("徐汇区"), report("黄浦区"), report("嘉定区")];
        let members: Vec<String> = ["黄浦区", "徐汇区", "长宁区"]
            .into_iter()
            .map(String::from)
            .collect();

        let selected = select_members(&members, &reports);
        let regions: Vec<&str> = selected.iter().map(|report| report.region.as_str()).collect();
        assert_eq!(regions, vec!["黄浦区", "徐汇区"]);

        assert!(select_members(&["崇明区".to_string()], &reports).is_empty());
    }

    #[test]
    fn fitting_keeps_the_aspect_ratio() {
        assert_eq!(fit(100, 50, 250, 320), (250, 125));
        assert_eq!(fit(100, 400, 250, 320), (80, 320));
    }

    #[test]
    fn renders_table_and_clouds_side_by_side() {
        let font = test_font();
        let layout = GroupLayout::new(10);
        let red = Rgba([220, 0, 0, 255]);
        let first = rows(&["alpha", "beta", "gamma"]);
        let second = rows(&["delta"]);
        let panels = [
            GroupPanel {
                region: "Huangpu",
                rows: &first,
                cloud: Some(RgbaImage::from_pixel(100, 50, red)),
            },
            GroupPanel {
                region: "Xuhui",
                rows: &second,
                cloud: None,
            },
        ];

        let image = render_group(&font, "Group 1", &panels, layout);

        assert_eq!(image.dimensions(), layout.dimensions(2));
        assert_eq!(image.dimensions(), (90 + 2 * 260 + 40, 40 + 70 + 440 + 40 + 320 + 20));

        // header row is filled
        let header_y = layout.padding + layout.title_height + 3;
        assert_eq!(image.get_pixel(layout.padding + 3, header_y), &HEADER_FILL);

        // the first cloud is scaled into its box, the missing one leaves it blank
        let (x, y, width, height) = layout.cloud_box(2, 0);
        let center = image.get_pixel(x + width / 2, y + height / 2);
        assert!(center.0[0] > 200 && center.0[1] < 30, "cloud missing: {center:?}");

        let (x, y, width, height) = layout.cloud_box(2, 1);
        assert_eq!(image.get_pixel(x + width / 2, y + height / 2), &BACKGROUND);
    }

    #[test]
    fn short_rankings_leave_blank_cells() {
        let font = test_font();
        let layout = GroupLayout::new(3);
        let only = rows(&["alpha"]);
        let panels = [GroupPanel {
            region: "Huangpu",
            rows: &only,
            cloud: None,
        }];

        let image = render_group(&font, "Group", &panels, layout);

        // third ranking line: word and score cells stay blank
        let top = layout.padding + layout.title_height + 3 * layout.row_height;
        let left = layout.padding + layout.rank_width;
        for y in top + 2..top + layout.row_height - 1 {
            for x in left + 2..left + layout.word_width - 1 {
                assert_eq!(image.get_pixel(x, y), &BACKGROUND, "ink at ({x}, {y})");
            }
        }
    }
}
