//! Configuration file handling.
//!
//! Every field has a default, so an empty `region-wcloud.toml` (or none at
//! all) reproduces the stock run: documents in `16区各自全文档`, masks in
//! `地区抠图`, output in `词频与词云图`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    frequency::AggregationConfig,
    parse_color, ColorScheme,
};

pub const DEFAULT_CONFIG_FILE: &str = "region-wcloud.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub cloud: CloudConfig,

    #[serde(default)]
    pub table: TableConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let length = self.aggregation.length;
        if length.min > length.max {
            return Err(Error::Config(format!(
                "aggregation.length.min ({}) is greater than max ({})",
                length.min, length.max
            )));
        }
        if self.input.region_suffixes.is_empty() {
            return Err(Error::Config("input.region_suffixes must not be empty".into()));
        }
        if self.search.first_row == 0 || self.search.first_row > self.search.last_row {
            return Err(Error::Config(format!(
                "search rows {}..={} are not a valid 1-based range",
                self.search.first_row, self.search.last_row
            )));
        }
        if !self.search.url_template.contains("{}") {
            return Err(Error::Config(
                "search.url_template needs a {} placeholder for the keyword".into(),
            ));
        }
        crate::search::column_index(&self.search.column)?;
        self.cloud.background()?;
        self.cloud.color_scheme()?;
        Ok(())
    }

    pub fn default_toml() -> Result<String> {
        let body = toml::to_string_pretty(&Config::default())?;
        Ok(format!("# region-wcloud configuration\n\n{body}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    #[serde(default = "default_masks_dir")]
    pub masks_dir: PathBuf,

    /// Without masks, clouds use the fixed `cloud.width` x `cloud.height` canvas.
    #[serde(default = "default_true")]
    pub use_masks: bool,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_stop_words")]
    pub stop_words: PathBuf,

    #[serde(default = "default_region_suffixes")]
    pub region_suffixes: Vec<String>,

    /// Extra words the segmenter must keep whole.
    #[serde(default)]
    pub user_words: Vec<String>,
}

impl InputConfig {
    pub fn masks(&self) -> Option<&Path> {
        self.use_masks.then_some(self.masks_dir.as_path())
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            masks_dir: default_masks_dir(),
            use_masks: true,
            output_dir: default_output_dir(),
            stop_words: default_stop_words(),
            region_suffixes: default_region_suffixes(),
            user_words: vec![],
        }
    }
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("16区各自全文档")
}

fn default_masks_dir() -> PathBuf {
    PathBuf::from("地区抠图")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("词频与词云图")
}

fn default_stop_words() -> PathBuf {
    PathBuf::from("stop.txt")
}

fn default_region_suffixes() -> Vec<String> {
    vec!["区".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub groups: GroupConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            groups: GroupConfig::default(),
        }
    }
}

fn default_top_k() -> usize {
    10
}

/// Side-by-side comparison images, one per group of regions. Rendered with
/// the word clouds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Leads the title and the file name of every group image.
    #[serde(default = "default_group_prefix")]
    pub prefix: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Region names per group, in display order.
    #[serde(default = "default_groups")]
    pub members: Vec<Vec<String>>,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: default_group_prefix(),
            top_k: default_top_k(),
            members: default_groups(),
        }
    }
}

fn default_group_prefix() -> String {
    "上海市十六区".to_string()
}

fn default_groups() -> Vec<Vec<String>> {
    [
        ["黄浦区", "徐汇区", "长宁区", "静安区"],
        ["普陀区", "虹口区", "杨浦区", "浦东新区"],
        ["闵行区", "宝山区", "嘉定区", "金山区"],
        ["松江区", "青浦区", "奉贤区", "崇明区"],
    ]
    .into_iter()
    .map(|group| group.into_iter().map(String::from).collect())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_font")]
    pub font: PathBuf,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_background")]
    pub background: String,

    /// CSS colors picked at random per word. Empty means random hues.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,

    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// `0` starts from the canvas height.
    #[serde(default = "default_max_font_size")]
    pub max_font_size: f32,

    #[serde(default = "default_min_font_size")]
    pub min_font_size: f32,

    #[serde(default = "default_prefer_horizontal")]
    pub prefer_horizontal: f64,

    #[serde(default = "default_relative_scaling")]
    pub relative_scaling: f32,

    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            font: default_font(),
            width: default_width(),
            height: default_height(),
            background: default_background(),
            palette: default_palette(),
            max_words: default_max_words(),
            max_font_size: default_max_font_size(),
            min_font_size: default_min_font_size(),
            prefer_horizontal: default_prefer_horizontal(),
            relative_scaling: default_relative_scaling(),
            seed: None,
        }
    }
}

impl CloudConfig {
    pub fn background(&self) -> Result<Rgba<u8>> {
        parse_color(&self.background)
    }

    pub fn color_scheme(&self) -> Result<ColorScheme> {
        match self.palette.as_slice() {
            [] => Ok(ColorScheme::RandomHue),
            [single] => Ok(ColorScheme::Solid(parse_color(single)?)),
            colors => Ok(ColorScheme::Palette(
                colors
                    .iter()
                    .map(|color| parse_color(color))
                    .collect::<Result<Vec<_>>>()?,
            )),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_font() -> PathBuf {
    PathBuf::from("simhei.ttf")
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_background() -> String {
    "white".to_string()
}

fn default_palette() -> Vec<String> {
    [
        "#d53e4f", "#f46d43", "#fdae61", "#fee08b", "#e6f598", "#abdda4", "#66c2a5", "#3288bd",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_max_words() -> usize {
    100
}

fn default_max_font_size() -> f32 {
    300.0
}

fn default_min_font_size() -> f32 {
    4.0
}

fn default_prefer_horizontal() -> f64 {
    0.9
}

fn default_relative_scaling() -> f32 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_table_rows")]
    pub rows: usize,

    #[serde(default = "default_table_blocks")]
    pub blocks: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rows: default_table_rows(),
            blocks: default_table_blocks(),
        }
    }
}

fn default_table_rows() -> usize {
    50
}

fn default_table_blocks() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_workbook")]
    pub workbook: PathBuf,

    #[serde(default = "default_column")]
    pub column: String,

    #[serde(default = "default_first_row")]
    pub first_row: u32,

    #[serde(default = "default_last_row")]
    pub last_row: u32,

    #[serde(default = "default_url_template")]
    pub url_template: String,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workbook: default_workbook(),
            column: default_column(),
            first_row: default_first_row(),
            last_row: default_last_row(),
            url_template: default_url_template(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_workbook() -> PathBuf {
    PathBuf::from("keywords.xlsx")
}

fn default_column() -> String {
    "B".to_string()
}

fn default_first_row() -> u32 {
    3
}

fn default_last_row() -> u32 {
    45
}

fn default_url_template() -> String {
    "https://www.baidu.com/s?wd={}".to_string()
}

fn default_delay_ms() -> u64 {
    1000
}
