use std::{fs, path::Path};

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use log::debug;
use nanorand::{Rng, WyRand};
use palette::{Hsl, IntoColor, Pixel, Srgb};
use sat::{Point, Rect, SummedAreaTable};

pub use config::Config;
pub use error::{Error, Result};
pub use frequency::{AggregationConfig, Aggregator, LengthRange, Vocabulary, WeightingPolicy};
pub use pipeline::Pipeline;
pub use region::{RegionExtractor, RegionMatcher};
pub use report::{RegionReport, ReportRow};
pub use stopwords::StopWords;
pub use tokenizer::{ChineseTokenizer, Segmenter};

pub mod config;
pub mod error;
pub mod frequency;
pub mod group;
pub mod pipeline;
pub mod region;
pub mod report;
pub mod sat;
pub mod search;
pub mod stopwords;
pub mod table;
pub mod text;
pub mod tokenizer;

pub fn load_font(path: impl AsRef<Path>) -> Result<FontVec> {
    let path = path.as_ref();
    let font_file = fs::read(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    FontVec::try_from_vec(font_file).map_err(|_| Error::InvalidFont(path.to_path_buf()))
}

/// Parses any CSS color (`#871A84`, `white`, `rgb(0,0,0)`).
pub fn parse_color(value: &str) -> Result<Rgba<u8>> {
    let color = csscolorparser::parse(value).map_err(|source| Error::Color {
        value: value.to_string(),
        source,
    })?;
    Ok(Rgba(color.to_rgba8()))
}

#[derive(Clone, Debug)]
pub struct Word<'a> {
    pub text: &'a str,
    pub font_size: f32,
    pub rotated: bool,
    pub position: Point,
    pub frequency: f32,
    pub index: usize,
}

pub enum WordCloudSize {
    FromDimensions { width: u32, height: u32 },
    /// Non-zero pixels are off limits, the canvas takes the mask's size.
    FromMask(GrayImage),
}

/// 透明或纯白的像素不能写字
pub fn mask_from_image(img: &DynamicImage) -> GrayImage {
    let rgba = img.to_rgba8();
    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let blocked = a == 0 || (r == 255 && g == 255 && b == 255);
        Luma([if blocked { 255 } else { 0 }])
    })
}

#[derive(Clone, Debug)]
pub enum ColorScheme {
    RandomHue,
    Palette(Vec<Rgba<u8>>),
    Solid(Rgba<u8>),
}

impl ColorScheme {
    pub fn pick(&self, rng: &mut WyRand) -> Rgba<u8> {
        match self {
            ColorScheme::RandomHue => random_color_rgba(rng),
            ColorScheme::Palette(colors) if !colors.is_empty() => {
                colors[rng.generate_range(0..colors.len())]
            }
            ColorScheme::Palette(_) => random_color_rgba(rng),
            ColorScheme::Solid(color) => *color,
        }
    }
}

pub struct WordCloud {
    background_color: Rgba<u8>,
    pub font: FontVec,
    color_scheme: ColorScheme,
    min_font_size: f32,
    max_font_size: Option<f32>,
    font_step: f32,
    word_margin: u32,
    word_rotate_chance: f64,
    relative_font_scaling: f32,
    max_words: usize,
    rng_seed: Option<u64>,
}

impl WordCloud {
    pub fn new(font: FontVec) -> Self {
        WordCloud {
            background_color: Rgba([0, 0, 0, 255]),
            font,
            color_scheme: ColorScheme::RandomHue,
            min_font_size: 4.0,
            max_font_size: None,
            font_step: 1.0,
            word_margin: 2,
            word_rotate_chance: 0.10,
            relative_font_scaling: 0.5,
            max_words: 200,
            rng_seed: None,
        }
    }

    pub fn with_background_color(mut self, value: Rgba<u8>) -> Self {
        self.background_color = value;
        self
    }

    pub fn with_color_scheme(mut self, value: ColorScheme) -> Self {
        self.color_scheme = value;
        self
    }

    pub fn with_min_font_size(mut self, value: f32) -> Self {
        self.min_font_size = value.max(1.0);
        self
    }

    pub fn with_max_font_size(mut self, value: Option<f32>) -> Self {
        self.max_font_size = value;
        self
    }

    pub fn with_font_step(mut self, value: f32) -> Self {
        self.font_step = value.max(1.0);
        self
    }

    pub fn with_word_margin(mut self, value: u32) -> Self {
        self.word_margin = value;
        self
    }

    /// Share of words kept horizontal, `0.9` rotates about one word in ten.
    pub fn with_prefer_horizontal(mut self, value: f64) -> Self {
        self.word_rotate_chance = (1.0 - value).clamp(0.0, 1.0);
        self
    }

    pub fn with_relative_font_scaling(mut self, value: f32) -> Self {
        self.relative_font_scaling = value.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_words(mut self, value: usize) -> Self {
        self.max_words = value;
        self
    }

    pub fn with_rng_seed(mut self, value: Option<u64>) -> Self {
        self.rng_seed = value;
        self
    }

    pub fn generate_from_vocabulary(
        &self,
        vocabulary: &Vocabulary,
        size: WordCloudSize,
    ) -> RgbaImage {
        let scheme = self.color_scheme.clone();
        self.generate_from_vocabulary_with_color_func(vocabulary, size, |_word, rng| {
            scheme.pick(rng)
        })
    }

    pub fn generate_from_vocabulary_with_color_func<F>(
        &self,
        vocabulary: &Vocabulary,
        size: WordCloudSize,
        color_func: F,
    ) -> RgbaImage
    where
        F: Fn(&Word, &mut WyRand) -> Rgba<u8>,
    {
        let words = vocabulary.normalized(self.max_words);

        let mut gray_buffer = match size {
            WordCloudSize::FromDimensions { width, height } => {
                GrayImage::from_pixel(width, height, Luma([0]))
            }
            WordCloudSize::FromMask(mask) => mask,
        };
        let (width, height) = gray_buffer.dimensions();
        let mut summed_area_table = SummedAreaTable::new(gray_buffer.as_raw(), width, height);

        let mut rng = match self.rng_seed {
            Some(seed) => WyRand::new_seed(seed),
            None => WyRand::new(),
        };

        let mut final_image_buffer = RgbaImage::from_pixel(width, height, self.background_color);

        let mut font_size = self.max_font_size.unwrap_or(height as f32);
        let mut last_freq = 1.0;
        let rotate_threshold = (self.word_rotate_chance * 1000.0) as u32;

        for (index, (text, frequency)) in words.into_iter().enumerate() {
            if frequency <= 0.0 {
                continue;
            }

            let rs = self.relative_font_scaling;
            if rs > 0.0 {
                font_size = ((rs * (frequency / last_freq) + (1.0 - rs)) * font_size).round();
            }

            let mut rotated = rng.generate_range(0..1000u32) < rotate_threshold;
            let mut tried_other_orientation = false;

            let placed = loop {
                if font_size < self.min_font_size {
                    break None;
                }

                let coverage = self.word_coverage(text, font_size, rotated);
                let rect = Rect {
                    width: coverage.width() + self.word_margin,
                    height: coverage.height() + self.word_margin,
                };
                if let Some(pos) = summed_area_table.find_space_for_rect(&rect, &mut rng) {
                    break Some((coverage, pos));
                }

                if self.word_rotate_chance > 0.0 && !tried_other_orientation {
                    rotated = !rotated;
                    tried_other_orientation = true;
                    continue;
                }

                font_size -= self.font_step;
                tried_other_orientation = false;
            };

            //字号已经小于下限，后面的词也放不下
            let Some((coverage, pos)) = placed else {
                debug!("stopped layout at word {index} ({text}), out of space");
                break;
            };

            let half_margin = self.word_margin / 2;
            let position = Point {
                x: pos.x + half_margin,
                y: pos.y + half_margin,
            };
            let word = Word {
                text,
                font_size,
                rotated,
                position,
                frequency,
                index,
            };

            let color = color_func(&word, &mut rng);
            text::draw_coverage_to_rgba_buffer(
                &mut final_image_buffer,
                &coverage,
                position.x,
                position.y,
                color,
            );
            text::mark_occupied(&mut gray_buffer, &coverage, position.x, position.y);
            summed_area_table.update_from_row(gray_buffer.as_raw(), position.y);

            last_freq = frequency;
        }

        final_image_buffer
    }

    fn word_coverage(&self, text: &str, font_size: f32, rotated: bool) -> GrayImage {
        let glyphs = text::text_to_glyphs(text, &self.font, PxScale::from(font_size));
        let coverage = text::glyphs_to_coverage(&glyphs, &self.font);
        if rotated {
            text::rotate_coverage(&coverage)
        } else {
            coverage
        }
    }
}

fn random_color_rgba(rng: &mut WyRand) -> Rgba<u8> {
    let hue: u8 = rng.generate_range(0..255);

    let col = Hsl::new(hue as f32, 1.0, 0.5);
    let rgb: Srgb = col.into_color();

    let raw: [u8; 3] = rgb.into_format().into_raw();

    Rgba([raw[0], raw[1], raw[2], 255])
}

#[cfg(test)]
pub(crate) const TEST_FONT: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/fonts/DejaVuSans.ttf");

#[cfg(test)]
pub(crate) fn test_font() -> FontVec {
    load_font(TEST_FONT).expect("test font")
}
