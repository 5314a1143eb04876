//! Document-by-document processing: match a mask, aggregate, report, render.

use std::{
    fs,
    path::{Path, PathBuf},
};

use ab_glyph::FontVec;
use log::{debug, info, warn};

use crate::{
    config::{CloudConfig, Config},
    error::{Error, Result},
    frequency::{Aggregator, Vocabulary},
    group::{self, GroupLayout, GroupPanel},
    load_font, mask_from_image,
    region::{RegionExtractor, RegionMatcher},
    report::{self, RegionReport},
    stopwords::StopWords,
    table::{self, TableLayout},
    tokenizer::Segmenter,
    WordCloud, WordCloudSize,
};

pub const DOCUMENT_EXTENSION: &str = "txt";
const WORKBOOK_EXTENSION: &str = "xlsx";

pub fn cloud_file_name(region: &str) -> String {
    format!("{region}_词云图.png")
}

pub fn table_file_name(region: &str) -> String {
    format!("{region}_词频总表.png")
}

/// One document to process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub document: PathBuf,
    pub region: String,
    pub mask: Option<PathBuf>,
}

pub struct Pipeline<'a, S: Segmenter> {
    config: &'a Config,
    segmenter: &'a S,
    stop_words: &'a StopWords,
    //只有需要画图时才加载字体
    wordcloud: Option<WordCloud>,
}

impl<'a, S: Segmenter> Pipeline<'a, S> {
    pub fn new(config: &'a Config, segmenter: &'a S, stop_words: &'a StopWords) -> Result<Self> {
        let wordcloud = if config.cloud.enabled || config.table.enabled {
            Some(build_wordcloud(&config.cloud, load_font(&config.cloud.font)?)?)
        } else {
            None
        };

        Ok(Pipeline {
            config,
            segmenter,
            stop_words,
            wordcloud,
        })
    }

    pub fn run(&self) -> Result<Vec<RegionReport>> {
        let jobs = self.discover()?;
        let mut reports = Vec::with_capacity(jobs.len());

        for job in &jobs {
            reports.push(self.process(job)?);
        }

        info!("processed {} of {} documents", reports.len(), jobs.len());

        if let Some(wordcloud) = &self.wordcloud {
            if self.config.cloud.enabled && self.config.report.groups.enabled {
                self.render_groups(&wordcloud.font, &reports)?;
            }
        }
        Ok(reports)
    }

    /// 每组一张对比图，组里没有处理过的区就跳过
    pub fn render_groups(&self, font: &FontVec, reports: &[RegionReport]) -> Result<Vec<PathBuf>> {
        let groups = &self.config.report.groups;
        let layout = GroupLayout::new(groups.top_k);
        let mut saved = vec![];

        for (index, members) in groups.members.iter().enumerate() {
            let selected = group::select_members(members, reports);
            if selected.is_empty() {
                warn!("{} has no processed regions, skipping", group::group_name(index));
                continue;
            }

            let mut panels = Vec::with_capacity(selected.len());
            for report in selected {
                let cloud = match &report.cloud_image {
                    Some(path) => Some(image::open(path)?.to_rgba8()),
                    None => {
                        warn!("no word cloud for {}", report.region);
                        None
                    }
                };
                panels.push(GroupPanel {
                    region: &report.region,
                    rows: &report.rows,
                    cloud,
                });
            }

            let title = group::group_title(&groups.prefix, groups.top_k, index);
            let image = group::render_group(font, &title, &panels, layout);
            fs::create_dir_all(&self.config.input.output_dir)?;
            let name = group::group_file_name(&groups.prefix, groups.top_k, index);
            let path = self.config.input.output_dir.join(name);
            image.save(&path)?;
            info!("saved group comparison {}", path.display());
            saved.push(path);
        }

        Ok(saved)
    }

    /// Lists documents and pairs each with its mask. Missing folders give an
    /// empty list, unmatched documents are skipped.
    pub fn discover(&self) -> Result<Vec<Job>> {
        let input = &self.config.input;
        let extractor = RegionExtractor::new(&input.region_suffixes)?;

        if !input.documents_dir.is_dir() {
            warn!("documents folder {} not found", input.documents_dir.display());
            return Ok(vec![]);
        }
        let documents = list_files(&input.documents_dir)?;

        let masks_dir = match input.masks() {
            Some(masks_dir) if !masks_dir.is_dir() => {
                warn!("mask folder {} not found", masks_dir.display());
                return Ok(vec![]);
            }
            masks_dir => masks_dir,
        };
        let assets = match masks_dir {
            Some(masks_dir) => list_files(masks_dir)?,
            None => vec![],
        };
        debug!("available masks: {assets:?}");
        let matcher = RegionMatcher::new(extractor, assets);

        let mut jobs = vec![];
        for document in documents {
            if has_extension(&document, WORKBOOK_EXTENSION) {
                info!("skipping workbook {document}, convert it to text first");
                continue;
            }
            if !has_extension(&document, DOCUMENT_EXTENSION) {
                continue;
            }

            let region = matcher.extractor().extract(&document).to_string();
            let mask = match masks_dir {
                Some(masks_dir) => match matcher.match_document(&document) {
                    Some(asset) => Some(masks_dir.join(asset)),
                    None => {
                        warn!("no mask for {document} (looked for {region}), skipping");
                        continue;
                    }
                },
                None => None,
            };

            jobs.push(Job {
                document: input.documents_dir.join(&document),
                region,
                mask,
            });
        }

        if jobs.is_empty() {
            warn!("no documents to process in {}", input.documents_dir.display());
        }
        Ok(jobs)
    }

    pub fn aggregate(&self, text: &str) -> Vocabulary {
        Aggregator::new(self.segmenter, self.stop_words, self.config.aggregation.clone())
            .aggregate(text)
    }

    pub fn process(&self, job: &Job) -> Result<RegionReport> {
        match &job.mask {
            Some(mask) => info!("processing {} (mask {})", job.region, mask.display()),
            None => info!("processing {}", job.region),
        }

        let text = fs::read_to_string(&job.document).map_err(|source| Error::ReadFile {
            path: job.document.clone(),
            source,
        })?;
        let vocabulary = self.aggregate(&text);
        debug!("{}: {} distinct words", job.region, vocabulary.len());

        let mut report = RegionReport {
            region: job.region.clone(),
            document: job.document.clone(),
            mask: job.mask.clone(),
            vocabulary_size: vocabulary.len(),
            total: vocabulary.total(),
            rows: report::rows(&vocabulary, self.config.report.top_k),
            cloud_image: None,
            table_image: None,
        };

        let Some(wordcloud) = &self.wordcloud else {
            return Ok(report);
        };
        fs::create_dir_all(&self.config.input.output_dir)?;

        if self.config.cloud.enabled {
            if vocabulary.is_empty() {
                warn!("{} has no words left, no word cloud", job.region);
            } else {
                let path = self.config.input.output_dir.join(cloud_file_name(&job.region));
                self.render_cloud(wordcloud, &vocabulary, job.mask.as_deref())?
                    .save(&path)?;
                info!("saved word cloud {}", path.display());
                report.cloud_image = Some(path);
            }
        }

        if self.config.table.enabled {
            let table = &self.config.table;
            let rows = report::rows(&vocabulary, table.rows);
            let image = table::render_frequency_table(
                &wordcloud.font,
                &job.region,
                &rows,
                TableLayout::new(table.rows, table.blocks),
            );
            let path = self.config.input.output_dir.join(table_file_name(&job.region));
            image.save(&path)?;
            info!("saved frequency table {}", path.display());
            report.table_image = Some(path);
        }

        Ok(report)
    }

    fn render_cloud(
        &self,
        wordcloud: &WordCloud,
        vocabulary: &Vocabulary,
        mask: Option<&Path>,
    ) -> Result<image::RgbaImage> {
        let size = match mask {
            Some(mask) => WordCloudSize::FromMask(mask_from_image(&image::open(mask)?)),
            None => WordCloudSize::FromDimensions {
                width: self.config.cloud.width,
                height: self.config.cloud.height,
            },
        };

        Ok(wordcloud.generate_from_vocabulary(vocabulary, size))
    }
}

fn build_wordcloud(cloud: &CloudConfig, font: FontVec) -> Result<WordCloud> {
    let max_font_size = (cloud.max_font_size > 0.0).then_some(cloud.max_font_size);

    Ok(WordCloud::new(font)
        .with_background_color(cloud.background()?)
        .with_color_scheme(cloud.color_scheme()?)
        .with_max_words(cloud.max_words)
        .with_max_font_size(max_font_size)
        .with_min_font_size(cloud.min_font_size)
        .with_prefer_horizontal(cloud.prefer_horizontal)
        .with_relative_font_scaling(cloud.relative_scaling)
        .with_rng_seed(cloud.seed))
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Names of the regular files in `dir`, sorted.
fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => warn!("skipping non UTF-8 file name {name:?}"),
        }
    }
    names.sort();
    Ok(names)
}
