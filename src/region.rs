use std::{collections::BTreeMap, path::Path};

use regex::Regex;

use crate::error::{Error, Result};

pub const MASK_EXTENSION: &str = "png";

/// 文件名去掉扩展名
pub fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
        .trim()
}

fn normalize(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

/// Pulls a region name such as `黄浦区` out of a filename.
pub struct RegionExtractor {
    regex: Regex,
}

impl Default for RegionExtractor {
    fn default() -> Self {
        RegionExtractor::new(&["区"]).expect("built-in region suffix is a valid pattern")
    }
}

impl RegionExtractor {
    pub fn new<S: AsRef<str>>(suffixes: &[S]) -> Result<Self> {
        if suffixes.is_empty() {
            return Err(Error::Config("at least one region suffix is required".into()));
        }

        let alternatives = suffixes
            .iter()
            .map(|suffix| regex::escape(suffix.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!(r"\S+(?:{alternatives})"))
            .map_err(|err| Error::Config(format!("invalid region suffix: {err}")))?;

        Ok(RegionExtractor { regex })
    }

    /// Longest whitespace-free run ending in a suffix, else the file stem.
    pub fn extract<'a>(&self, filename: &'a str) -> &'a str {
        match self.regex.find(filename) {
            Some(mat) => mat.as_str(),
            None => file_stem(filename),
        }
    }
}

/// Matches documents to mask images by name, without touching the filesystem.
pub struct RegionMatcher {
    extractor: RegionExtractor,
    //原始文件名，按主名查找
    stems: BTreeMap<String, String>,
    //小写主名和小写区名 -> 文件名
    index: BTreeMap<String, String>,
}

impl RegionMatcher {
    pub fn new<I, S>(extractor: RegionExtractor, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut assets: Vec<String> = assets
            .into_iter()
            .map(Into::into)
            .filter(|name| is_mask_file(name))
            .collect();
        assets.sort();

        let mut stems = BTreeMap::new();
        let mut index = BTreeMap::new();
        for asset in assets {
            let stem = file_stem(&asset).to_string();
            let region = extractor.extract(&asset).to_lowercase();

            index.entry(stem.to_lowercase()).or_insert_with(|| asset.clone());
            index.entry(region).or_insert_with(|| asset.clone());
            stems.entry(stem).or_insert(asset);
        }

        RegionMatcher {
            extractor,
            stems,
            index,
        }
    }

    pub fn extractor(&self) -> &RegionExtractor {
        &self.extractor
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    /// Finds the mask for `document`: exact stem, then region name, then a
    /// case- and space-insensitive stem comparison.
    pub fn match_document(&self, document: &str) -> Option<&str> {
        let stem = file_stem(document);

        if let Some(asset) = self.stems.get(stem) {
            return Some(asset);
        }

        let region = self.extractor.extract(document).to_lowercase();
        if let Some(asset) = self.index.get(&region) {
            return Some(asset);
        }

        let wanted = normalize(stem);
        self.index
            .iter()
            .find(|(key, _)| normalize(key) == wanted)
            .map(|(_, asset)| asset.as_str())
    }
}

pub fn is_mask_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(MASK_EXTENSION))
        .unwrap_or(false)
}
