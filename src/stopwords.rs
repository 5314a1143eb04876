use std::{collections::HashSet, fs, io, path::Path};

use log::{debug, warn};

use crate::error::{Error, Result};

/// 换行符总是停用词
pub const NEWLINE: &str = "\n";

/// Immutable stop-word set. Always contains the newline token.
#[derive(Clone, Debug)]
pub struct StopWords {
    words: HashSet<String>,
}

impl Default for StopWords {
    fn default() -> Self {
        StopWords {
            words: HashSet::from([NEWLINE.to_string()]),
        }
    }
}

impl StopWords {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stop_words = Self::default();
        stop_words.words.extend(words.into_iter().map(Into::into));
        stop_words
    }

    /// One stop word per line.
    pub fn parse(content: &str) -> Self {
        Self::from_words(content.lines().map(|line| line.trim_end_matches('\r')))
    }

    /// Loads the stop-word file. A missing file is not an error: the
    /// built-in set (just the newline token) is used instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => {
                let stop_words = Self::parse(&content);
                debug!("loaded {} stop words from {}", stop_words.len(), path.display());
                Ok(stop_words)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "stop-word file {} not found, using the built-in stop words",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(source) => Err(Error::ReadFile {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
