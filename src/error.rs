use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("font file {0} is not a valid font")]
    InvalidFont(PathBuf),

    #[error("invalid color {value:?}: {source}")]
    Color {
        value: String,
        #[source]
        source: csscolorparser::ParseColorError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("configuration serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("unable to open browser for {url}: {source}")]
    Browser {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no sheets in workbook")]
    EmptyWorkbook,
}
