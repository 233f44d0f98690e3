use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not a readable docx archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("docx archive has no {0}")]
    MissingPart(&'static str),

    #[error("malformed document xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed document xml attribute: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("keyword {keyword:?} cannot be compiled: {source}")]
    Pattern {
        keyword: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid policy: {0}")]
    Policy(#[from] serde_json::Error),

    #[error("{0}")]
    Options(&'static str),

    #[error("rendered html lost text of paragraph {index}: expected {expected:?}, found {found:?}")]
    ContentMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
