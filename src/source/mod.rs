mod catalog;
mod error;
mod parsing;

pub use catalog::{read_tle_file, refresh, TleCatalog};
pub use error::SourceError;

/// Raw element set text as obtained from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TleLines {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

impl TleLines {
    pub fn new(name: Option<String>, line1: &str, line2: &str) -> Self {
        Self {
            name,
            line1: line1.to_string(),
            line2: line2.to_string(),
        }
    }

    /// Catalog number from columns 3-7 of line 1, if it is numeric.
    pub fn catalog_id(&self) -> Option<u32> {
        self.line1.get(2..7)?.trim().parse().ok()
    }
}

/// Provides element set text by catalog number.
pub trait TleSource: Send + Sync {
    fn fetch(&self, catalog_id: u32) -> Result<TleLines, SourceError>;
}
