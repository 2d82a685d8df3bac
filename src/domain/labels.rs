//! Label and description catalogs.
//!
//! A [`LabelCatalog`] is an ordered sequence of label strings whose index
//! positions correspond to index positions in the model output vector,
//! plus an optional description per label for display. Catalogs are static
//! configuration data loaded by the caller; the built-in
//! [`fruit_catalog`] matches the bundled fruit model.

use crate::core::errors::ClassifyError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered labels with optional per-label descriptions.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    labels: Vec<Arc<str>>,
    descriptions: HashMap<Arc<str>, Arc<str>>,
}

/// Serde form of a catalog, for JSON configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Ordered labels, index-aligned with the model output.
    pub labels: Vec<String>,
    /// Descriptions keyed by label. Labels without one are fine.
    #[serde(default)]
    pub descriptions: HashMap<String, String>,
}

impl LabelCatalog {
    /// Builds a catalog from an ordered sequence of labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            descriptions: HashMap::new(),
        }
    }

    /// Parses a catalog from newline-separated label text, one label per
    /// line. Blank lines and surrounding whitespace are ignored.
    pub fn from_lines(text: &str) -> Self {
        Self::from_labels(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        )
    }

    /// Parses a catalog (labels plus descriptions) from JSON.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the JSON does not parse into a [`CatalogFile`].
    pub fn from_json(json: &str) -> Result<Self, ClassifyError> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| ClassifyError::config_error(format!("invalid catalog JSON: {e}")))?;
        Ok(Self::from(file))
    }

    /// Registers a description for a label, builder-style.
    pub fn with_description(mut self, label: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> Self {
        self.descriptions.insert(label.into(), text.into());
        self
    }

    /// Registers a description for a label.
    pub fn add_description(&mut self, label: impl Into<Arc<str>>, text: impl Into<Arc<str>>) {
        self.descriptions.insert(label.into(), text.into());
    }

    /// Number of labels in the catalog.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the catalog has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The label at an index position.
    pub fn get(&self, index: usize) -> Option<&Arc<str>> {
        self.labels.get(index)
    }

    /// All labels in order.
    pub fn labels(&self) -> &[Arc<str>] {
        &self.labels
    }

    /// Looks up the description for a label, if one was registered.
    pub fn description(&self, label: &str) -> Option<&Arc<str>> {
        self.descriptions.get(label)
    }
}

impl From<CatalogFile> for LabelCatalog {
    fn from(file: CatalogFile) -> Self {
        let mut catalog = Self::from_labels(file.labels);
        for (label, text) in file.descriptions {
            catalog.add_description(label, text);
        }
        catalog
    }
}

static FRUIT_CATALOG: Lazy<LabelCatalog> = Lazy::new(|| {
    LabelCatalog::from_labels([
        "apple scab",
        "rotten apple",
        "orange",
        "banana",
        "apple",
    ])
    .with_description(
        "apple scab",
        "A common fungal disease of apple trees caused by Venturia inaequalis, \
         producing dark scabby lesions on leaves and fruit. Thrives in wet \
         weather between 17-25 degrees C and overwinters in fallen leaves.",
    )
    .with_description(
        "banana",
        "An excellent source of potassium, vitamin B6 and fiber; supports \
         energy levels and digestion.",
    )
    .with_description(
        "apple",
        "Rich in vitamin C, antioxidants and fiber; good for heart health \
         and weight management.",
    )
});

/// The built-in catalog for the bundled fruit classification model.
///
/// Not every label carries a description; lookups for the others simply
/// return nothing.
pub fn fruit_catalog() -> LabelCatalog {
    FRUIT_CATALOG.clone()
}
