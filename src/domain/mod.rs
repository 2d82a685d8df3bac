//! Domain types: label and description catalogs.

pub mod labels;

pub use labels::{fruit_catalog, CatalogFile, LabelCatalog};
