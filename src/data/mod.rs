//! Institution and collaboration data.
//!
//! ## Records
//! - `Entity`: an institution with a display name and a position
//! - `Relationship`: a collaboration between two institution positions
//!
//! ## Tables
//!
//! Both tables arrive as CSV. Rows are cleaned on load: a row without usable
//! coordinates is dropped and counted in a `TableReport`, it never reaches a
//! layer.
//!
//! ## Loading
//!
//! `LoadChannel` reads both tables on background threads and hands them back
//! to the UI thread only once both have resolved.

mod loader;
mod model;
mod table;

use thiserror::Error;

pub use loader::{DataSource, LoadChannel, LoadResult, LoadedData};
pub use model::{Entity, LngLat, Relationship};
pub use table::{
    entities_from_rows, parse_coordinate_pair, read_entities, read_relationships,
    relationships_from_rows, EntityRow, RelationshipRow, TableReport,
};

/// Errors that fail a whole table load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file could not be opened or read.
    #[error("failed to read {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },
    /// The source URL could not be fetched.
    #[error("failed to fetch {url}: {error}")]
    Http {
        url: String,
        #[source]
        error: reqwest::Error,
    },
    /// The CSV stream itself is unreadable.
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    /// The header row lacks a column every row needs.
    #[error("table is missing required column `{0}`")]
    MissingColumn(&'static str),
    /// A loader thread went away without reporting.
    #[error("{0} loader stopped before producing a result")]
    Join(&'static str),
}

/// Errors that drop a single row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("not a [lng, lat] pair: {0:?}")]
    InvalidCoordinatePair(String),
    #[error("coordinate out of range: ({lng}, {lat})")]
    OutOfRange { lng: f64, lat: f64 },
}
