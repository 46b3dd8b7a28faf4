//! Profile page extractor
//!
//! Turns a selector-addressed HTML page into a stable-shaped record:
//! - Field sets as configuration (TOML/JSON), with ordered selector fallbacks
//! - Per-field found/defaulted/missing manifest; one broken field never
//!   aborts the rest
//! - Composite fields (one sub-record per repeated container, e.g. reviews)
//! - Bounded "show more" expansion for live documents
//! - C ABI for embedding hosts

pub mod config;
pub mod document;
pub mod error;
pub mod expand;
pub mod extractor;
pub mod ffi;
pub mod field;
pub mod output;
pub mod profile;
pub mod transform;

pub use config::{OutputConfig, ScraperConfig};
pub use document::{Accessor, Document, HtmlDocument, Node, SelectorCandidate};
pub use error::{
    ConfigError, DocumentError, Error, ExpansionError, OutputError, SpecError, TransformError,
};
pub use expand::{expand, expand_within, Expandable, ExpansionConfig, ExpansionOutcome, StopReason};
pub use extractor::{extract, ExtractionResult, Extractor, FieldReport, FieldStatus, Record};
pub use ffi::*;
pub use field::{Cardinality, FieldSet, FieldSpec, FieldValue, PartSpec, SubRecord};
pub use output::{save_snapshot, snapshot_filename, Snapshot};
pub use profile::{guest_profile, profile_id};
pub use transform::{NodeFilter, Transform};
