//! Field-set driven record extraction
//!
//! [`Extractor::extract`] walks a [`FieldSet`] in declaration order and
//! resolves every field against a [`Document`]. Faults are contained per
//! field: a broken selector or a failing transform turns that one field into
//! [`FieldStatus::Missing`] and extraction carries on with the next.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::document::{Document, Node, SelectorCandidate};
use crate::error::{DocumentError, SpecError, TransformError};
use crate::field::{Cardinality, FieldSet, FieldSpec, FieldValue, PartSpec, SubRecord};
use crate::transform::{accepts_all, apply_all, NodeFilter, Transform};

/// Outcome of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Found,
    Defaulted,
    Missing,
}

/// Per-field diagnostics kept alongside the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    /// Index of the selector candidate that produced the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<usize>,
    /// Nodes (or containers) matched by that candidate
    pub matched: usize,
    /// Composite containers dropped for lacking a required part
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

/// Field name to value, in declaration order
pub type Record = IndexMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub record: Record,
    pub manifest: IndexMap<String, FieldStatus>,
    pub reports: IndexMap<String, FieldReport>,
    pub extracted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl ExtractionResult {
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.record.get(field)
    }

    pub fn status(&self, field: &str) -> Option<FieldStatus> {
        self.manifest.get(field).copied()
    }

    pub fn report(&self, field: &str) -> Option<&FieldReport> {
        self.reports.get(field)
    }

    /// Names of fields flagged missing, in declaration order
    pub fn missing(&self) -> Vec<&str> {
        self.manifest
            .iter()
            .filter(|(_, status)| **status == FieldStatus::Missing)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn count(&self, status: FieldStatus) -> usize {
        self.manifest.values().filter(|s| **s == status).count()
    }

    pub fn is_complete(&self) -> bool {
        self.count(FieldStatus::Missing) == 0
    }
}

#[derive(Debug, Error)]
enum FieldFault {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

#[derive(Debug, Default)]
struct Resolved {
    value: Option<FieldValue>,
    candidate: Option<usize>,
    matched: usize,
    skipped: usize,
}

/// Extracts records for one validated field set
#[derive(Debug, Clone)]
pub struct Extractor {
    fields: FieldSet,
}

impl Extractor {
    pub fn new(fields: FieldSet) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Resolve every field against `document`. Never fails; degraded fields
    /// are reported through the manifest.
    pub fn extract<D: Document>(&self, document: &D) -> ExtractionResult {
        let capacity = self.fields.len();
        let mut record = Record::with_capacity(capacity);
        let mut manifest = IndexMap::with_capacity(capacity);
        let mut reports = IndexMap::with_capacity(capacity);

        for spec in self.fields.fields() {
            let (value, status, report) = match resolve(document, spec) {
                Ok(resolved) => {
                    let report = FieldReport {
                        candidate: resolved.candidate,
                        matched: resolved.matched,
                        skipped: resolved.skipped,
                        fault: None,
                    };
                    match resolved.value {
                        Some(value) => (value, FieldStatus::Found, report),
                        None if spec.required => (spec.placeholder(), FieldStatus::Missing, report),
                        None => (spec.default_value(), FieldStatus::Defaulted, report),
                    }
                }
                Err(fault) => {
                    warn!(field = %spec.name, error = %fault, "field extraction failed");
                    let report = FieldReport {
                        fault: Some(fault.to_string()),
                        ..FieldReport::default()
                    };
                    (spec.placeholder(), FieldStatus::Missing, report)
                }
            };

            debug!(
                field = %spec.name,
                ?status,
                candidate = ?report.candidate,
                matched = report.matched,
                skipped = report.skipped,
                "resolved field"
            );
            record.insert(spec.name.clone(), value);
            manifest.insert(spec.name.clone(), status);
            reports.insert(spec.name.clone(), report);
        }

        let result = ExtractionResult {
            record,
            manifest,
            reports,
            extracted_at: Utc::now(),
            source_url: None,
        };
        info!(
            fields = capacity,
            found = result.count(FieldStatus::Found),
            defaulted = result.count(FieldStatus::Defaulted),
            missing = result.count(FieldStatus::Missing),
            "extraction complete"
        );
        result
    }
}

/// Validate `specs` and extract them from `document` in one call
pub fn extract<D: Document>(
    document: &D,
    specs: &[FieldSpec],
) -> Result<ExtractionResult, SpecError> {
    let fields = FieldSet::new(specs.to_vec())?;
    Ok(Extractor::new(fields).extract(document))
}

fn resolve<D: Document>(document: &D, spec: &FieldSpec) -> Result<Resolved, FieldFault> {
    match (spec.cardinality, spec.is_composite()) {
        (Cardinality::Single, _) => resolve_single(document, spec),
        (Cardinality::Many, false) => resolve_many(document, spec),
        (Cardinality::Many, true) => resolve_composite(document, spec),
    }
}

/// Read, filter and transform one node. `None` when it does not count as a match.
fn node_value<N: Node>(
    node: &N,
    candidate: &SelectorCandidate,
    filters: &[NodeFilter],
    transforms: &[Transform],
) -> Result<Option<String>, TransformError> {
    let Some(raw) = candidate.read(node) else {
        return Ok(None);
    };
    if !accepts_all(filters, &raw)? {
        return Ok(None);
    }
    let value = apply_all(transforms, &raw)?;
    Ok((!value.is_empty()).then_some(value))
}

fn resolve_single<D: Document>(document: &D, spec: &FieldSpec) -> Result<Resolved, FieldFault> {
    for (idx, candidate) in spec.selectors.iter().enumerate() {
        let nodes = document.query(&candidate.css)?;
        for node in &nodes {
            if let Some(value) = node_value(node, candidate, &spec.filters, &spec.transforms)? {
                return Ok(Resolved {
                    value: Some(FieldValue::Text(value)),
                    candidate: Some(idx),
                    matched: nodes.len(),
                    skipped: 0,
                });
            }
        }
    }
    Ok(Resolved::default())
}

fn resolve_many<D: Document>(document: &D, spec: &FieldSpec) -> Result<Resolved, FieldFault> {
    for (idx, candidate) in spec.selectors.iter().enumerate() {
        let nodes = document.query(&candidate.css)?;
        let mut values = Vec::with_capacity(nodes.len());
        for node in &nodes {
            if let Some(value) = node_value(node, candidate, &spec.filters, &spec.transforms)? {
                values.push(value);
            }
        }
        if !values.is_empty() {
            let matched = values.len();
            return Ok(Resolved {
                value: Some(FieldValue::List(values)),
                candidate: Some(idx),
                matched,
                skipped: 0,
            });
        }
    }

    // Nothing matched: an empty list is a legitimate answer for optional fields
    let value = (!spec.required).then(|| FieldValue::List(Vec::new()));
    Ok(Resolved {
        value,
        ..Resolved::default()
    })
}

fn resolve_composite<D: Document>(document: &D, spec: &FieldSpec) -> Result<Resolved, FieldFault> {
    for (idx, candidate) in spec.selectors.iter().enumerate() {
        let mut containers = Vec::new();
        for node in document.query(&candidate.css)? {
            if spec.filters.is_empty() || accepts_all(&spec.filters, &node.text_content())? {
                containers.push(node);
            }
        }
        if containers.is_empty() {
            continue;
        }

        let mut records = Vec::with_capacity(containers.len());
        let mut skipped = 0;
        for (position, container) in containers.iter().enumerate() {
            match assemble(container, &spec.parts) {
                Some(record) => records.push(record),
                None => {
                    debug!(field = %spec.name, position, "skipping incomplete container");
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            warn!(
                field = %spec.name,
                skipped,
                kept = records.len(),
                "skipped incomplete containers"
            );
        }

        let value = if records.is_empty() && spec.required {
            None
        } else {
            Some(FieldValue::Records(records))
        };
        return Ok(Resolved {
            value,
            candidate: Some(idx),
            matched: containers.len(),
            skipped,
        });
    }

    let value = (!spec.required).then(|| FieldValue::Records(Vec::new()));
    Ok(Resolved {
        value,
        ..Resolved::default()
    })
}

/// Build one sub-record, or `None` when a required part is absent
fn assemble<N: Node>(container: &N, parts: &[PartSpec]) -> Option<SubRecord> {
    let mut record = SubRecord::with_capacity(parts.len());
    for part in parts {
        let value = match resolve_part(container, part) {
            Ok(value) => value,
            Err(fault) => {
                warn!(part = %part.name, error = %fault, "part extraction failed");
                None
            }
        };
        match value {
            Some(value) => {
                record.insert(part.name.clone(), value);
            }
            None if part.required => return None,
            None => {
                record.insert(part.name.clone(), part.default.clone().unwrap_or_default());
            }
        }
    }
    Some(record)
}

fn resolve_part<N: Node>(container: &N, part: &PartSpec) -> Result<Option<String>, FieldFault> {
    for candidate in &part.selectors {
        for node in container.query(&candidate.css)? {
            if let Some(value) = node_value(&node, candidate, &part.filters, &part.transforms)? {
                return Ok(Some(value));
            }
        }
    }
    Ok(None)
}
