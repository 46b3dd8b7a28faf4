//! Post-processing steps and node filters
//!
//! Both are plain data so that field sets can live in TOML or JSON and be
//! edited without touching code when a page changes shape.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;

/// A pure text transformation applied to a matched value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Trim,
    Lowercase,
    Uppercase,
    /// Collapse runs of whitespace into a single space
    CollapseWhitespace,
    StripPrefix(String),
    StripSuffix(String),
    Replace { from: String, to: String },
    /// Keep one capture group of a regex; faults when the pattern does not match
    Capture {
        pattern: String,
        #[serde(default = "default_group")]
        group: usize,
    },
}

fn default_group() -> usize {
    1
}

impl Transform {
    pub fn apply(&self, input: &str) -> Result<String, TransformError> {
        let out = match self {
            Transform::Trim => input.trim().to_string(),
            Transform::Lowercase => input.to_lowercase(),
            Transform::Uppercase => input.to_uppercase(),
            Transform::CollapseWhitespace => input.split_whitespace().collect::<Vec<_>>().join(" "),
            Transform::StripPrefix(prefix) => {
                let rest = input.strip_prefix(prefix.as_str());
                rest.unwrap_or(input).to_string()
            }
            Transform::StripSuffix(suffix) => {
                let rest = input.strip_suffix(suffix.as_str());
                rest.unwrap_or(input).to_string()
            }
            Transform::Replace { from, to } => input.replace(from.as_str(), to),
            Transform::Capture { pattern, group } => {
                let re = compile(pattern)?;
                let caps = re.captures(input).ok_or_else(|| TransformError::NoMatch {
                    pattern: pattern.clone(),
                    input: input.to_string(),
                })?;
                if *group >= caps.len() {
                    return Err(TransformError::MissingGroup {
                        pattern: pattern.clone(),
                        group: *group,
                    });
                }
                // An optional group that did not participate yields an empty value
                caps.get(*group)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default()
            }
        };
        Ok(out)
    }
}

/// Run a chain of transforms, then trim the result
pub fn apply_all(transforms: &[Transform], input: &str) -> Result<String, TransformError> {
    let mut value = input.to_string();
    for t in transforms {
        value = t.apply(&value)?;
    }
    Ok(value.trim().to_string())
}

/// A predicate a node's value must satisfy to count as a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeFilter {
    Contains(String),
    NotContains(String),
    /// Minimum length in characters
    MinLength(usize),
    Matches(String),
}

impl NodeFilter {
    pub fn accepts(&self, value: &str) -> Result<bool, TransformError> {
        Ok(match self {
            NodeFilter::Contains(needle) => value.contains(needle.as_str()),
            NodeFilter::NotContains(needle) => !value.contains(needle.as_str()),
            NodeFilter::MinLength(min) => value.chars().count() >= *min,
            NodeFilter::Matches(pattern) => compile(pattern)?.is_match(value),
        })
    }
}

/// True when `value` is non-empty and passes every filter
pub fn accepts_all(filters: &[NodeFilter], value: &str) -> Result<bool, TransformError> {
    if value.is_empty() {
        return Ok(false);
    }
    for f in filters {
        if !f.accepts(value)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn compile(pattern: &str) -> Result<Regex, TransformError> {
    Regex::new(pattern).map_err(|e| TransformError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
