//! Field specifications
//!
//! A [`FieldSpec`] says where one output field lives in the document and how
//! to clean it up. A [`FieldSet`] is a validated, ordered list of them; it is
//! built once from configuration and reused for every extraction.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{parse_selector, SelectorCandidate};
use crate::error::SpecError;
use crate::transform::{NodeFilter, Transform};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// First matching node's value
    #[default]
    Single,
    /// Every matching node, in document order
    Many,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Single => "single",
            Cardinality::Many => "many",
        }
    }
}

/// One entry of a composite field, keyed by part name
pub type SubRecord = IndexMap<String, String>;

/// Value of one field in an extracted record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Records(Vec<SubRecord>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Records(records) => records.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[SubRecord]> {
        match self {
            FieldValue::Records(records) => Some(records),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

impl From<Vec<SubRecord>> for FieldValue {
    fn from(records: Vec<SubRecord>) -> Self {
        FieldValue::Records(records)
    }
}

/// One part of a composite field, resolved inside each container node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSpec {
    pub name: String,
    pub selectors: Vec<SelectorCandidate>,
    /// Containers without this part are skipped
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<Transform>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<NodeFilter>,
}

impl PartSpec {
    pub fn new<I, S>(name: impl Into<String>, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectorCandidate>,
    {
        Self {
            name: name.into(),
            selectors: selectors.into_iter().map(Into::into).collect(),
            required: false,
            default: None,
            transforms: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn transform(mut self, t: Transform) -> Self {
        self.transforms.push(t);
        self
    }

    pub fn filter(mut self, f: NodeFilter) -> Self {
        self.filters.push(f);
        self
    }
}

/// How to obtain one field of the output record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Tried in order; the first that yields a match wins
    pub selectors: Vec<SelectorCandidate>,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<Transform>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<NodeFilter>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    /// Non-empty for composite fields: one sub-record per container node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<PartSpec>,
}

impl FieldSpec {
    fn with_cardinality<I, S>(
        name: impl Into<String>,
        selectors: I,
        cardinality: Cardinality,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectorCandidate>,
    {
        Self {
            name: name.into(),
            selectors: selectors.into_iter().map(Into::into).collect(),
            cardinality,
            transforms: Vec::new(),
            filters: Vec::new(),
            required: false,
            default: None,
            parts: Vec::new(),
        }
    }

    pub fn single<I, S>(name: impl Into<String>, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectorCandidate>,
    {
        Self::with_cardinality(name, selectors, Cardinality::Single)
    }

    pub fn many<I, S>(name: impl Into<String>, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectorCandidate>,
    {
        Self::with_cardinality(name, selectors, Cardinality::Many)
    }

    /// Composite field over container nodes matched by `selectors`
    pub fn composite<I, S>(name: impl Into<String>, selectors: I, parts: Vec<PartSpec>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectorCandidate>,
    {
        let mut spec = Self::with_cardinality(name, selectors, Cardinality::Many);
        spec.parts = parts;
        spec
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<FieldValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn transform(mut self, t: Transform) -> Self {
        self.transforms.push(t);
        self
    }

    pub fn filter(mut self, f: NodeFilter) -> Self {
        self.filters.push(f);
        self
    }

    pub fn is_composite(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Empty value of this field's shape, used for missing fields
    pub fn placeholder(&self) -> FieldValue {
        match (self.cardinality, self.is_composite()) {
            (Cardinality::Single, _) => FieldValue::Text(String::new()),
            (Cardinality::Many, false) => FieldValue::List(Vec::new()),
            (Cardinality::Many, true) => FieldValue::Records(Vec::new()),
        }
    }

    /// Value substituted when nothing matched and the field is optional
    pub fn default_value(&self) -> FieldValue {
        self.default.clone().unwrap_or_else(|| self.placeholder())
    }

    fn validate(&self) -> Result<(), SpecError> {
        if self.name.trim().is_empty() {
            return Err(SpecError::EmptyName);
        }
        if self.selectors.is_empty() {
            return Err(SpecError::NoSelectors(self.name.clone()));
        }
        if self.is_composite() && self.cardinality != Cardinality::Many {
            return Err(SpecError::CompositeNotMany(self.name.clone()));
        }

        let default_fits = match (&self.default, self.cardinality) {
            (None, _) => true,
            (Some(FieldValue::Text(_)), Cardinality::Single) => true,
            (Some(FieldValue::List(_)), Cardinality::Many) => true,
            (Some(FieldValue::Records(_)), Cardinality::Many) => self.is_composite(),
            _ => false,
        };
        if !default_fits {
            return Err(SpecError::DefaultShape {
                field: self.name.clone(),
                cardinality: self.cardinality.as_str().to_string(),
            });
        }
        // An optional `many` field with no match is found empty, never defaulted
        let inert_default = self.default.as_ref().is_some_and(|d| !d.is_empty());
        if self.cardinality == Cardinality::Many && inert_default {
            return Err(SpecError::ManyDefault(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for part in &self.parts {
            if part.name.trim().is_empty() {
                return Err(SpecError::EmptySubFieldName {
                    field: self.name.clone(),
                });
            }
            if !seen.insert(part.name.as_str()) {
                return Err(SpecError::DuplicateSubField {
                    field: self.name.clone(),
                    sub_field: part.name.clone(),
                });
            }
            if part.selectors.is_empty() {
                return Err(SpecError::NoSubSelectors {
                    field: self.name.clone(),
                    sub_field: part.name.clone(),
                });
            }
            for candidate in &part.selectors {
                parse_selector(&candidate.css).map_err(|e| SpecError::MalformedSubSelector {
                    field: self.name.clone(),
                    sub_field: part.name.clone(),
                    selector: candidate.css.clone(),
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct FieldSetFile {
    fields: Vec<FieldSpec>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldSetJson {
    Bare(Vec<FieldSpec>),
    Wrapped(FieldSetFile),
}

/// Validated, ordered field specifications with unique names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSet {
    fields: Vec<FieldSpec>,
}

impl FieldSet {
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SpecError> {
        if fields.is_empty() {
            return Err(SpecError::Empty);
        }
        let mut names = HashSet::new();
        for field in &fields {
            field.validate()?;
            if !names.insert(field.name.as_str()) {
                return Err(SpecError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    /// Parse a `[[fields]]` TOML document
    pub fn from_toml(toml_str: &str) -> Result<Self, SpecError> {
        let file: FieldSetFile =
            toml::from_str(toml_str).map_err(|e| SpecError::Parse(e.to_string()))?;
        Self::new(file.fields)
    }

    /// Parse either a bare JSON array of fields or `{"fields": [...]}`
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let parsed: FieldSetJson =
            serde_json::from_str(json).map_err(|e| SpecError::Parse(e.to_string()))?;
        let fields = match parsed {
            FieldSetJson::Bare(fields) => fields,
            FieldSetJson::Wrapped(file) => file.fields,
        };
        Self::new(fields)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert_eq!(FieldSet::new(vec![]), Err(SpecError::Empty));

        let dup = FieldSet::new(vec![
            FieldSpec::single("title", ["h1"]),
            FieldSpec::many("title", [".tag"]),
        ]);
        assert_eq!(dup, Err(SpecError::DuplicateField("title".to_string())));

        let unnamed = FieldSet::new(vec![FieldSpec::single("  ", ["h1"])]);
        assert_eq!(unnamed, Err(SpecError::EmptyName));

        let no_selectors = FieldSet::new(vec![FieldSpec::single("title", Vec::<&str>::new())]);
        assert_eq!(
            no_selectors,
            Err(SpecError::NoSelectors("title".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_composites() {
        let parts = vec![PartSpec::new("text", [".text"])];
        let mut single = FieldSpec::composite("reviews", [".review"], parts);
        single.cardinality = Cardinality::Single;
        assert_eq!(
            FieldSet::new(vec![single]),
            Err(SpecError::CompositeNotMany("reviews".to_string()))
        );

        let parts = vec![PartSpec::new("text", ["p[[["])];
        let malformed = FieldSpec::composite("reviews", [".review"], parts);
        assert!(matches!(
            FieldSet::new(vec![malformed]),
            Err(SpecError::MalformedSubSelector { .. })
        ));

        let twice = FieldSpec::composite(
            "reviews",
            [".review"],
            vec![
                PartSpec::new("text", ["p"]),
                PartSpec::new("text", ["span"]),
            ],
        );
        assert!(matches!(
            FieldSet::new(vec![twice]),
            Err(SpecError::DuplicateSubField { .. })
        ));
    }

    #[test]
    fn test_top_level_selectors_not_validated() {
        // Broken top-level selectors are a per-field fault at extraction time
        let broken = FieldSpec::single("title", ["h1[[["]);
        assert!(FieldSet::new(vec![broken]).is_ok());
    }

    #[test]
    fn test_default_shape() {
        let bad = FieldSpec::single("title", ["h1"]).with_default(vec!["a".to_string()]);
        assert!(matches!(
            FieldSet::new(vec![bad]),
            Err(SpecError::DefaultShape { .. })
        ));

        let bad = FieldSpec::many("tags", [".tag"]).with_default("none");
        assert!(matches!(
            FieldSet::new(vec![bad]),
            Err(SpecError::DefaultShape { .. })
        ));

        let ok = FieldSpec::many("tags", [".tag"]).with_default(Vec::<String>::new());
        assert!(FieldSet::new(vec![ok]).is_ok());
    }

    #[test]
    fn test_many_default_must_be_empty() {
        let langs = FieldSpec::many("langs", [".lang"]).with_default(vec!["Unknown".to_string()]);
        assert_eq!(
            FieldSet::new(vec![langs]),
            Err(SpecError::ManyDefault("langs".to_string()))
        );

        let mut fallback = SubRecord::new();
        fallback.insert("text".to_string(), "No reviews".to_string());
        let parts = vec![PartSpec::new("text", [".text"])];
        let reviews =
            FieldSpec::composite("reviews", [".review"], parts).with_default(vec![fallback]);
        assert_eq!(
            FieldSet::new(vec![reviews]),
            Err(SpecError::ManyDefault("reviews".to_string()))
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            FieldSpec::single("a", ["h1"]).placeholder(),
            FieldValue::Text(String::new())
        );
        assert_eq!(
            FieldSpec::many("a", ["li"]).placeholder(),
            FieldValue::List(vec![])
        );
        let composite = FieldSpec::composite("a", ["li"], vec![PartSpec::new("x", ["b"])]);
        assert_eq!(composite.placeholder(), FieldValue::Records(vec![]));
        assert_eq!(
            FieldSpec::single("a", ["h1"])
                .with_default("n/a")
                .default_value(),
            FieldValue::Text("n/a".to_string())
        );
    }

    #[test]
    fn test_from_toml() {
        let toml_str = r##"
            [[fields]]
            name = "title"
            selectors = ["h1", "meta[property='og:title'] @content"]
            required = true

            [[fields]]
            name = "tags"
            selectors = [".tag"]
            cardinality = "many"
            transforms = ["lowercase", { strip_prefix = "#" }]

            [[fields]]
            name = "reviews"
            selectors = [".review"]
            cardinality = "many"

            [[fields.parts]]
            name = "content"
            selectors = [".content"]
            required = true

            [[fields.parts]]
            name = "date"
            selectors = [".date"]
            default = "Date not available"
        "##;

        let set = FieldSet::from_toml(toml_str).unwrap();
        assert_eq!(
            set.names().collect::<Vec<_>>(),
            vec!["title", "tags", "reviews"]
        );

        let title = set.get("title").unwrap();
        assert!(title.required);
        assert_eq!(
            title.selectors[1].to_string(),
            "meta[property='og:title'] @content"
        );

        let tags = set.get("tags").unwrap();
        assert_eq!(tags.cardinality, Cardinality::Many);
        assert_eq!(tags.transforms.len(), 2);

        let reviews = set.get("reviews").unwrap();
        assert!(reviews.is_composite());
        assert_eq!(
            reviews.parts[1].default.as_deref(),
            Some("Date not available")
        );
    }

    #[test]
    fn test_from_json_forms() {
        let bare = r#"[{"name": "title", "selectors": ["h1"]}]"#;
        let wrapped = r#"{"fields": [{"name": "title", "selectors": ["h1"]}]}"#;
        assert_eq!(
            FieldSet::from_json(bare).unwrap(),
            FieldSet::from_json(wrapped).unwrap()
        );
        assert!(matches!(FieldSet::from_json("{"), Err(SpecError::Parse(_))));
    }
}
