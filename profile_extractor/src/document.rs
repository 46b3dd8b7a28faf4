//! Hierarchical document access
//!
//! The extractor only needs two capabilities from a page: find nodes by
//! selector, and read a node's text, markup or attributes. [`Document`] and
//! [`Node`] capture exactly that; [`HtmlDocument`] implements them over the
//! scraper crate for saved pages and fixtures.

use std::fmt;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// A node returned by a selector query
pub trait Node: Sized {
    /// Concatenated descendant text, trimmed
    fn text_content(&self) -> String;

    /// Inner markup
    fn markup(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Query descendants of this node, in document order
    fn query(&self, selector: &str) -> Result<Vec<Self>, DocumentError>;
}

/// A document supporting selector queries
pub trait Document {
    type Node<'a>: Node
    where
        Self: 'a;

    /// All nodes matching `selector`, in document order
    fn query<'a>(&'a self, selector: &str) -> Result<Vec<Self::Node<'a>>, DocumentError>;
}

/// Parsed HTML snapshot
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn parse_fragment(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
        }
    }
}

impl fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlDocument").finish_non_exhaustive()
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, DocumentError> {
    Selector::parse(selector).map_err(|e| DocumentError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

impl Document for HtmlDocument {
    type Node<'a> = ElementRef<'a>;

    fn query<'a>(&'a self, selector: &str) -> Result<Vec<ElementRef<'a>>, DocumentError> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).collect())
    }
}

impl<'a> Node for ElementRef<'a> {
    fn text_content(&self) -> String {
        self.text().collect::<String>().trim().to_string()
    }

    fn markup(&self) -> String {
        self.inner_html()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(String::from)
    }

    fn query(&self, selector: &str) -> Result<Vec<Self>, DocumentError> {
        let selector = parse_selector(selector)?;
        Ok(self.select(&selector).collect())
    }
}

/// What to read from a matched node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    Text,
    Html,
    Attr(String),
}

/// One lookup strategy: a CSS selector plus an accessor.
///
/// Written as `css`, `css @html` or `css @attr-name`, e.g.
/// `a.profile-link @href`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SelectorCandidate {
    pub css: String,
    pub accessor: Accessor,
}

impl SelectorCandidate {
    pub fn text(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            accessor: Accessor::Text,
        }
    }

    pub fn attr(css: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            accessor: Accessor::Attr(name.into()),
        }
    }

    /// Read this candidate's value from a node, trimmed
    pub fn read<N: Node>(&self, node: &N) -> Option<String> {
        let raw = match &self.accessor {
            Accessor::Text => Some(node.text_content()),
            Accessor::Html => Some(node.markup()),
            Accessor::Attr(name) => node.attribute(name),
        };
        raw.map(|v| v.trim().to_string())
    }
}

impl From<&str> for SelectorCandidate {
    fn from(s: &str) -> Self {
        if let Some(at_pos) = s.rfind(" @") {
            let css = s[..at_pos].trim().to_string();
            let accessor = match s[at_pos + 2..].trim() {
                "text" | "innerText" => Accessor::Text,
                "html" | "innerHTML" => Accessor::Html,
                attr => Accessor::Attr(attr.to_string()),
            };
            return Self { css, accessor };
        }
        Self::text(s.trim())
    }
}

impl From<String> for SelectorCandidate {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<SelectorCandidate> for String {
    fn from(c: SelectorCandidate) -> Self {
        c.to_string()
    }
}

impl fmt::Display for SelectorCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.accessor {
            Accessor::Text => write!(f, "{}", self.css),
            Accessor::Html => write!(f, "{} @html", self.css),
            Accessor::Attr(name) => write!(f, "{} @{}", self.css, name),
        }
    }
}
