// ── XML template rendering ──
//
// Templates are XML fragments with `{name}` placeholders. `{{` and `}}`
// produce literal braces. A template is parsed once into segments so its
// required-field set is known up front; rendering validates the supplied
// parameters against that set before producing any output.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use indexmap::IndexMap;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

// ── Template kinds ──────────────────────────────────────────────────

/// Logical template names, one per configuration domain.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum TemplateKind {
    HaConfig,
    HaInterface,
    Interface,
    Zone,
    VirtualRouter,
    StaticRoute,
    SecurityPolicy,
    SourceNat,
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Template '{template}' is malformed at byte {position}: {reason}")]
    Syntax {
        template: TemplateKind,
        position: usize,
        reason: &'static str,
    },

    #[error("Template '{template}' is missing parameter(s): {}", missing.join(", "))]
    MissingParameters {
        template: TemplateKind,
        missing: Vec<String>,
    },

    #[error("Template '{template}' parameter '{name}' is empty")]
    EmptyParameter { template: TemplateKind, name: String },

    #[error("Template '{template}' was not loaded")]
    NotLoaded { template: TemplateKind },
}

impl TemplateError {
    pub fn template(&self) -> TemplateKind {
        match self {
            Self::Syntax { template, .. }
            | Self::MissingParameters { template, .. }
            | Self::EmptyParameter { template, .. }
            | Self::NotLoaded { template } => *template,
        }
    }

    pub fn template_name(&self) -> &'static str {
        self.template().into()
    }
}

// ── Parameters ──────────────────────────────────────────────────────

/// Named substitution values. Insertion order is kept for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateParams(IndexMap<String, String>);

impl TemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A copy of `self` with every entry of `overrides` applied on top.
    pub fn overlay(&self, overrides: &TemplateParams) -> TemplateParams {
        let mut merged = self.clone();
        for (k, v) in &overrides.0 {
            merged.0.insert(k.clone(), v.clone());
        }
        merged
    }
}

impl From<IndexMap<String, String>> for TemplateParams {
    fn from(map: IndexMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TemplateParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ── Template ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed XML template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    kind: TemplateKind,
    segments: Vec<Segment>,
    required: BTreeSet<String>,
}

impl Template {
    /// Parse `source`, collecting the set of placeholder names.
    pub fn parse(kind: TemplateKind, source: &str) -> Result<Self, TemplateError> {
        let syntax = |position, reason| TemplateError::Syntax {
            template: kind,
            position,
            reason,
        };

        let mut segments = Vec::new();
        let mut required = BTreeSet::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|&(_, n)| n == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().is_some_and(|&(_, n)| n == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(syntax(pos, "unmatched '}'")),
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, ch)) => name.push(ch),
                            None => return Err(syntax(pos, "unclosed '{'")),
                        }
                    }
                    if !is_valid_field_name(&name) {
                        return Err(syntax(pos, "placeholder name must be an identifier"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    required.insert(name.clone());
                    segments.push(Segment::Field(name));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            kind,
            segments,
            required,
        })
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Placeholder names this template needs, sorted.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    /// Check `params` against the required-field set without rendering.
    pub fn validate(&self, params: &TemplateParams) -> Result<(), TemplateError> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| params.get(name).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TemplateError::MissingParameters {
                template: self.kind,
                missing,
            });
        }
        if let Some(name) = self
            .required
            .iter()
            .find(|name| params.get(name).is_some_and(|v| v.trim().is_empty()))
        {
            return Err(TemplateError::EmptyParameter {
                template: self.kind,
                name: name.clone(),
            });
        }
        Ok(())
    }

    /// Substitute every placeholder. Values are XML-escaped.
    pub fn render(&self, params: &TemplateParams) -> Result<String, TemplateError> {
        self.validate(params)?;

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    // validate() guarantees presence
                    if let Some(value) = params.get(name) {
                        out.push_str(&quick_xml::escape::escape(value));
                    }
                }
            }
        }
        Ok(out)
    }
}

fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ── Template set ────────────────────────────────────────────────────

/// All templates loaded for a run, keyed by kind.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: HashMap<TemplateKind, Template>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: Template) {
        self.templates.insert(template.kind(), template);
    }

    /// Parse `source` as `kind` and add it to the set.
    pub fn add_source(&mut self, kind: TemplateKind, source: &str) -> Result<(), TemplateError> {
        self.insert(Template::parse(kind, source)?);
        Ok(())
    }

    pub fn get(&self, kind: TemplateKind) -> Result<&Template, TemplateError> {
        self.templates
            .get(&kind)
            .ok_or(TemplateError::NotLoaded { template: kind })
    }

    pub fn contains(&self, kind: TemplateKind) -> bool {
        self.templates.contains_key(&kind)
    }

    pub fn render(&self, kind: TemplateKind, params: &TemplateParams) -> Result<String, TemplateError> {
        self.get(kind)?.render(params)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => {
                    write!(f, "{}", text.replace('{', "{{").replace('}', "}}"))?;
                }
                Segment::Field(name) => write!(f, "{{{name}}}")?,
            }
        }
        Ok(())
    }
}
