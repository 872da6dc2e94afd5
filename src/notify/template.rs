//! Named-placeholder message templates.
//!
//! Placeholders are written `{name}`; `{{` and `}}` produce literal braces.
//! Templates are parsed once into segments and rendered per aggregate.

use regex::Regex;

use super::group::NotificationGroup;
use crate::{AppError, Result};

/// Placeholders every aggregate provides.
pub const IDENTITY_FIELDS: &[&str] = &["student_id", "first_name", "middle_name", "last_name"];

/// Placeholder provided only by grade aggregates.
pub const SUBJECTS_FIELD: &str = "subjects";

/// Placeholder provided only by document aggregates.
pub const DOCUMENT_FIELD: &str = "document";

const TOKEN_PATTERN: &str = r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}|[{}]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl MessageTemplate {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Template` on an unmatched `{` or `}` or an
    /// empty/invalid placeholder name.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = Regex::new(TOKEN_PATTERN)
            .map_err(|err| AppError::Template(format!("placeholder pattern: {err}")))?;

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut cursor = 0;

        for captures in tokens.captures_iter(source) {
            let Some(token) = captures.get(0) else {
                continue;
            };
            literal.push_str(&source[cursor..token.start()]);
            cursor = token.end();

            match (token.as_str(), captures.get(1)) {
                ("{{", _) => literal.push('{'),
                ("}}", _) => literal.push('}'),
                (_, Some(name)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name.as_str().to_owned()));
                }
                (stray, None) => {
                    return Err(AppError::Template(format!(
                        "unmatched {stray:?} at byte {} in {source:?}",
                        token.start()
                    )));
                }
            }
        }

        literal.push_str(&source[cursor..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_owned(),
            segments,
        })
    }

    /// The template text as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names referenced by the template, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Check that every placeholder is an identity field or one of `extra`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Template` naming the first unsupported placeholder.
    pub fn ensure_fields(&self, extra: &[&str]) -> Result<()> {
        match self
            .fields()
            .find(|name| !IDENTITY_FIELDS.contains(name) && !extra.contains(name))
        {
            Some(name) => Err(AppError::Template(format!(
                "unsupported placeholder {{{name}}} in {:?}",
                self.source
            ))),
            None => Ok(()),
        }
    }

    /// Render the template for one student aggregate.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Template` if a placeholder names a field the
    /// aggregate does not carry.
    pub fn render(&self, group: &NotificationGroup) -> Result<String> {
        let mut rendered = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Field(name) => {
                    let value = group.field(name).ok_or_else(|| {
                        AppError::Template(format!(
                            "field {name:?} is not available for student {}",
                            group.student_id
                        ))
                    })?;
                    rendered.push_str(&value);
                }
            }
        }
        Ok(rendered)
    }
}
