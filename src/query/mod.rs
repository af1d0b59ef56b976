//! Path queries over parsed documents
//!
//! CDD Principle: Query Service - A small absolute-path subset, evaluated breadth-first
//! - Expressions are parsed once and reused across documents
//! - Evaluation is read-only and never fails; no match means an empty result

use crate::domain::violations::{GuardianError, GuardianResult};
use crate::xml::{Document, ElementRef};
use std::fmt;
use std::str::FromStr;

/// One step of a path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Children with exactly this tag name
    Tag(String),
    /// Any child element
    Wildcard,
}

impl Segment {
    fn matches(&self, element: &ElementRef<'_>) -> bool {
        match self {
            Segment::Tag(name) => element.name() == name,
            Segment::Wildcard => true,
        }
    }
}

/// An absolute path such as `/project/profiles/profile/properties/*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    segments: Vec<Segment>,
}

impl PathExpression {
    /// Parse the textual form. The first segment names the root element.
    pub fn parse(expression: &str) -> GuardianResult<Self> {
        let rest = expression.strip_prefix('/').ok_or_else(|| {
            GuardianError::pattern(format!(
                "Path expression '{expression}' must be absolute"
            ))
        })?;

        let segments = rest
            .split('/')
            .map(|part| match part.trim() {
                "" => Err(GuardianError::pattern(format!(
                    "Path expression '{expression}' has an empty segment"
                ))),
                "*" => Ok(Segment::Wildcard),
                name => Ok(Segment::Tag(name.to_string())),
            })
            .collect::<GuardianResult<Vec<_>>>()?;

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Evaluate against a document, returning matches in document order
    pub fn evaluate<'a>(&self, document: &'a Document) -> Vec<ElementRef<'a>> {
        let Some((first, rest)) = self.segments.split_first() else {
            return Vec::new();
        };

        let root = document.root();
        let mut candidates = if first.matches(&root) {
            vec![root]
        } else {
            Vec::new()
        };

        for segment in rest {
            if candidates.is_empty() {
                break;
            }
            candidates = candidates
                .iter()
                .flat_map(|candidate| candidate.child_elements())
                .filter(|child| segment.matches(child))
                .collect();
        }

        candidates
    }
}

impl FromStr for PathExpression {
    type Err = GuardianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Tag(name) => write!(f, "/{name}")?,
                Segment::Wildcard => write!(f, "/*")?,
            }
        }
        Ok(())
    }
}

/// Find all elements matching `expression`
pub fn query<'a>(document: &'a Document, expression: &PathExpression) -> Vec<ElementRef<'a>> {
    tracing::debug!("Finding by path: {}", expression);
    let matches = expression.evaluate(document);
    tracing::debug!(
        "Size of collection matching \"{}\": {}",
        expression,
        matches.len()
    );
    matches
}
