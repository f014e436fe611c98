//! Search predicate types and their in-process evaluation.
//!
//! A [`SearchPredicateSet`] is what the predicate builder produces and what
//! document stores consume: a creation date range plus per-field predicates.

use serde::{Deserialize, Serialize};

use crate::config::DmsConfig;
use crate::error::{Error, Result};
use crate::models::{IndexValue, IndexedDocument};
use crate::temporal::DateRange;

/// A predicate on one secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldPredicate {
    /// Stored value equals `value` (string and integer fields).
    Exact { label: String, value: IndexValue },
    /// Stored date lies within the inclusive range (date fields).
    DateRange { label: String, range: DateRange },
}

impl FieldPredicate {
    pub fn label(&self) -> &str {
        match self {
            Self::Exact { label, .. } | Self::DateRange { label, .. } => label,
        }
    }

    /// Evaluate against a document's stored indexes.
    ///
    /// A document lacking the index never matches.
    pub fn matches(&self, doc: &IndexedDocument, config: &DmsConfig) -> bool {
        let Some(stored) = doc.index(self.label()) else {
            return false;
        };
        match self {
            Self::Exact { value, .. } => stored == value.canonical(),
            Self::DateRange { range, .. } => range.contains_stored(
                stored,
                config.unbounded_date_floor,
                config.unbounded_date_ceiling,
            ),
        }
    }

    /// Human readable form, e.g. `Report Date: (from: 30/03/2012 to: 01/01/2100)`.
    pub fn describe(&self, config: &DmsConfig) -> String {
        match self {
            Self::Exact { label, value } => format!("{}: {}", label, value.display(config)),
            Self::DateRange { label, range } => {
                format!("{}: {}", label, describe_range(range, config))
            }
        }
    }
}

fn describe_range(range: &DateRange, config: &DmsConfig) -> String {
    let (from, to) = range.resolve(config.unbounded_date_floor, config.unbounded_date_ceiling);
    format!(
        "(from: {} to: {})",
        config.format_date(from),
        config.format_date(to)
    )
}

/// Creation date range plus field predicates, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPredicateSet {
    /// Range on the document creation date; unbounded sides match everything.
    pub creation_date: DateRange,

    #[serde(default)]
    pub predicates: Vec<FieldPredicate>,
}

impl SearchPredicateSet {
    pub fn new(creation_date: DateRange) -> Self {
        Self {
            creation_date,
            predicates: Vec::new(),
        }
    }

    pub fn with_predicate(mut self, predicate: FieldPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// True when there are no field predicates and the creation range is open.
    pub fn has_no_criteria(&self) -> bool {
        self.predicates.is_empty() && self.creation_date.is_unbounded()
    }

    /// Refuse a criteria-less search unless the caller confirmed it.
    pub fn require_criteria(&self, confirmed_all: bool) -> Result<()> {
        if self.has_no_criteria() && !confirmed_all {
            return Err(Error::NoSearchCriteria);
        }
        Ok(())
    }

    /// Evaluate the whole set against a document.
    pub fn matches(&self, doc: &IndexedDocument, config: &DmsConfig) -> bool {
        self.creation_date.contains(
            doc.creation_date,
            config.unbounded_date_floor,
            config.unbounded_date_ceiling,
        ) && self.predicates.iter().all(|p| p.matches(doc, config))
    }

    /// One line per criterion, creation date first.
    pub fn describe(&self, config: &DmsConfig) -> Vec<String> {
        let mut lines = vec![format!(
            "Creation Date: {}",
            describe_range(&self.creation_date, config)
        )];
        lines.extend(self.predicates.iter().map(|p| p.describe(config)));
        lines
    }
}
