//! SQL generation for search predicate sets over JSONB secondary indexes.
//!
//! Produces a WHERE clause fragment for `indexed_document d` plus the
//! parameters to bind, numbered after `param_offset` existing parameters.

use chrono::NaiveDate;

use dms_core::temporal::{format_iso, ISO_DATE_PATTERN};
use dms_core::{DmsConfig, FieldPredicate, SearchPredicateSet};

/// Type-safe parameter binding for generated SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    String(String),
    Date(NaiveDate),
}

/// Builds the WHERE fragment for a [`SearchPredicateSet`].
///
/// # Example
///
/// ```rust,ignore
/// let builder = IndexFilterQueryBuilder::new(&predicates, &config, 1);
/// let (sql, params) = builder.build();
/// // sql: "d.creation_date BETWEEN $2 AND $3 AND d.secondary_indexes ->> $4 = $5"
/// ```
pub struct IndexFilterQueryBuilder<'a> {
    predicates: &'a SearchPredicateSet,
    config: &'a DmsConfig,
    param_offset: usize,
}

impl<'a> IndexFilterQueryBuilder<'a> {
    pub fn new(predicates: &'a SearchPredicateSet, config: &'a DmsConfig, param_offset: usize) -> Self {
        Self {
            predicates,
            config,
            param_offset,
        }
    }

    /// SQL fragment and its parameters, in binding order.
    ///
    /// The creation date range is always present; open sides are resolved
    /// to the configured floor and ceiling.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::with_capacity(self.predicates.predicates.len() + 1);
        let mut params = Vec::new();

        let (from, to) = self.predicates.creation_date.resolve(
            self.config.unbounded_date_floor,
            self.config.unbounded_date_ceiling,
        );
        clauses.push(format!(
            "d.creation_date BETWEEN {} AND {}",
            self.push(&mut params, QueryParam::Date(from)),
            self.push(&mut params, QueryParam::Date(to)),
        ));

        for predicate in &self.predicates.predicates {
            match predicate {
                FieldPredicate::Exact { label, value } => {
                    let key = self.push(&mut params, QueryParam::String(label.clone()));
                    let val = self.push(&mut params, QueryParam::String(value.canonical()));
                    clauses.push(format!("d.secondary_indexes ->> {} = {}", key, val));
                }
                FieldPredicate::DateRange { label, range } => {
                    let (from, to) = range.resolve(
                        self.config.unbounded_date_floor,
                        self.config.unbounded_date_ceiling,
                    );
                    let key = self.push(&mut params, QueryParam::String(label.clone()));
                    let from = self.push(&mut params, QueryParam::String(format_iso(from)));
                    let to = self.push(&mut params, QueryParam::String(format_iso(to)));
                    // ISO text orders like the date
                    clauses.push(format!(
                        "(d.secondary_indexes ->> {key} ~ '{pattern}' \
                         AND (d.secondary_indexes ->> {key}) COLLATE \"C\" BETWEEN {from} AND {to})",
                        key = key,
                        pattern = ISO_DATE_PATTERN,
                        from = from,
                        to = to,
                    ));
                }
            }
        }

        (clauses.join(" AND "), params)
    }

    fn push(&self, params: &mut Vec<QueryParam>, param: QueryParam) -> String {
        params.push(param);
        format!("${}", self.param_offset + params.len())
    }
}
