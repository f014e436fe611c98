//! Query predicate building from normalized search input.

use chrono::NaiveDate;
use tracing::{debug, trace};

use dms_core::defaults::RESERVED_KEYS;
use dms_core::{
    DateRange, DmsConfig, Error, FieldKind, FieldPredicate, IndexValue, Result,
    SearchPredicateSet,
};
use dms_forms::{NormalizedEntry, NormalizedIndexSet, NormalizedValue};

/// Build the predicate set for a search.
///
/// The creation date range is always present (open sides unbounded). Text
/// and integer entries become exact matches; date entries become inclusive
/// ranges. A single date is padded by `date_search_padding_days` on each side
/// when `expand_single_date_search` is set, and covers just that day
/// otherwise. Date entries whose value did not parse as a date are rejected
/// with [`Error::InvalidDate`].
pub fn build_predicates(
    normalized: &NormalizedIndexSet,
    creation_date_from: Option<NaiveDate>,
    creation_date_to: Option<NaiveDate>,
    config: &DmsConfig,
) -> Result<SearchPredicateSet> {
    let mut set = SearchPredicateSet::new(DateRange::new(creation_date_from, creation_date_to));

    for entry in &normalized.entries {
        if RESERVED_KEYS.contains(&entry.label.as_str()) {
            trace!(field = %entry.label, "Skipping reserved key");
            continue;
        }
        if let Some(predicate) = entry_predicate(entry, config)? {
            set = set.with_predicate(predicate);
        }
    }

    debug!(
        subsystem = "search",
        component = "predicates",
        predicate_count = set.predicates.len(),
        creation_bounded = !set.creation_date.is_unbounded(),
        "Built search predicates"
    );
    Ok(set)
}

fn entry_predicate(entry: &NormalizedEntry, config: &DmsConfig) -> Result<Option<FieldPredicate>> {
    let label = entry.label.clone();
    match (&entry.kind, &entry.value) {
        (FieldKind::Date, NormalizedValue::Single(value)) => {
            let date = require_date(value)?;
            let range = if config.expand_single_date_search {
                DateRange::around(date, config.date_search_padding_days)
            } else {
                DateRange::on(date)
            };
            Ok(Some(FieldPredicate::DateRange { label, range }))
        }
        (FieldKind::Date, NormalizedValue::Range { from, to }) => {
            let range = DateRange::new(
                from.as_ref().map(require_date).transpose()?,
                to.as_ref().map(require_date).transpose()?,
            );
            if range.is_unbounded() {
                return Ok(None);
            }
            Ok(Some(FieldPredicate::DateRange { label, range }))
        }
        (_, NormalizedValue::Single(value)) if value.is_empty() => Ok(None),
        (_, NormalizedValue::Single(value)) => Ok(Some(FieldPredicate::Exact {
            label,
            value: value.clone(),
        })),
        (kind, NormalizedValue::Range { .. }) => Err(Error::InvalidFieldValue {
            field: label,
            value: "range".to_string(),
            expected: kind.type_name().to_string(),
        }),
    }
}

fn require_date(value: &IndexValue) -> Result<NaiveDate> {
    value
        .as_date()
        .ok_or_else(|| Error::InvalidDate(value.canonical()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn entry(label: &str, kind: FieldKind, value: NormalizedValue) -> NormalizedEntry {
        NormalizedEntry {
            label: label.to_string(),
            kind,
            value,
        }
    }

    fn set(entries: Vec<NormalizedEntry>) -> NormalizedIndexSet {
        NormalizedIndexSet {
            entries,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input_has_no_criteria() {
        let config = DmsConfig::default();
        let built = build_predicates(&NormalizedIndexSet::default(), None, None, &config).unwrap();
        assert!(built.has_no_criteria());
        assert!(matches!(built.require_criteria(false), Err(Error::NoSearchCriteria)));
    }

    #[test]
    fn test_single_date_expands_to_padded_range() {
        let config = DmsConfig::default();
        let input = set(vec![entry(
            "Required Date",
            FieldKind::Date,
            NormalizedValue::Single(IndexValue::Date(d(2012, 3, 7))),
        )]);
        let built = build_predicates(&input, None, None, &config).unwrap();
        assert_eq!(
            built.predicates,
            vec![FieldPredicate::DateRange {
                label: "Required Date".to_string(),
                range: DateRange::new(Some(d(2012, 3, 6)), Some(d(2012, 3, 8))),
            }]
        );
    }

    #[test]
    fn test_unusable_padding_never_panics_or_inverts() {
        let date = || {
            set(vec![entry(
                "Required Date",
                FieldKind::Date,
                NormalizedValue::Single(IndexValue::Date(d(2012, 3, 7))),
            )])
        };

        let config = DmsConfig {
            date_search_padding_days: i64::MAX,
            ..DmsConfig::default()
        };
        let built = build_predicates(&date(), None, None, &config).unwrap();
        assert_eq!(
            built.predicates,
            vec![FieldPredicate::DateRange {
                label: "Required Date".to_string(),
                range: DateRange::unbounded(),
            }]
        );

        let config = DmsConfig {
            date_search_padding_days: -1,
            ..DmsConfig::default()
        };
        let built = build_predicates(&date(), None, None, &config).unwrap();
        assert_eq!(
            built.predicates,
            vec![FieldPredicate::DateRange {
                label: "Required Date".to_string(),
                range: DateRange::on(d(2012, 3, 7)),
            }]
        );
    }

    #[test]
    fn test_single_date_exact_when_expansion_off() {
        let config = DmsConfig {
            expand_single_date_search: false,
            ..Default::default()
        };
        let input = set(vec![entry(
            "Required Date",
            FieldKind::Date,
            NormalizedValue::Single(IndexValue::Date(d(2012, 3, 7))),
        )]);
        let built = build_predicates(&input, None, None, &config).unwrap();
        assert!(matches!(
            &built.predicates[0],
            FieldPredicate::DateRange { range, .. } if *range == DateRange::on(d(2012, 3, 7))
        ));
    }

    #[test]
    fn test_explicit_pair_used_as_given() {
        let config = DmsConfig::default();
        let input = set(vec![entry(
            "Report Date",
            FieldKind::Date,
            NormalizedValue::Range {
                from: Some(IndexValue::Date(d(2012, 3, 30))),
                to: None,
            },
        )]);
        let built = build_predicates(&input, Some(d(2012, 3, 1)), None, &config).unwrap();
        assert_eq!(built.creation_date, DateRange::new(Some(d(2012, 3, 1)), None));
        assert_eq!(
            built.describe(&config),
            vec![
                "Creation Date: (from: 01/03/2012 to: 01/01/2100)".to_string(),
                "Report Date: (from: 30/03/2012 to: 01/01/2100)".to_string(),
            ]
        );
    }

    #[test]
    fn test_exact_and_empty_values() {
        let config = DmsConfig::default();
        let text = FieldKind::Text {
            max_length: 3,
            uppercase: false,
        };
        let input = set(vec![
            entry("Reporting Entity", text, NormalizedValue::Single(IndexValue::Text("JTG".into()))),
            entry("Report Type", text, NormalizedValue::Single(IndexValue::Text(String::new()))),
            entry("Friends ID", FieldKind::Integer, NormalizedValue::Single(IndexValue::Integer(123))),
        ]);
        let built = build_predicates(&input, None, None, &config).unwrap();
        let labels: Vec<&str> = built.predicates.iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["Reporting Entity", "Friends ID"]);
    }

    #[test]
    fn test_reserved_labels_excluded() {
        let config = DmsConfig::default();
        let input = set(vec![entry(
            "description",
            FieldKind::Text {
                max_length: 100,
                uppercase: false,
            },
            NormalizedValue::Single(IndexValue::Text("x".into())),
        )]);
        let built = build_predicates(&input, None, None, &config).unwrap();
        assert!(built.predicates.is_empty());
    }

    #[test]
    fn test_unparsed_date_is_rejected() {
        let config = DmsConfig::default();
        let input = set(vec![entry(
            "Report Date",
            FieldKind::Date,
            NormalizedValue::Single(IndexValue::Text("2012.04.01".into())),
        )]);
        let err = build_predicates(&input, None, None, &config).unwrap_err();
        assert!(matches!(err, Error::InvalidDate(ref v) if v == "2012.04.01"));
    }
}
