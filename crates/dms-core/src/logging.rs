//! Structured logging schema and field name constants.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Store failure, requires operator attention |
//! | WARN  | Recoverable issue, fallback applied (coercion failure, new key) |
//! | INFO  | Operation completions (search executed, document indexed) |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-field iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "forms", "search", "db", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "aggregator", "renderer", "normalizer", "parallel_keys"
pub const COMPONENT: &str = "component";

/// Logical operation name.
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Document type the operation is scoped to.
pub const DOCRULE_ID: &str = "docrule_id";

/// Metadata template identifier.
pub const MDT_ID: &str = "mdt_id";

/// Document code.
pub const DOCUMENT_CODE: &str = "code";

/// Field label being processed.
pub const FIELD_LABEL: &str = "field";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or lookup.
pub const RESULT_COUNT: &str = "result_count";

/// Number of fields aggregated or rendered.
pub const FIELD_COUNT: &str = "field_count";

/// Number of predicates in a search.
pub const PREDICATE_COUNT: &str = "predicate_count";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL: [&str; 11] = [
        SUBSYSTEM,
        COMPONENT,
        OPERATION,
        DOCRULE_ID,
        MDT_ID,
        DOCUMENT_CODE,
        FIELD_LABEL,
        DURATION_MS,
        RESULT_COUNT,
        FIELD_COUNT,
        PREDICATE_COUNT,
    ];

    #[test]
    fn test_field_names_are_unique() {
        let unique: HashSet<&str> = ALL.iter().copied().collect();
        assert_eq!(unique.len(), ALL.len());
    }

    #[test]
    fn test_field_names_are_snake_case() {
        for name in ALL {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "field name not snake_case: {}",
                name
            );
        }
    }
}
