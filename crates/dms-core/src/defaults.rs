//! Centralized default constants for the document indexing system.
//!
//! **This module is the single source of truth** for shared default values.
//! Configuration (`crate::config::DmsConfig`) starts from these and may
//! override them from the environment.

// =============================================================================
// FIELDS
// =============================================================================

/// Maximum length of a string field when the template declares none.
pub const STRING_FIELD_LENGTH: usize = 100;

/// Template flag value that turns on uppercase normalization.
pub const UPPERCASE_FLAG: &str = "yes";

/// Label suffix of the lower bound field of a date range in search forms.
pub const LABEL_FROM_SUFFIX: &str = " From";

/// Label suffix of the upper bound field of a date range in search forms.
pub const LABEL_TO_SUFFIX: &str = " To";

/// Key suffix of the lower bound field of a date range in search forms.
pub const KEY_FROM_SUFFIX: &str = "_from";

/// Key suffix of the upper bound field of a date range in search forms.
pub const KEY_TO_SUFFIX: &str = "_to";

// =============================================================================
// RESERVED SUBMISSION KEYS
// =============================================================================

/// Document creation date (lower bound when searching).
pub const KEY_DATE: &str = "date";

/// Upper bound of the document creation date range.
pub const KEY_END_DATE: &str = "end_date";

/// Free text document description.
pub const KEY_DESCRIPTION: &str = "description";

/// All submission keys that never map to a template field.
pub const RESERVED_KEYS: [&str; 3] = [KEY_DATE, KEY_END_DATE, KEY_DESCRIPTION];

// =============================================================================
// DATES
// =============================================================================

/// Format dates are displayed and typed in.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Canonical storage format for dates.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Lower bound substituted for an open-ended date range.
pub const DATE_FLOOR: &str = "1960-01-01";

/// Upper bound substituted for an open-ended date range.
pub const DATE_CEILING: &str = "2100-01-01";

/// Days added on each side when a single date is used as a search key.
pub const DATE_SEARCH_PADDING_DAYS: i64 = 1;

/// Largest padding accepted from configuration (ten years).
pub const MAX_DATE_SEARCH_PADDING_DAYS: i64 = 3650;

// =============================================================================
// REPORTING
// =============================================================================

/// Index shown by the document scan report when none is requested.
pub const REPORT_FIELD: &str = "Employee Name";

/// Prefix of the warning emitted when indexing introduces a new parallel key.
pub const NEW_KEY_WARNING: &str = "Adding new indexing key";
