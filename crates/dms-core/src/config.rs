//! Runtime configuration for form rendering, normalization and search.
//!
//! Every field has a default from [`crate::defaults`] and can be overridden
//! through environment variables via [`DmsConfig::from_env`].

use std::env;

use chrono::NaiveDate;
use tracing::warn;

use crate::defaults;
use crate::error::Result;
use crate::temporal;

/// Settings shared by the form, search and store layers.
///
/// # Example
/// ```
/// use dms_core::DmsConfig;
///
/// let config = DmsConfig::default();
/// assert!(config.expand_single_date_search);
/// assert_eq!(config.format_date(config.unbounded_date_floor), "01/01/1960");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmsConfig {
    /// Format dates are displayed in (chrono `strftime` syntax).
    pub display_date_format: String,

    /// Formats accepted on input, tried in order.
    pub accepted_date_formats: Vec<String>,

    /// Expand a single date search key into a padded range.
    pub expand_single_date_search: bool,

    /// Days of padding on each side of an expanded date key.
    pub date_search_padding_days: i64,

    /// Date substituted for an open lower bound.
    pub unbounded_date_floor: NaiveDate,

    /// Date substituted for an open upper bound.
    pub unbounded_date_ceiling: NaiveDate,

    /// Maximum length of string fields declaring no length.
    pub default_string_length: usize,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            display_date_format: defaults::DISPLAY_DATE_FORMAT.to_string(),
            accepted_date_formats: vec![
                defaults::DISPLAY_DATE_FORMAT.to_string(),
                defaults::ISO_DATE_FORMAT.to_string(),
            ],
            expand_single_date_search: true,
            date_search_padding_days: defaults::DATE_SEARCH_PADDING_DAYS,
            unbounded_date_floor: default_floor(),
            unbounded_date_ceiling: default_ceiling(),
            default_string_length: defaults::STRING_FIELD_LENGTH,
        }
    }
}

fn default_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1960, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_ceiling() -> NaiveDate {
    NaiveDate::from_ymd_opt(2100, 1, 1).unwrap_or(NaiveDate::MAX)
}

impl DmsConfig {
    /// Constructs configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DMS_DATE_FORMAT` (default: `%d/%m/%Y`)
    /// - `DMS_ACCEPTED_DATE_FORMATS` comma separated (default: display format, `%Y-%m-%d`)
    /// - `DMS_DATE_SEARCH_EXPANSION` (default: true)
    /// - `DMS_DATE_SEARCH_PADDING_DAYS` (default: 1)
    /// - `DMS_DATE_FLOOR` ISO date (default: 1960-01-01)
    /// - `DMS_DATE_CEILING` ISO date (default: 2100-01-01)
    /// - `DMS_STRING_LENGTH` (default: 100)
    ///
    /// Unparsable values, unusable date formats and padding outside
    /// `0..=MAX_DATE_SEARCH_PADDING_DAYS` fall back to the default with a
    /// warning.
    pub fn from_env() -> Self {
        let base = Self::default();

        let display_date_format = match env::var("DMS_DATE_FORMAT") {
            Ok(raw) if temporal::is_valid_format(&raw) => raw,
            Ok(raw) => {
                warn!(key = "DMS_DATE_FORMAT", value = %raw, "Ignoring invalid date format");
                base.display_date_format
            }
            Err(_) => base.display_date_format,
        };

        let accepted_date_formats = env::var("DMS_ACCEPTED_DATE_FORMATS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .filter(|f| {
                        let valid = temporal::is_valid_format(f);
                        if !valid {
                            warn!(
                                key = "DMS_ACCEPTED_DATE_FORMATS",
                                value = %f,
                                "Ignoring invalid date format"
                            );
                        }
                        valid
                    })
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|formats| !formats.is_empty())
            .unwrap_or_else(|| {
                vec![
                    display_date_format.clone(),
                    defaults::ISO_DATE_FORMAT.to_string(),
                ]
            });

        let date_search_padding_days = parse_env(
            "DMS_DATE_SEARCH_PADDING_DAYS",
            base.date_search_padding_days,
        );
        let date_search_padding_days =
            if (0..=defaults::MAX_DATE_SEARCH_PADDING_DAYS).contains(&date_search_padding_days) {
                date_search_padding_days
            } else {
                warn!(
                    key = "DMS_DATE_SEARCH_PADDING_DAYS",
                    value = date_search_padding_days,
                    max = defaults::MAX_DATE_SEARCH_PADDING_DAYS,
                    "Ignoring out of range date padding"
                );
                base.date_search_padding_days
            };

        Self {
            display_date_format,
            accepted_date_formats,
            expand_single_date_search: parse_bool_env(
                "DMS_DATE_SEARCH_EXPANSION",
                base.expand_single_date_search,
            ),
            date_search_padding_days,
            unbounded_date_floor: parse_date_env("DMS_DATE_FLOOR", base.unbounded_date_floor),
            unbounded_date_ceiling: parse_date_env(
                "DMS_DATE_CEILING",
                base.unbounded_date_ceiling,
            ),
            default_string_length: parse_env("DMS_STRING_LENGTH", base.default_string_length),
        }
    }

    /// Parse a user supplied date using the accepted formats.
    pub fn parse_date(&self, value: &str) -> Result<NaiveDate> {
        temporal::parse_date(value, &self.accepted_date_formats)
    }

    /// Render a date in the display format, or ISO form if that format is
    /// unusable.
    pub fn format_date(&self, date: NaiveDate) -> String {
        temporal::format_date(date, &self.display_date_format)
    }
}

/// Parses a boolean environment variable with a default fallback.
///
/// Recognizes "true", "1", "yes", "on" (case-insensitive) as true.
/// Any other value or missing variable returns the default.
fn parse_bool_env(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|val| match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparsable configuration value");
            default
        }),
        Err(_) => default,
    }
}

fn parse_date_env(key: &str, default: NaiveDate) -> NaiveDate {
    match env::var(key) {
        Ok(raw) => temporal::parse_iso_date(raw.trim()).unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparsable date configuration value");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global, so tests must not run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const KEYS: [&str; 7] = [
        "DMS_DATE_FORMAT",
        "DMS_ACCEPTED_DATE_FORMATS",
        "DMS_DATE_SEARCH_EXPANSION",
        "DMS_DATE_SEARCH_PADDING_DAYS",
        "DMS_DATE_FLOOR",
        "DMS_DATE_CEILING",
        "DMS_STRING_LENGTH",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults() {
        let config = DmsConfig::default();
        assert_eq!(config.display_date_format, "%d/%m/%Y");
        assert_eq!(config.accepted_date_formats, vec!["%d/%m/%Y", "%Y-%m-%d"]);
        assert!(config.expand_single_date_search);
        assert_eq!(config.date_search_padding_days, 1);
        assert_eq!(config.default_string_length, 100);
        assert_eq!(
            config.unbounded_date_ceiling,
            NaiveDate::from_ymd_opt(2100, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_from_env_without_overrides_matches_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert_eq!(DmsConfig::from_env(), DmsConfig::default());
    }

    #[test]
    fn test_from_env_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("DMS_DATE_SEARCH_EXPANSION", "off");
        env::set_var("DMS_DATE_FLOOR", "2000-01-01");
        env::set_var("DMS_STRING_LENGTH", "60");
        env::set_var("DMS_ACCEPTED_DATE_FORMATS", "%Y-%m-%d, %d.%m.%Y");

        let config = DmsConfig::from_env();
        clear_env();

        assert!(!config.expand_single_date_search);
        assert_eq!(
            config.unbounded_date_floor,
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
        );
        assert_eq!(config.default_string_length, 60);
        assert_eq!(config.accepted_date_formats, vec!["%Y-%m-%d", "%d.%m.%Y"]);
    }

    #[test]
    fn test_from_env_invalid_values_fall_back() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("DMS_DATE_SEARCH_EXPANSION", "maybe");
        env::set_var("DMS_DATE_SEARCH_PADDING_DAYS", "many");
        env::set_var("DMS_DATE_CEILING", "someday");

        let config = DmsConfig::from_env();
        clear_env();

        assert!(config.expand_single_date_search);
        assert_eq!(config.date_search_padding_days, 1);
        assert_eq!(
            config.unbounded_date_ceiling,
            DmsConfig::default().unbounded_date_ceiling
        );
    }

    #[test]
    fn test_parse_and_format_date() {
        let config = DmsConfig::default();
        let date = config.parse_date("01/04/2012").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2012, 4, 1).unwrap());
        assert_eq!(config.parse_date("2012-04-01").unwrap(), date);
        assert_eq!(config.format_date(date), "01/04/2012");
        assert!(config.parse_date("April 1st").is_err());
    }

    #[test]
    fn test_from_env_rejects_out_of_range_padding() {
        let _guard = ENV_MUTEX.lock().unwrap();
        for raw in ["-1", "99999999999", "9223372036854775807"] {
            clear_env();
            env::set_var("DMS_DATE_SEARCH_PADDING_DAYS", raw);
            let config = DmsConfig::from_env();
            clear_env();
            assert_eq!(config.date_search_padding_days, 1, "padding {}", raw);
        }
    }

    #[test]
    fn test_from_env_accepts_padding_in_range() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("DMS_DATE_SEARCH_PADDING_DAYS", "0");
        let config = DmsConfig::from_env();
        clear_env();
        assert_eq!(config.date_search_padding_days, 0);
    }

    #[test]
    fn test_from_env_rejects_invalid_date_formats() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("DMS_DATE_FORMAT", "%Q");
        env::set_var("DMS_ACCEPTED_DATE_FORMATS", "%Q, %d.%m.%Y");

        let config = DmsConfig::from_env();
        clear_env();

        assert_eq!(config.display_date_format, "%d/%m/%Y");
        assert_eq!(config.accepted_date_formats, vec!["%d.%m.%Y"]);
    }

    #[test]
    fn test_from_env_all_accepted_formats_invalid_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("DMS_ACCEPTED_DATE_FORMATS", "%Q");

        let config = DmsConfig::from_env();
        clear_env();

        assert_eq!(config.accepted_date_formats, vec!["%d/%m/%Y", "%Y-%m-%d"]);
    }

    #[test]
    fn test_format_date_with_unusable_format_does_not_panic() {
        let config = DmsConfig {
            display_date_format: "%Q".to_string(),
            ..DmsConfig::default()
        };
        let date = NaiveDate::from_ymd_opt(2012, 3, 7).unwrap();
        assert_eq!(config.format_date(date), "2012-03-07");
    }
}
