//! Document scan report for scanning and indexing reconciliation.

use std::fmt;

use serde::Serialize;

use dms_core::IndexedDocument;

/// One report line per stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReportLine {
    pub code: String,
    pub revision_names: Vec<String>,
    /// Value of the reported index field; empty when the document lacks it.
    pub value: String,
}

impl ScanReportLine {
    pub fn revision_count(&self) -> usize {
        self.revision_names.len()
    }

    /// Quoted, comma separated form: `"code", "count", "value"`.
    pub fn parsable(&self) -> String {
        format!(
            "\"{}\", \"{}\", \"{}\"",
            self.code,
            self.revision_count(),
            self.value
        )
    }
}

impl fmt::Display for ScanReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, revision count: {}, names: [{}], employee: {}",
            self.code,
            self.revision_count(),
            self.revision_names
                .iter()
                .map(|n| format!("'{}'", n))
                .collect::<Vec<_>>()
                .join(", "),
            self.value
        )
    }
}

/// Report lines for `documents`, reading the value of `field`.
pub fn scan_report(documents: &[IndexedDocument], field: &str) -> Vec<ScanReportLine> {
    documents
        .iter()
        .map(|doc| ScanReportLine {
            code: doc.code.clone(),
            revision_names: doc.revisions.clone(),
            value: doc.index(field).unwrap_or_default().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dms_core::defaults::REPORT_FIELD;

    fn docs() -> Vec<IndexedDocument> {
        let date = NaiveDate::from_ymd_opt(2012, 3, 6).unwrap();
        vec![
            IndexedDocument::new("ADL-0001", "2", date)
                .with_index("Employee Name", "JOHN DOE")
                .with_revision("1")
                .with_revision("2"),
            IndexedDocument::new("BBB-0001", "7", date),
        ]
    }

    #[test]
    fn test_human_readable_line() {
        let lines = scan_report(&docs(), REPORT_FIELD);
        assert_eq!(
            lines[0].to_string(),
            "ADL-0001, revision count: 2, names: ['1', '2'], employee: JOHN DOE"
        );
        assert_eq!(
            lines[1].to_string(),
            "BBB-0001, revision count: 0, names: [], employee: "
        );
    }

    #[test]
    fn test_parsable_line() {
        let lines = scan_report(&docs(), REPORT_FIELD);
        assert_eq!(lines[0].parsable(), "\"ADL-0001\", \"2\", \"JOHN DOE\"");
        assert_eq!(lines[1].parsable(), "\"BBB-0001\", \"0\", \"\"");
    }
}
