//! CSV export of search results.
//!
//! One row per document: code, creation date (display format), description,
//! then label/value pairs of the secondary indexes. Rows vary in length.

use std::io;

use dms_core::{DmsConfig, Error, IndexedDocument, Result};

/// Write `documents` as CSV rows to `writer`.
pub fn write_csv<W: io::Write>(
    documents: &[IndexedDocument],
    config: &DmsConfig,
    writer: W,
) -> Result<W> {
    let mut csv = csv::WriterBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_writer(writer);

    for doc in documents {
        let mut record = vec![
            doc.code.clone(),
            config.format_date(doc.creation_date),
            doc.description.clone(),
        ];
        for (label, value) in &doc.secondary_indexes {
            record.push(label.clone());
            record.push(value.clone());
        }
        csv.write_record(&record)?;
    }

    csv.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Render `documents` as a CSV string.
pub fn to_csv_string(documents: &[IndexedDocument], config: &DmsConfig) -> Result<String> {
    let buf = write_csv(documents, config, Vec::new())?;
    String::from_utf8(buf).map_err(|e| Error::Serialization(e.to_string()))
}
