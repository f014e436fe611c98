//! Command implementations. Output goes to the supplied writer.

use std::io::Write;

use chrono::NaiveDate;

use dms_core::{DmsConfig, IndexedDocument};
use dms_forms::{FieldSpec, FormMode, RenderedForm, SubmittedIndexSet};
use dms_search::{scan_report, to_csv_string, SearchOutcome, SearchService};

/// What a form or search is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Docrule(String),
    Template(String),
}

/// Search result rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Parse `KEY=VALUE` arguments.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Assemble a submission from generated-key pairs and the reserved fields.
pub fn submission(
    keys: Vec<(String, String)>,
    from: Option<String>,
    to: Option<String>,
    description: Option<String>,
) -> SubmittedIndexSet {
    let mut submitted: SubmittedIndexSet = keys.into_iter().collect();
    if let Some(from) = from {
        submitted.insert("date", from);
    }
    if let Some(to) = to {
        submitted.insert("end_date", to);
    }
    if let Some(description) = description {
        submitted.insert("description", description);
    }
    submitted
}

fn describe_field(spec: &FieldSpec) -> String {
    let mut kind = spec.kind.type_name().to_string();
    if let Some(len) = spec.max_length() {
        kind = format!("{}({})", kind, len);
    }
    if spec.is_uppercase() {
        kind.push_str(" uppercase");
    }
    format!("{}\t{}\t{}\t{}", spec.key, spec.label, kind, spec.help_text)
}

fn write_form(form: &RenderedForm, out: &mut dyn Write) -> anyhow::Result<()> {
    for spec in form {
        writeln!(out, "{}", describe_field(spec))?;
    }
    Ok(())
}

pub async fn fields(
    svc: &SearchService,
    target: &Target,
    mode: FormMode,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let form = match target {
        Target::Docrule(docrule_id) => svc.form(docrule_id, mode, None).await?,
        Target::Template(mdt_id) => {
            let (template, form) = svc.template_form(mdt_id, None).await?;
            writeln!(out, "# {} ({})", template.id, template.description)?;
            form
        }
    };
    write_form(&form, out)
}

fn write_documents(
    outcome: &SearchOutcome,
    format: OutputFormat,
    config: &DmsConfig,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(outcome)?)?,
        OutputFormat::Csv => write!(out, "{}", to_csv_string(&outcome.documents, config)?)?,
        OutputFormat::Table => {
            for line in &outcome.criteria {
                writeln!(out, "# {}", line)?;
            }
            for doc in &outcome.documents {
                writeln!(
                    out,
                    "{}\t{}\t{}",
                    doc.code,
                    config.format_date(doc.creation_date),
                    doc.description
                )?;
            }
            writeln!(out, "# {} document(s)", outcome.documents.len())?;
        }
    }
    Ok(())
}

pub async fn search(
    svc: &SearchService,
    target: &Target,
    submitted: &SubmittedIndexSet,
    confirm_all: bool,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let outcome = match target {
        Target::Docrule(docrule_id) => svc.search(docrule_id, submitted, confirm_all).await?,
        Target::Template(mdt_id) => svc.search_template(mdt_id, submitted, confirm_all).await?,
    };
    write_documents(&outcome, format, svc.config(), out)
}

pub async fn suggest(
    svc: &SearchService,
    docrule_id: &str,
    field: &str,
    prefix: &str,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let suggestions = svc.suggest(docrule_id, field, prefix).await?;
    writeln!(out, "{}", serde_json::to_string_pretty(&suggestions)?)?;
    Ok(())
}

pub async fn index(
    svc: &SearchService,
    docrule_id: &str,
    code: &str,
    submitted: &SubmittedIndexSet,
    today: NaiveDate,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let outcome = svc.index_document(docrule_id, code, submitted, today).await?;
    for key in &outcome.new_keys {
        writeln!(out, "Warning: {}", key)?;
    }
    writeln!(
        out,
        "Indexed {} ({} secondary indexes)",
        outcome.document.code,
        outcome.document.secondary_indexes.len()
    )?;
    Ok(())
}

pub fn report(
    documents: &[IndexedDocument],
    field: &str,
    parsable: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    for line in scan_report(documents, field) {
        if parsable {
            writeln!(out, "{}", line.parsable())?;
        } else {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dms_core::defaults::REPORT_FIELD;
    use dms_core::{DocumentStore, Error};
    use dms_db::test_fixtures::{sample_fixture, sample_store};

    use crate::backend::Backend;

    fn service() -> SearchService {
        SearchService::from_store(Arc::new(sample_store()))
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("2_from=01/03/2012").unwrap(),
            ("2_from".to_string(), "01/03/2012".to_string())
        );
        assert_eq!(parse_key_value("0=").unwrap(), ("0".to_string(), String::new()));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_submission_maps_reserved_keys() {
        let submitted = submission(
            vec![("0".to_string(), "JTG".to_string())],
            Some("01/03/2012".to_string()),
            None,
            Some("note".to_string()),
        );
        assert_eq!(submitted.get("0"), Some("JTG"));
        assert_eq!(submitted.get("date"), Some("01/03/2012"));
        assert_eq!(submitted.description(), Some("note"));
        assert_eq!(submitted.get("end_date"), None);
    }

    #[tokio::test]
    async fn test_fields_search_mode() {
        let mut out = Vec::new();
        fields(&service(), &Target::Docrule("7".to_string()), FormMode::Search, &mut out)
            .await
            .unwrap();
        let out = text(out);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("0\tReporting Entity\tstring(3)\t"));
        assert!(lines[2].starts_with("2_from\tReport Date From\tdate\t"));
    }

    #[tokio::test]
    async fn test_fields_for_template() {
        let mut out = Vec::new();
        fields(&service(), &Target::Template("mdt4".to_string()), FormMode::Search, &mut out)
            .await
            .unwrap();
        let out = text(out);
        assert!(out.starts_with("# mdt4 (Test MDT Number 4)\n"));
        assert!(out.contains("0\tTests Uppercase Field\tstring(100) uppercase\t"));
    }

    #[tokio::test]
    async fn test_search_table_and_csv() {
        let svc = service();
        let submitted = submission(vec![("1".to_string(), "Andrew".to_string())], None, None, None);
        let target = Target::Docrule("2".to_string());

        let mut table = Vec::new();
        search(&svc, &target, &submitted, false, OutputFormat::Table, &mut table)
            .await
            .unwrap();
        let table = text(table);
        assert!(table.contains("# Friends Name: Andrew"));
        assert!(table.contains("ADL-0001\t06/03/2012\tTest Document Number 1"));
        assert!(table.ends_with("# 1 document(s)\n"));

        let mut csv = Vec::new();
        search(&svc, &target, &submitted, false, OutputFormat::Csv, &mut csv)
            .await
            .unwrap();
        assert!(text(csv).contains("Friends Name,Andrew"));
    }

    #[tokio::test]
    async fn test_search_without_criteria_is_warning() {
        let mut out = Vec::new();
        let err = search(
            &service(),
            &Target::Docrule("2".to_string()),
            &SubmittedIndexSet::new(),
            false,
            OutputFormat::Table,
            &mut out,
        )
        .await
        .unwrap_err();
        let err = err.downcast_ref::<Error>().unwrap();
        assert!(err.is_user_warning());
    }

    #[tokio::test]
    async fn test_suggest_outputs_json() {
        let mut out = Vec::new();
        suggest(&service(), "2", "Friends ID", "123", &mut out)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["kind"], "parallel");
        assert_eq!(value["partners"][0]["label"], "Friends Name");
        assert_eq!(value["partners"][0]["values"][0], "Andrew");
    }

    #[tokio::test]
    async fn test_index_prints_new_key_warning() {
        let submitted = submission(
            vec![
                ("3".to_string(), "1234567".to_string()),
                ("4".to_string(), "Iurii Garmash".to_string()),
            ],
            Some("06/03/2012".to_string()),
            None,
            None,
        );
        let mut out = Vec::new();
        let today = NaiveDate::from_ymd_opt(2012, 6, 1).unwrap();
        index(&service(), "2", "ADL-0004", &submitted, today, &mut out)
            .await
            .unwrap();
        let out = text(out);
        assert!(out.contains("Warning: Adding new indexing key: Employee ID: 1234567"));
        assert!(out.contains("Indexed ADL-0004 (2 secondary indexes)"));
    }

    #[tokio::test]
    async fn test_report_modes() {
        let docs = sample_store().list_documents().await.unwrap();

        let mut human = Vec::new();
        report(&docs, REPORT_FIELD, false, &mut human).unwrap();
        let human = text(human);
        assert!(human.starts_with(
            "ADL-0001, revision count: 2, names: ['1', '2'], employee: Iurii Garmash\n"
        ));

        let mut parsable = Vec::new();
        report(&docs, REPORT_FIELD, true, &mut parsable).unwrap();
        let parsable = text(parsable);
        assert!(parsable.contains("\"BBB-0001\", \"1\", \"\""));
        assert_eq!(parsable.lines().count(), docs.len());
    }

    #[tokio::test]
    async fn test_fixture_backend_persists_indexing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dms.json");
        std::fs::write(&path, serde_json::to_string(&sample_fixture()).unwrap()).unwrap();

        let config = DmsConfig::default();
        let backend = Backend::open(Some(&path), None, &config).await.unwrap();
        let svc = backend.service(config.clone());
        let submitted = submission(vec![("0".to_string(), "555".to_string())], None, None, None);
        let today = NaiveDate::from_ymd_opt(2012, 6, 1).unwrap();
        index(&svc, "2", "ADL-0100", &submitted, today, &mut Vec::new())
            .await
            .unwrap();
        backend.persist().await.unwrap();

        let reopened = Backend::open(Some(&path), None, &config).await.unwrap();
        let doc = reopened
            .service(config)
            .documents()
            .get_document("ADL-0100")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.index("Friends ID"), Some("555"));
        assert!(reopened.migrate().await.is_err());
    }

    #[tokio::test]
    async fn test_backend_requires_a_store() {
        let config = DmsConfig::default();
        assert!(Backend::open(None, None, &config).await.is_err());
    }
}
