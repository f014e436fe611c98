//! Aggregate, render and normalize against the sample template store.

use chrono::NaiveDate;
use dms_core::{DmsConfig, Error, FieldKind, IndexValue, TemplateStore};
use dms_db::test_fixtures::sample_store;
use dms_db::MemoryStore;
use dms_forms::{
    aggregate, aggregate_template, normalize, render, FieldKey, FormMode, InitialValues,
    NormalizedValue, SubmittedIndexSet,
};

#[tokio::test]
async fn test_docrule_7_search_form_layout() {
    let store = sample_store();
    let config = DmsConfig::default();
    let set = aggregate(&store, "7", &config).await.unwrap();
    assert_eq!(set.template_ids(), ["mdt3", "mdt5", "mdt6"]);

    let form = render(&set, None, FormMode::Search);
    let layout: Vec<(String, &str)> = form
        .iter()
        .map(|f| (f.key.to_string(), f.label.as_str()))
        .collect();
    assert_eq!(
        layout,
        vec![
            ("0".to_string(), "Reporting Entity"),
            ("1".to_string(), "Report Type"),
            ("2_from".to_string(), "Report Date From"),
            ("2_to".to_string(), "Report Date To"),
            ("4".to_string(), "Employee"),
            ("5".to_string(), "Additional"),
        ]
    );
    assert_eq!(form.get(&FieldKey::Single(0)).unwrap().max_length(), Some(3));
}

#[tokio::test]
async fn test_index_form_initial_values() {
    let store = sample_store();
    let config = DmsConfig::default();
    let set = aggregate(&store, "2", &config).await.unwrap();
    let initial = InitialValues::from([
        ("0".to_string(), "123".to_string()),
        ("2".to_string(), "07/03/2012".to_string()),
    ]);
    let form = render(&set, Some(&initial), FormMode::Index);

    assert_eq!(form.len(), 6);
    assert_eq!(form.fields()[0].initial.as_deref(), Some("123"));
    assert_eq!(form.fields()[1].initial, None);
    assert_eq!(form.fields()[2].kind, FieldKind::Date);
    assert_eq!(form.fields()[2].initial.as_deref(), Some("07/03/2012"));
}

#[tokio::test]
async fn test_no_templates_vs_no_fields() {
    let config = DmsConfig::default();
    let store = MemoryStore::new();
    let err = aggregate(&store, "2", &config).await.unwrap_err();
    assert!(matches!(err, Error::NoTemplatesConfigured { ref docrule_id } if docrule_id == "2"));

    store
        .save_template(dms_core::MetadataTemplate::new("empty", "").for_docrule("2"))
        .await
        .unwrap();
    let set = aggregate(&store, "2", &config).await.unwrap();
    assert!(set.is_empty());
    assert!(render(&set, None, FormMode::Index).is_empty());
}

#[tokio::test]
async fn test_single_template_form() {
    let store = sample_store();
    let config = DmsConfig::default();
    let (template, set) = aggregate_template(&store, "mdt3", &config).await.unwrap();
    assert_eq!(template.docrule_id, vec!["7"]);
    assert_eq!(set.len(), 3);

    let form = render(&set, None, FormMode::Search);
    let submitted = SubmittedIndexSet::new()
        .with("2_from", "30/03/2012")
        .with("0", " fcb ");
    let normalized = normalize(&form, &submitted, &config);
    assert_eq!(
        normalized.get("Report Date"),
        Some(&NormalizedValue::Range {
            from: Some(IndexValue::Date(NaiveDate::from_ymd_opt(2012, 3, 30).unwrap())),
            to: None,
        })
    );
    assert_eq!(
        normalized.get("Reporting Entity"),
        Some(&NormalizedValue::Single(IndexValue::Text("fcb".to_string())))
    );
}

#[tokio::test]
async fn test_whitespace_trimmed_on_every_field() {
    let store = sample_store();
    let config = DmsConfig::default();
    let set = aggregate(&store, "7", &config).await.unwrap();
    let form = render(&set, None, FormMode::Index);
    let submitted = SubmittedIndexSet::new()
        .with("0", "FCB                                            ")
        .with("1", "                     Pay run                           ")
        .with("2", " 04/04/2012 ")
        .with("description", "Test Document MDT 3 Number 2                                 ");

    let normalized = normalize(&form, &submitted, &config);
    let indexes = normalized.to_secondary_indexes();
    assert_eq!(indexes["Reporting Entity"], "FCB");
    assert_eq!(indexes["Report Type"], "Pay run");
    assert_eq!(indexes["Report Date"], "2012-04-04");
    assert_eq!(normalized.description.as_deref(), Some("Test Document MDT 3 Number 2"));
    assert!(normalized.validate().is_ok());
}
