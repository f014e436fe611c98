//! PostgreSQL store tests. Require a running database:
//! `DATABASE_URL=postgres://... cargo test -p dms-db -- --ignored`

use chrono::NaiveDate;
use dms_db::test_fixtures::{mdt1, mdt2, sample_documents, TestDatabase};
use dms_db::{DateRange, DocumentStore, FieldPredicate, IndexValue, SearchPredicateSet, TemplateStore};

async fn setup() -> TestDatabase {
    let _ = dotenvy::dotenv();
    let db = TestDatabase::new().await.expect("test database");
    for doc in sample_documents() {
        db.documents.save_document(doc).await.unwrap();
    }
    db
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_templates_keep_insertion_order() {
    let db = setup().await;
    db.templates.save_template(mdt2()).await.unwrap();
    db.templates.save_template(mdt1()).await.unwrap();
    db.templates.save_template(mdt2()).await.unwrap();

    let ids: Vec<String> = db
        .templates
        .get_templates_for_docrule("2")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["mdt2", "mdt1"]);
    assert_eq!(db.templates.get_template("mdt1").await.unwrap(), Some(mdt1()));

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_documents_with_date_range() {
    let db = setup().await;
    let set = SearchPredicateSet::default().with_predicate(FieldPredicate::DateRange {
        label: "Report Date".to_string(),
        range: DateRange::new(NaiveDate::from_ymd_opt(2012, 4, 2), None),
    });

    let codes: Vec<String> = db
        .documents
        .find_documents("7", &set)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.code)
        .collect();
    assert_eq!(codes, vec!["BBB-0002", "BBB-0003"]);

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_documents_exact_and_prefix() {
    let db = setup().await;
    let set = SearchPredicateSet::default().with_predicate(FieldPredicate::Exact {
        label: "Friends ID".to_string(),
        value: IndexValue::Integer(123),
    });
    let docs = db.documents.find_documents("2", &set).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].index("Friends Name"), Some("Andrew"));
    assert_eq!(docs[0].revisions, vec!["1", "2"]);

    let hits = db
        .documents
        .find_by_field_prefix("2", "Employee Name", "Andrew")
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);

    let literal = db
        .documents
        .find_by_field_prefix("2", "Employee Name", "Andrew%")
        .await
        .unwrap();
    assert!(literal.is_empty());

    db.cleanup().await.unwrap();
}
