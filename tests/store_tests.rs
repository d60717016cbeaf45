/// Document store tests
/// These tests check the PostgREST queries issued by `Database`

use mockito::Matcher;
use scope_api::{
    db::{CollectorRepository, ComponentRepository, ScopeRepository},
    models::{CollectorType, PageRequest},
    Database,
};
use serde_json::json;

const KEY: &str = "test-service-key";

fn select_all_and(extra: Vec<(&str, &str)>) -> Matcher {
    let mut matchers = vec![Matcher::UrlEncoded("select".to_string(), "*".to_string())];
    matchers.extend(
        extra
            .into_iter()
            .map(|(k, v)| Matcher::UrlEncoded(k.to_string(), v.to_string())),
    );
    Matcher::AllOf(matchers)
}

fn scope_row(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "p_id": format!("P-{}", id),
        "name": name,
        "project_path": format!("root/{}", id),
        "collector_id": "c1"
    })
}

#[tokio::test]
async fn test_find_all_orders_by_project_path_desc() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/scopes")
        .match_query(select_all_and(vec![("order", "project_path.desc")]))
        .match_header("apikey", KEY)
        .match_header("authorization", format!("Bearer {}", KEY).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([scope_row("2", "b"), scope_row("1", "a")]).to_string())
        .create_async()
        .await;

    let db = Database::new(&server.url(), KEY);
    let scopes = db.find_all_ordered_by_project_path_desc().await.unwrap();

    mock.assert_async().await;
    assert_eq!(scopes.len(), 2);
    assert_eq!(scopes[0].id, "2");
}

#[tokio::test]
async fn test_find_by_scope_id_filters_on_source_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/scopes")
        .match_query(select_all_and(vec![("p_id", "eq.P-7")]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([scope_row("7", "seven")]).to_string())
        .create_async()
        .await;

    let db = Database::new(&server.url(), KEY);
    let scopes = db.find_by_scope_id("P-7").await.unwrap();

    mock.assert_async().await;
    assert_eq!(scopes[0].p_id.as_deref(), Some("P-7"));
}

#[tokio::test]
async fn test_paged_filter_reads_total_from_content_range() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/scopes")
        .match_query(select_all_and(vec![
            ("collector_id", "eq.c1"),
            ("name", "imatch.abc"),
            ("order", "id.asc"),
        ]))
        .match_header("range", "10-19")
        .match_header("prefer", "count=exact")
        .with_status(206)
        .with_header("content-type", "application/json")
        .with_header("content-range", "10-11/12")
        .with_body(json!([scope_row("10", "abc 10"), scope_row("11", "ABC 11")]).to_string())
        .create_async()
        .await;

    let db = Database::new(&server.url(), KEY);
    let page = db
        .find_by_collector_id_and_name_containing("c1", "abc", PageRequest::new(1, 10))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(page.content.len(), 2);
    assert_eq!(page.total_elements, 12);
    assert_eq!(page.total_pages, 2);
}

#[tokio::test]
async fn test_paged_filter_past_the_end_is_empty() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/scopes")
        .match_query(Matcher::Any)
        .with_status(416)
        .with_header("content-range", "*/3")
        .create_async()
        .await;

    let db = Database::new(&server.url(), KEY);
    let page = db
        .find_by_collector_id_and_name_containing("c1", "", PageRequest::new(5, 10))
        .await
        .unwrap();

    assert!(page.content.is_empty());
    assert_eq!(page.total_elements, 3);
}

#[tokio::test]
async fn test_paged_filter_with_huge_page_number_saturates_range() {
    let mut server = mockito::Server::new_async().await;
    let max = usize::MAX.to_string();
    let mock = server
        .mock("GET", "/scopes")
        .match_query(Matcher::Any)
        .match_header("range", format!("{}-{}", max, max).as_str())
        .with_status(416)
        .with_header("content-range", "*/4")
        .create_async()
        .await;

    let db = Database::new(&server.url(), KEY);
    let page = db
        .find_by_collector_id_and_name_containing("c1", "abc", PageRequest::new(usize::MAX, 10))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(page.content.is_empty());
    assert_eq!(page.total_elements, 4);
}

#[tokio::test]
async fn test_store_errors_surface_as_store_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/scopes")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let db = Database::new(&server.url(), KEY);
    let err = db.find_by_collector_id("c1").await.unwrap_err();
    assert_eq!(err.error, "StoreError");
    assert_eq!(err.details.unwrap()["status"], 500);
}

#[tokio::test]
async fn test_collector_and_component_lookups() {
    let mut server = mockito::Server::new_async().await;
    let _collectors = server
        .mock("GET", "/collectors")
        .match_query(select_all_and(vec![("id", "in.(\"c1\",\"c2\")")]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{ "id": "c1", "name": "Jira", "collector_type": "AgileTool", "last_executed": 5 }])
                .to_string(),
        )
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/components")
        .match_query(select_all_and(vec![("id", "eq.nope")]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let db = Database::new(&server.url(), KEY);

    let collectors = db
        .find_collectors(&["c1".to_string(), "c2".to_string()])
        .await
        .unwrap();
    assert_eq!(collectors.len(), 1);
    assert_eq!(collectors[0].collector_type, CollectorType::AgileTool);

    assert!(db.find_collectors(&[]).await.unwrap().is_empty());
    assert!(db.find_component("nope").await.unwrap().is_none());
}
