use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mediasearch_core::IndexOptions;
use mediasearch_server::{build_app, AppConfig};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

fn write_corpus(dir: &Path) -> std::path::PathBuf {
    let items = serde_json::json!([
        {"suchtext": "Tennis Grand Slam Turnier Finale in Wimbledon", "bildnummer": "0050000001",
         "fotografen": "IMAGO / Xinhua", "datum": "01.06.2019", "hoehe": "2460", "breite": "3643"},
        {"suchtext": "Tennis Turnier PUBLICATIONxINxGERxSUIxAUTxONLY", "bildnummer": "0050000002",
         "fotografen": "IMAGO / Sven Simon", "datum": "15.03.2020", "hoehe": "3000", "breite": "4500"},
        {"suchtext": "Fußball Bundesliga Match", "bildnummer": "0050000003",
         "fotografen": "IMAGO / Xinhua", "datum": "31.12.2020", "hoehe": "2000", "breite": "3000"},
        {"suchtext": "Kaputtes Datum", "bildnummer": "0050000004",
         "fotografen": "IMAGO / Xinhua", "datum": "31.02.2020", "hoehe": "2000", "breite": "3000"}
    ]);
    let path = dir.join("media.json");
    fs::write(&path, serde_json::to_vec(&items).unwrap()).unwrap();
    path
}

fn app(corpus: &Path, admin_token: Option<&str>) -> Router {
    build_app(AppConfig {
        corpus: corpus.to_path_buf(),
        index: IndexOptions::default(),
        admin_token: admin_token.map(str::to_string),
        cors_allow_origin: None,
    })
    .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn ids(json: &Value) -> Vec<String> {
    json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn search_returns_ranked_page() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let app = app(&corpus, None);

    let (status, json) = get(app, "/api/search?q=tennis&page=1&pageSize=20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec!["0050000001", "0050000002"]);
    assert_eq!(json["total"], 2);
    assert_eq!(json["totalPages"], 1);
    assert_eq!(json["pageSize"], 20);
    assert!(json["items"][0]["_score"].as_f64().unwrap() > 0.0);
    assert_eq!(json["items"][1]["restrictions"], serde_json::json!(["AUT", "GER", "SUI"]));
    assert_eq!(json["items"][0]["dateIso"], "2019-06-01");
}

#[tokio::test]
async fn filters_and_sort_apply() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let app = app(&corpus, None);

    let (_, json) = get(app.clone(), "/api/search?q=tennis&photographer=IMAGO%20%2F%20Sven%20Simon").await;
    assert_eq!(ids(&json), vec!["0050000002"]);

    let (_, json) = get(app.clone(), "/api/search?q=tennis&dateStart=2020-01-01&dateEnd=2020-12-31").await;
    assert_eq!(ids(&json), vec!["0050000002"]);

    let (_, json) = get(app.clone(), "/api/search?q=tennis&photographer=%20IMAGO%20%2F%20Sven%20Simon").await;
    assert_eq!(json["total"], 0);
    let (_, json) = get(app.clone(), "/api/search?q=tennis&photographer=").await;
    assert_eq!(json["total"], 2);

    let (_, json) = get(app.clone(), "/api/search?q=tennis&countries=FRA").await;
    assert_eq!(ids(&json), vec!["0050000001"]);

    let (_, json) = get(app, "/api/search?q=tennis&sort=date_desc").await;
    assert_eq!(ids(&json), vec!["0050000002", "0050000001"]);
}

#[tokio::test]
async fn pagination_is_clamped() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let app = app(&corpus, None);

    let (status, json) = get(app.clone(), "/api/search?q=tennis&page=0&pageSize=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["page"], 1);
    assert_eq!(json["totalPages"], 2);
    assert_eq!(ids(&json), vec!["0050000001"]);

    let (_, json) = get(app.clone(), "/api/search?q=tennis&page=2&pageSize=1000").await;
    assert_eq!(json["pageSize"], 100);
    assert!(ids(&json).is_empty());
    assert_eq!(json["total"], 2);

    // values outside i64 or left blank are clamped, never rejected
    let (status, json) = get(app.clone(), "/api/search?q=tennis&pageSize=99999999999999999999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pageSize"], 100);
    assert_eq!(ids(&json), vec!["0050000001", "0050000002"]);

    let (status, json) = get(app.clone(), "/api/search?q=tennis&page=-5&pageSize=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["page"], 1);
    assert_eq!(json["pageSize"], 20);

    let (status, json) = get(app, "/api/search?q=tennis&page=99999999999999999999&pageSize=-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pageSize"], 1);
    assert!(ids(&json).is_empty());
    assert_eq!(json["total"], 2);
    assert_eq!(json["totalPages"], 2);
}

#[tokio::test]
async fn empty_and_stopword_queries_are_not_errors() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let app = app(&corpus, None);

    for uri in ["/api/search?q=und", "/api/search", "/api/search?q=cricket"] {
        let (status, json) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(json["total"], 0, "{uri}");
        assert_eq!(json["totalPages"], 0, "{uri}");
    }
}

#[tokio::test]
async fn bad_filter_values_are_rejected() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let app = app(&corpus, None);

    let (status, _) = get(app.clone(), "/api/search?q=tennis&dateStart=01.01.2020").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get(app, "/api/search?q=tennis&sort=newest").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analytics_counts_searches() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let app = app(&corpus, None);

    get(app.clone(), "/api/search?q=Tennis%20Finale").await;
    get(app.clone(), "/api/search?q=tennis").await;
    let (status, json) = get(app, "/api/analytics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalSearches"], 2);
    assert_eq!(json["topKeywords"][0]["keyword"], "tennis");
    assert_eq!(json["topKeywords"][0]["count"], 2);
}

#[tokio::test]
async fn malformed_records_are_not_indexed() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let app = app(&corpus, None);

    let (_, json) = get(app.clone(), "/api/search?q=kaputtes").await;
    assert_eq!(json["total"], 0);
    let (_, json) = get(app.clone(), "/doc/2").await;
    assert_eq!(json["id"], "0050000003");
    let (_, json) = get(app, "/doc/3").await;
    assert_eq!(json["error"], "not found");
}

#[tokio::test]
async fn reload_requires_token_and_swaps_index() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let app = app(&corpus, Some("secret"));

    let (status, _) = send(app.clone(), Request::post("/index/reload").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let extra = serde_json::json!([
        {"suchtext": "Golf European Tour Championship", "bildnummer": "0050000009",
         "fotografen": "IMAGO / Steinach", "datum": "02.02.2002", "hoehe": "1", "breite": "1"}
    ]);
    fs::write(&corpus, serde_json::to_vec(&extra).unwrap()).unwrap();

    let req = Request::post("/index/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, json) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["numDocs"], 1);
    assert_eq!(json["rejected"], 0);

    let (_, json) = get(app.clone(), "/api/search?q=golf").await;
    assert_eq!(ids(&json), vec!["0050000009"]);
    let (_, json) = get(app, "/api/search?q=tennis").await;
    assert_eq!(json["total"], 0);
}
