use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::json;
use tower::util::ServiceExt;

use wikistack::{
    app_state::AppState,
    config::Config,
    database::WikiDatabase,
    ent_framework::EntBuilder,
    entities::{EntPage, EntUser},
    wiki_interface::create_wiki_router,
};

struct TestHarness {
    db: WikiDatabase,
    router: Router,
}

impl TestHarness {
    async fn setup() -> Self {
        let db = WikiDatabase::new_in_memory().await.expect("database");
        let config = Config::from_lookup(|_| None).expect("config");
        let router = create_wiki_router(AppState::with_database(db.clone(), config));
        Self { db, router }
    }

    async fn get(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&body).expect("json body")))
                    .expect("request"),
            )
            .await
            .expect("response")
    }

    async fn post_form(&self, uri: &str, body: &str) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response")
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

fn kate_page() -> serde_json::Value {
    json!({
        "name": "Kate",
        "email": "JS@gmail.com",
        "title": "YDKJS",
        "content": "This is the beginning of the End"
    })
}

#[tokio::test]
async fn get_root_responds_with_200() {
    let harness = TestHarness::setup().await;
    let response = harness.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("All pages"));
}

#[tokio::test]
async fn get_wiki_redirects_home() {
    let harness = TestHarness::setup().await;
    let response = harness.get("/wiki/").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn get_add_responds_with_200() {
    let harness = TestHarness::setup().await;
    let response = harness.get("/wiki/add").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(r#"<form method="POST" action="/wiki/">"#));
}

#[tokio::test]
async fn get_unknown_page_responds_with_404() {
    let harness = TestHarness::setup().await;
    let response = harness.get("/wiki/dne").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("404 Not Found"));
}

#[tokio::test]
async fn get_existing_page_responds_with_200() {
    let harness = TestHarness::setup().await;
    let page = EntPage::create()
        .title("Cracking the Code")
        .content("Will the code crack you?")
        .savex(&harness.db)
        .await
        .unwrap();

    let response = harness.get(&page.route()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<h1>Cracking the Code</h1>"));
    assert!(body.contains("<p>Will the code crack you?</p>"));
}

#[tokio::test]
async fn get_search_responds_with_200() {
    let harness = TestHarness::setup().await;
    let response = harness.get("/wiki/search").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Search by tag"));
}

#[tokio::test]
async fn get_search_with_tag_lists_matches() {
    let harness = TestHarness::setup().await;
    EntPage::create()
        .title("YDKJS")
        .content("This is the beginning of the End")
        .tags("JS, Infinite Loop")
        .savex(&harness.db)
        .await
        .unwrap();
    EntPage::create()
        .title("AI revolution")
        .content("Who will rule who?")
        .tags("AI")
        .savex(&harness.db)
        .await
        .unwrap();

    let response = harness.get("/wiki/search?search=Infinite%20Loop").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"href="/wiki/YDKJS""#));
    assert!(!body.contains("AI revolution"));
}

#[tokio::test]
async fn get_similar_for_unknown_page_responds_with_404() {
    let harness = TestHarness::setup().await;
    let response = harness.get("/wiki/DNE/similar").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_similar_responds_with_200() {
    let harness = TestHarness::setup().await;
    EntPage::create()
        .title("YDKJS")
        .content("This is the beginning of the End")
        .savex(&harness.db)
        .await
        .unwrap();

    let response = harness.get("/wiki/YDKJS/similar").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No pages found."));
}

#[tokio::test]
async fn get_similar_lists_pages_sharing_tags() {
    let harness = TestHarness::setup().await;
    for (title, tags) in [("YDKJS", "JS, Closure"), ("Cracking the Code", "JS"), ("AI revolution", "AI")] {
        EntPage::create()
            .title(title)
            .content("body")
            .tags(tags)
            .savex(&harness.db)
            .await
            .unwrap();
    }

    let body = body_text(harness.get("/wiki/YDKJS/similar").await).await;
    assert!(body.contains(r#"href="/wiki/Cracking_the_Code""#));
    assert!(!body.contains(r#"href="/wiki/YDKJS""#));
    assert!(!body.contains(r#"href="/wiki/AI_revolution""#));
}

#[tokio::test]
async fn post_wiki_responds_with_302() {
    let harness = TestHarness::setup().await;
    let response = harness.post_json("/wiki/", kate_page()).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some("/wiki/YDKJS"));
}

#[tokio::test]
async fn post_wiki_creates_a_page() {
    let harness = TestHarness::setup().await;
    harness.post_json("/wiki/", kate_page()).await;

    let pages = EntPage::gen_all(&harness.db).await.unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].title, "YDKJS");

    let author = pages[0].gen_author(&harness.db).await.unwrap().unwrap();
    assert_eq!(author.email, "JS@gmail.com");
}

#[tokio::test]
async fn post_wiki_accepts_forms_and_reuses_authors() {
    let harness = TestHarness::setup().await;
    let first = harness
        .post_form(
            "/wiki",
            "name=Kate&email=JS%40gmail.com&title=Cracking+the+Code&content=Will+the+code+crack+you%3F&tags=JS%2C+Algorithms&status=open",
        )
        .await;
    assert_eq!(first.status(), StatusCode::FOUND);
    assert_eq!(location(&first), Some("/wiki/Cracking_the_Code"));

    harness.post_json("/wiki/", kate_page()).await;
    assert_eq!(EntUser::gen_all(&harness.db).await.unwrap().len(), 1);

    let page = EntPage::gen_by_url_title(&harness.db, "Cracking_the_Code")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(page.tags, vec!["JS", "Algorithms"]);
}

#[tokio::test]
async fn post_wiki_with_invalid_status_stores_nothing() {
    let harness = TestHarness::setup().await;
    let mut body = kate_page();
    body["status"] = json!("fail");

    let response = harness.post_json("/wiki/", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("status must be one of"));
    assert_eq!(EntPage::count(&harness.db).await.unwrap(), 0);
    assert!(EntUser::gen_all(&harness.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn post_wiki_without_content_responds_with_400() {
    let harness = TestHarness::setup().await;
    let response = harness
        .post_json("/wiki/", json!({ "name": "Kate", "email": "JS@gmail.com", "title": "YDKJS" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("content is required"));
}

#[tokio::test]
async fn users_routes() {
    let harness = TestHarness::setup().await;
    harness.post_json("/wiki/", kate_page()).await;
    let kate = EntUser::gen_all(&harness.db).await.unwrap().remove(0);

    let list = harness.get("/users").await;
    assert_eq!(list.status(), StatusCode::OK);
    assert!(body_text(list).await.contains(&kate.route()));

    let profile = harness.get(&kate.route()).await;
    assert_eq!(profile.status(), StatusCode::OK);
    assert!(body_text(profile).await.contains(r#"href="/wiki/YDKJS""#));

    let missing = harness.get("/users/9999").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_user_id_responds_with_404_page() {
    let harness = TestHarness::setup().await;
    let response = harness.get("/users/abc").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("404 Not Found"));
    assert!(body.contains("<nav>"));
}

#[tokio::test]
async fn page_titled_like_a_fixed_route_stays_reachable() {
    let harness = TestHarness::setup().await;
    let mut body = kate_page();
    body["title"] = json!("search");
    body["content"] = json!("Finding things");

    let response = harness.post_json("/wiki/", body).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let target = location(&response).expect("location").to_string();
    assert_ne!(target, "/wiki/search");

    let page = harness.get(&target).await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(body_text(page).await.contains("<p>Finding things</p>"));
}

#[tokio::test]
async fn health_reports_page_count() {
    let harness = TestHarness::setup().await;
    harness.post_json("/wiki/", kate_page()).await;

    let response = harness.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["pages"], 1);
}

#[tokio::test]
async fn unknown_routes_respond_with_404() {
    let harness = TestHarness::setup().await;
    let response = harness.get("/nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
