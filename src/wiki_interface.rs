// Wiki HTTP interface - route table and handlers
// Handlers are thin: extract, call the entity layer, render a view

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    app_state::AppState,
    ent_framework::EntBuilder,
    entities::{EntPage, EntUser},
    error::{AppError, AppResult},
    middleware::FormOrJson,
    views,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Body of the add-page form
#[derive(Debug, Deserialize)]
pub struct CreatePageRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub tags: Option<String>,
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let pages = EntPage::count(&state.db).await?;
    Ok(Json(json!({ "status": "ok", "pages": pages })))
}

pub async fn index_handler(State(state): State<AppState>) -> AppResult<Html<String>> {
    let pages = EntPage::gen_all(&state.db).await?;
    Ok(Html(views::index("All pages", &pages)))
}

pub async fn wiki_root_handler() -> Response {
    found("/")
}

pub async fn add_page_handler() -> Html<String> {
    Html(views::add_page())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Html<String>> {
    match query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(tag) => {
            let pages = EntPage::find_by_tag(&state.db, Some(tag)).await?;
            tracing::debug!(tag, results = pages.len(), "tag search");
            Ok(Html(views::index(&format!("Pages tagged \"{}\"", tag), &pages)))
        }
        None => Ok(Html(views::search())),
    }
}

async fn load_page(state: &AppState, url_title: &str) -> AppResult<EntPage> {
    EntPage::gen_by_url_title(&state.db, url_title)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No page at /wiki/{}", url_title)))
}

pub async fn get_page_handler(
    State(state): State<AppState>,
    Path(url_title): Path<String>,
) -> AppResult<Html<String>> {
    let page = load_page(&state, &url_title).await?;
    let author = page.gen_author(&state.db).await?;
    Ok(Html(views::wiki_page(&page, author.as_ref())))
}

pub async fn similar_pages_handler(
    State(state): State<AppState>,
    Path(url_title): Path<String>,
) -> AppResult<Html<String>> {
    let page = load_page(&state, &url_title).await?;
    let similar = page.find_similar(&state.db).await?;
    Ok(Html(views::index(&format!("Pages similar to {}", page.title), &similar)))
}

pub async fn create_page_handler(
    State(state): State<AppState>,
    FormOrJson(request): FormOrJson<CreatePageRequest>,
) -> AppResult<Response> {
    // Validate the page before touching users so a bad page leaves no author behind
    let mut builder = EntPage::create();
    if let Some(title) = request.title {
        builder = builder.title(title);
    }
    if let Some(content) = request.content {
        builder = builder.content(content);
    }
    if let Some(tags) = request.tags.as_deref() {
        builder = builder.tags(tags);
    }
    if let Some(status) = request.status {
        builder = builder.status(status);
    }
    // url_title is derived from the title on save
    if let Err(errors) = builder.validate() {
        errors.without_path("url_title").into_result()?;
    }

    let author = EntUser::find_or_create(
        &state.db,
        request.name.as_deref().unwrap_or_default(),
        request.email.as_deref().unwrap_or_default(),
    )
    .await?;
    if let Some(author_id) = author.id {
        builder = builder.author_id(author_id);
    }

    let page = builder.savex(&state.db).await?;
    tracing::info!(url_title = %page.url_title, author = %author.name, "page created");
    Ok(found(&page.route()))
}

pub async fn list_users_handler(State(state): State<AppState>) -> AppResult<Html<String>> {
    let users = EntUser::gen_all(&state.db).await?;
    Ok(Html(views::users(&users)))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Html<String>> {
    let user_id: i64 = user_id
        .parse()
        .map_err(|_| AppError::NotFound(format!("No user with id {}", user_id)))?;
    let user = EntUser::gen_enforce(&state.db, user_id).await?;
    let pages = user.gen_pages(&state.db).await?;
    Ok(Html(views::user_page(&user, &pages)))
}

async fn not_found_handler() -> AppError {
    AppError::NotFound("No such route".to_string())
}

pub fn create_wiki_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/wiki", get(wiki_root_handler).post(create_page_handler))
        .route("/wiki/", get(wiki_root_handler).post(create_page_handler))
        .route("/wiki/add", get(add_page_handler))
        .route("/wiki/search", get(search_handler))
        .route("/wiki/{url_title}", get(get_page_handler))
        .route("/wiki/{url_title}/similar", get(similar_pages_handler))
        .route("/users", get(list_users_handler))
        .route("/users/{id}", get(get_user_handler))
        .fallback(not_found_handler)
        .with_state(state)
}
