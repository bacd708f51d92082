// EntPage - wiki page entity, its builder and the tag queries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};
use std::fmt;
use std::str::FromStr;

use super::EntUser;
use crate::{
    database::WikiDatabase,
    ent_framework::{validation::require_text, EntBuilder, Entity, ValidationErrors},
    error::{AppError, AppResult},
    markdown::render_markdown_html,
};

const PAGE_COLUMNS: &str = "id, title, url_title, content, status, tags, author_id, created_at";
const SLUG_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SLUG_LEN: usize = 5;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("word pattern"));

/// Slugs taken by fixed routes under `/wiki/`
pub const RESERVED_URL_TITLES: [&str; 2] = ["add", "search"];

/// URL-safe slug for a title: whitespace runs become `_`, anything outside
/// `[A-Za-z0-9_]` is dropped. None when nothing survives or the slug would
/// collide with a fixed route.
pub fn url_title_from(title: &str) -> Option<String> {
    let underscored = WHITESPACE_RUN.replace_all(title, "_");
    let slug = NON_WORD.replace_all(&underscored, "");
    if slug.is_empty() || RESERVED_URL_TITLES.contains(&slug.as_ref()) {
        None
    } else {
        Some(slug.into_owned())
    }
}

/// Fallback slug for pages whose title yields nothing usable
pub fn random_url_title() -> String {
    let mut rng = rand::rng();
    (0..RANDOM_SLUG_LEN)
        .map(|_| SLUG_ALPHABET[rng.random_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

/// Split a comma-separated tag string, trimming each tag and dropping
/// empties and repeats.
pub fn parse_tags(raw: &str) -> Vec<String> {
    normalise_tags(raw.split(','))
}

fn normalise_tags<'a, I: IntoIterator<Item = &'a str>>(pieces: I) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in pieces.into_iter().map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Open,
    Closed,
}

impl PageStatus {
    pub const ALL: [PageStatus; 2] = [PageStatus::Open, PageStatus::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Open => "open",
            PageStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(PageStatus::Open),
            "closed" => Ok(PageStatus::Closed),
            other => Err(format!("unknown page status '{}'", other)),
        }
    }
}

/// A wiki page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntPage {
    pub id: Option<i64>,
    pub title: String,
    pub url_title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub status: Option<PageStatus>,
    pub author_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Entity for EntPage {
    const ENTITY_TYPE: &'static str = "ent_page";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl EntPage {
    pub fn create() -> EntPageBuilder {
        EntPageBuilder::default()
    }

    pub fn route(&self) -> String {
        format!("/wiki/{}", self.url_title)
    }

    pub fn rendered_content(&self) -> String {
        render_markdown_html(&self.content)
    }

    fn from_row(row: &SqliteRow) -> AppResult<Self> {
        let tags: String = row.try_get("tags")?;
        let status = row
            .try_get::<Option<String>, _>("status")?
            .map(|s| s.parse::<PageStatus>())
            .transpose()
            .map_err(AppError::DatabaseError)?;

        Ok(Self {
            id: Some(row.try_get("id")?),
            title: row.try_get("title")?,
            url_title: row.try_get("url_title")?,
            content: row.try_get("content")?,
            tags: serde_json::from_str(&tags)?,
            status,
            author_id: row.try_get("author_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub async fn gen_nullable(db: &WikiDatabase, id: i64) -> AppResult<Option<Self>> {
        let row = sqlx::query(&format!("SELECT {} FROM pages WHERE id = ?", PAGE_COLUMNS))
            .bind(id)
            .fetch_optional(&db.pool)
            .await?;
        row.as_ref().map(Self::from_row).transpose()
    }

    /// Oldest page carrying this slug
    pub async fn gen_by_url_title(db: &WikiDatabase, url_title: &str) -> AppResult<Option<Self>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM pages WHERE url_title = ? ORDER BY id LIMIT 1",
            PAGE_COLUMNS
        ))
        .bind(url_title)
        .fetch_optional(&db.pool)
        .await?;
        row.as_ref().map(Self::from_row).transpose()
    }

    pub async fn gen_all(db: &WikiDatabase) -> AppResult<Vec<Self>> {
        let rows = sqlx::query(&format!("SELECT {} FROM pages ORDER BY id", PAGE_COLUMNS))
            .fetch_all(&db.pool)
            .await?;
        rows.iter().map(Self::from_row).collect()
    }

    pub async fn gen_by_author(db: &WikiDatabase, author_id: i64) -> AppResult<Vec<Self>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM pages WHERE author_id = ? ORDER BY id",
            PAGE_COLUMNS
        ))
        .bind(author_id)
        .fetch_all(&db.pool)
        .await?;
        rows.iter().map(Self::from_row).collect()
    }

    pub async fn count(db: &WikiDatabase) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM pages")
            .fetch_one(&db.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    /// Pages tagged with exactly `tag`. No tag, no pages.
    pub async fn find_by_tag(db: &WikiDatabase, tag: Option<&str>) -> AppResult<Vec<Self>> {
        match tag.map(str::trim).filter(|t| !t.is_empty()) {
            Some(tag) => Self::find_by_tags(db, &[tag.to_string()], None).await,
            None => Ok(Vec::new()),
        }
    }

    /// Pages sharing at least one of `tags`, optionally leaving one page out
    pub async fn find_by_tags(
        db: &WikiDatabase,
        tags: &[String],
        exclude_id: Option<i64>,
    ) -> AppResult<Vec<Self>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM pages WHERE EXISTS (SELECT 1 FROM json_each(pages.tags) WHERE json_each.value IN (",
            PAGE_COLUMNS
        ));
        let mut separated = query.separated(", ");
        for tag in tags {
            separated.push_bind(tag.clone());
        }
        separated.push_unseparated("))");

        if let Some(id) = exclude_id {
            query.push(" AND pages.id != ").push_bind(id);
        }
        query.push(" ORDER BY pages.id");

        let rows = query.build().fetch_all(&db.pool).await?;
        rows.iter().map(Self::from_row).collect()
    }

    /// Other pages with any tag in common with this one
    pub async fn find_similar(&self, db: &WikiDatabase) -> AppResult<Vec<Self>> {
        Self::find_by_tags(db, &self.tags, self.id).await
    }

    pub async fn gen_author(&self, db: &WikiDatabase) -> AppResult<Option<EntUser>> {
        match self.author_id {
            Some(author_id) => EntUser::gen_nullable(db, author_id).await,
            None => Ok(None),
        }
    }
}

/// Builder for a new page; fields stay raw until `build` validates them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntPageBuilder {
    title: Option<String>,
    url_title: Option<String>,
    content: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    status: Option<String>,
    author_id: Option<i64>,
    created_at: Option<DateTime<Utc>>,
}

impl EntPageBuilder {
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn url_title<S: Into<String>>(mut self, url_title: S) -> Self {
        self.url_title = Some(url_title.into());
        self
    }

    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Comma-separated tags, e.g. `"JS, Closure, Infinite Loop"`
    pub fn tags(mut self, raw: &str) -> Self {
        self.tags = parse_tags(raw);
        self
    }

    pub fn tag_list<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags: Vec<S> = tags.into_iter().collect();
        self.tags = normalise_tags(tags.iter().map(|t| t.as_ref()));
        self
    }

    pub fn status<S: Into<String>>(mut self, status: S) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn author_id(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    fn parsed_status(&self) -> Result<Option<PageStatus>, String> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<PageStatus>().map(Some),
        }
    }
}

#[async_trait]
impl EntBuilder for EntPageBuilder {
    type Entity = EntPage;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "title", self.title.as_deref());
        require_text(&mut errors, "url_title", self.url_title.as_deref());
        require_text(&mut errors, "content", self.content.as_deref());
        if self.parsed_status().is_err() {
            let allowed: Vec<&str> = PageStatus::ALL.iter().map(|s| s.as_str()).collect();
            errors.add("status", format!("status must be one of: {}", allowed.join(", ")));
        }
        errors.into_result()
    }

    fn build(self) -> Result<EntPage, ValidationErrors> {
        self.validate()?;
        let status = self.parsed_status().unwrap_or(None);

        Ok(EntPage {
            id: None,
            title: self.title.unwrap_or_default(),
            url_title: self.url_title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            tags: self.tags,
            status,
            author_id: self.author_id,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }

    async fn insert(db: &WikiDatabase, page: EntPage) -> AppResult<EntPage> {
        let tags = serde_json::to_string(&page.tags)?;
        let result = sqlx::query(
            "INSERT INTO pages (title, url_title, content, status, tags, author_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&page.title)
        .bind(&page.url_title)
        .bind(&page.content)
        .bind(page.status.map(|s| s.as_str()))
        .bind(tags)
        .bind(page.author_id)
        .bind(page.created_at)
        .execute(&db.pool)
        .await?;

        tracing::debug!(url_title = %page.url_title, "page inserted");
        Ok(EntPage {
            id: Some(result.last_insert_rowid()),
            ..page
        })
    }
}
