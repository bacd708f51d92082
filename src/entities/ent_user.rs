// EntUser - page authors

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

use super::EntPage;
use crate::{
    database::WikiDatabase,
    ent_framework::{validation::require_text, EntBuilder, Entity, ValidationErrors},
    error::{AppError, AppResult},
};

const USER_COLUMNS: &str = "id, name, email, created_at";

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntUser {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for EntUser {
    const ENTITY_TYPE: &'static str = "ent_user";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl EntUser {
    pub fn create() -> EntUserBuilder {
        EntUserBuilder::default()
    }

    pub fn route(&self) -> String {
        match self.id {
            Some(id) => format!("/users/{}", id),
            None => "/users".to_string(),
        }
    }

    fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(Self {
            id: Some(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub async fn gen_nullable(db: &WikiDatabase, id: i64) -> AppResult<Option<Self>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&db.pool)
            .await?;
        row.as_ref().map(Self::from_row).transpose()
    }

    pub async fn gen_enforce(db: &WikiDatabase, id: i64) -> AppResult<Self> {
        Self::gen_nullable(db, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user with id {}", id)))
    }

    pub async fn gen_by_email(db: &WikiDatabase, email: &str) -> AppResult<Option<Self>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&db.pool)
            .await?;
        row.as_ref().map(Self::from_row).transpose()
    }

    pub async fn gen_all(db: &WikiDatabase) -> AppResult<Vec<Self>> {
        let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY name, id", USER_COLUMNS))
            .fetch_all(&db.pool)
            .await?;
        rows.iter().map(Self::from_row).collect()
    }

    /// The user with exactly this name and email, created when absent.
    /// An email already registered under another name is rejected.
    pub async fn find_or_create(db: &WikiDatabase, name: &str, email: &str) -> AppResult<Self> {
        let name = name.trim();
        let email = email.trim();

        if let Some(existing) = Self::gen_by_email(db, email).await? {
            if existing.name == name {
                return Ok(existing);
            }
            return Err(AppError::Validation(ValidationErrors::single(
                "email",
                format!("{} is already registered to another name", email),
            )));
        }

        Self::create().name(name).email(email).savex(db).await
    }

    pub async fn gen_pages(&self, db: &WikiDatabase) -> AppResult<Vec<EntPage>> {
        match self.id {
            Some(id) => EntPage::gen_by_author(db, id).await,
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntUserBuilder {
    name: Option<String>,
    email: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl EntUserBuilder {
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[async_trait]
impl EntBuilder for EntUserBuilder {
    type Entity = EntUser;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", self.name.as_deref());
        match self.email.as_deref().map(str::trim) {
            None | Some("") => errors.add("email", "email is required"),
            Some(email) if !EMAIL.is_match(email) => {
                errors.add("email", format!("'{}' is not an email address", email))
            }
            Some(_) => {}
        }
        errors.into_result()
    }

    fn build(self) -> Result<EntUser, ValidationErrors> {
        self.validate()?;
        Ok(EntUser {
            id: None,
            name: self.name.unwrap_or_default().trim().to_string(),
            email: self.email.unwrap_or_default().trim().to_string(),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }

    async fn insert(db: &WikiDatabase, user: EntUser) -> AppResult<EntUser> {
        let result = sqlx::query("INSERT INTO users (name, email, created_at) VALUES (?, ?, ?)")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.created_at)
            .execute(&db.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    AppError::Validation(ValidationErrors::single(
                        "email",
                        format!("{} is already registered", user.email),
                    ))
                }
                other => AppError::Database(other),
            })?;

        Ok(EntUser {
            id: Some(result.last_insert_rowid()),
            ..user
        })
    }
}
