use crate::{config::Config, database::WikiDatabase, error::AppResult};

#[derive(Clone)]
pub struct AppState {
    pub db: WikiDatabase,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        // Initialize database
        let db = WikiDatabase::new(&config.database.url).await?;
        db.init().await?;

        Ok(Self { db, config })
    }

    pub fn with_database(db: WikiDatabase, config: Config) -> Self {
        Self { db, config }
    }
}
