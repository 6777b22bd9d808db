// src/state.rs

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use mongodb::Database;

use crate::{
    cache::{CacheLayer, HotCache, NoCache},
    config::Config,
    db::{MemoryStore, MongoStore, Store},
    error::AppError,
    models::{free_quiz::FreeQuiz, score_match_batch::ScoreMatchBatch},
    utils::hash::hash_password,
};

/// The single admin account, with its password already hashed.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub username: String,
    pub password_hash: String,
}

impl AdminAccount {
    /// `None` when either credential is missing; logins are then always refused.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        match (&config.admin_username, &config.admin_password) {
            (Some(username), Some(password)) => Ok(Some(Self {
                username: username.clone(),
                password_hash: hash_password(password)?,
            })),
            _ => Ok(None),
        }
    }
}

/// Shared handler state. Stores and the cache are trait objects so the
/// server and the tests can plug in different backends.
#[derive(Clone)]
pub struct AppState {
    pub free_quizzes: Arc<dyn Store<FreeQuiz>>,
    pub batches: Arc<dyn Store<ScoreMatchBatch>>,
    pub cache: Arc<dyn CacheLayer>,
    pub admin: Option<Arc<AdminAccount>>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        free_quizzes: Arc<dyn Store<FreeQuiz>>,
        batches: Arc<dyn Store<ScoreMatchBatch>>,
        cache: Arc<dyn CacheLayer>,
    ) -> Result<Self, AppError> {
        let admin = AdminAccount::from_config(&config)?.map(Arc::new);
        if admin.is_none() {
            tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set; admin login is disabled");
        }

        Ok(Self {
            free_quizzes,
            batches,
            cache,
            admin,
            config,
        })
    }

    /// MongoDB-backed stores with the in-memory response cache.
    pub fn with_mongo(config: Config, db: &Database) -> Result<Self, AppError> {
        let cache = Self::hot_cache(&config);
        Self::new(
            config,
            Arc::new(MongoStore::<FreeQuiz>::new(db)),
            Arc::new(MongoStore::<ScoreMatchBatch>::new(db)),
            cache,
        )
    }

    /// Everything in process. Used by the integration tests and by
    /// `MONGODB_URI=memory` for local runs without a database.
    pub fn in_memory(config: Config) -> Result<Self, AppError> {
        let cache = Self::hot_cache(&config);
        Self::new(
            config,
            Arc::new(MemoryStore::<FreeQuiz>::new()),
            Arc::new(MemoryStore::<ScoreMatchBatch>::new()),
            cache,
        )
    }

    /// `CACHE_TTL_SECS=0` turns response caching off.
    fn hot_cache(config: &Config) -> Arc<dyn CacheLayer> {
        if config.cache_ttl_secs == 0 {
            tracing::info!("Response cache disabled");
            return Arc::new(NoCache);
        }
        Arc::new(HotCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_max_entries,
        ))
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
