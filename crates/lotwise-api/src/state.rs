//! Application state shared across handlers
//!
//! Wires the property store, address resolver, query router, question
//! parser, and auth service from one `AppConfig`. External clients that
//! lack an API key are replaced with null implementations so the server
//! still runs in a keyless development setup.

use crate::auth::AuthService;
use lotwise_core::config::AppConfig;
use lotwise_geo::{Geocoder, GoogleGeocoder, NullTransitFeed, TransLinkClient, TransitFeed};
use lotwise_nlp::{LlmParser, QueryParser, RuleParser};
use lotwise_queries::{AddressResolver, PropertyStore, QueryRouter};
use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Database connection pool
    pub pool: PgPool,
    /// Address-to-property resolver
    pub resolver: AddressResolver,
    /// Query dispatcher
    pub router: QueryRouter,
    /// Free-text question parser
    pub parser: Arc<dyn QueryParser>,
    /// Authentication service
    pub auth: AuthService,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: Arc<AtomicU64>,
    /// Ready status
    pub is_ready: Arc<AtomicBool>,
}

impl AppState {
    /// Create application state, connecting to the database and wiring
    /// external clients from config.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store = PropertyStore::new(&config.database.postgres_url, config.database.pool_size)
            .await?;
        Ok(Self::from_store(config, store))
    }

    /// Build state around an existing store. Used by `new` and by tests
    /// that construct a lazy pool.
    pub fn from_store(config: AppConfig, store: PropertyStore) -> Self {
        let geocoder: Option<Arc<dyn Geocoder>> = match GoogleGeocoder::from_config(&config.external)
        {
            Ok(Some(g)) => Some(Arc::new(g)),
            Ok(None) => {
                tracing::info!("no Google Maps API key; geocoding fallback disabled");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to build geocoder; continuing without it");
                None
            }
        };

        let transit: Arc<dyn TransitFeed> = match TransLinkClient::from_config(&config.external) {
            Ok(Some(t)) => Arc::new(t),
            Ok(None) => {
                tracing::info!("no TransLink API key; live transit fallback disabled");
                Arc::new(NullTransitFeed)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to build TransLink client; continuing without it");
                Arc::new(NullTransitFeed)
            }
        };

        let parser: Arc<dyn QueryParser> = match LlmParser::from_config(&config.llm) {
            Ok(Some(llm)) => Arc::new(llm),
            Ok(None) => {
                tracing::info!("no OpenAI API key; using rule-based question parsing");
                Arc::new(RuleParser::new())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to build LLM parser; using rule-based parsing");
                Arc::new(RuleParser::new())
            }
        };

        let pool = store.pool().clone();
        let auth = AuthService::new(pool.clone(), config.auth.clone());
        let resolver = AddressResolver::new(store.clone(), geocoder);
        let router = QueryRouter::new(store, transit);

        Self {
            config,
            pool,
            resolver,
            router,
            parser,
            auth,
            start_time: Instant::now(),
            request_count: Arc::new(AtomicU64::new(0)),
            is_ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl AppState {
    /// Build state with a lazy pool that never connects.
    ///
    /// Lets routing, auth-header, and validation behavior be tested without
    /// a running database.
    pub fn for_testing(config: AppConfig) -> Self {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database.postgres_url)
            .unwrap_or_else(|e| panic!("lazy pool from '{}': {e}", config.database.postgres_url));
        Self::from_store(config, PropertyStore::from_pool(pool))
    }
}
