//! Service wiring: storage backend, token service, access policy and
//! visibility filter, built once and shared by every handler.

use std::sync::Arc;

use thiserror::Error;

use jobboard_auth::{AccessPolicy, AuthConfig, CredentialVerifier, TokenService, VisibilityFilter};
use jobboard_core::{CredentialStore, EntityStore, StorageFailure};
use jobboard_infra::{InMemoryStore, PostgresStore};

use crate::config::AppConfig;

const POOL_SIZE: u32 = 10;

/// Everything the handlers need from storage.
pub trait AppStore: CredentialStore + EntityStore {}

impl<T> AppStore for T where T: CredentialStore + EntityStore + ?Sized {}

pub type SharedStore = Arc<dyn AppStore>;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to initialise storage: {0}")]
    Storage(#[from] StorageFailure),
}

pub struct AppServices {
    pub store: SharedStore,
    pub tokens: Arc<TokenService>,
    pub credentials: CredentialVerifier<SharedStore>,
    pub visibility: VisibilityFilter<SharedStore>,
    pub policy: AccessPolicy,
}

impl AppServices {
    pub fn new(store: SharedStore, auth: AuthConfig) -> Self {
        Self {
            tokens: Arc::new(TokenService::new(auth)),
            credentials: CredentialVerifier::new(store.clone()),
            visibility: VisibilityFilter::new(store.clone()),
            policy: AccessPolicy::default(),
            store,
        }
    }

    /// In-memory backend, for tests and local runs without a database.
    pub fn in_memory(auth: AuthConfig) -> (Self, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (Self::new(store.clone(), auth), store)
    }
}

/// Pick the backend from configuration.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresStore::connect(url, POOL_SIZE).await?;
            store.ensure_schema().await?;
            tracing::info!("using postgres store");
            Ok(AppServices::new(Arc::new(store), config.auth.clone()))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Ok(AppServices::in_memory(config.auth.clone()).0)
        }
    }
}
