use metrics_exporter_prometheus::PrometheusHandle;
use portfolio_contact::config::StorageConfig;
use portfolio_contact::contact::{
    ContactStore, ContactSubmission, CsvContactStore, InMemoryContactStore, StoreError,
    StoredContact,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store selected at startup from `CONTACTS_PATH`.
pub(crate) enum ConfiguredStore {
    Memory(InMemoryContactStore),
    Csv(CsvContactStore),
}

impl ConfiguredStore {
    pub(crate) fn from_config(config: &StorageConfig) -> Result<Self, StoreError> {
        match &config.contacts_path {
            Some(path) => Ok(Self::Csv(CsvContactStore::open(path)?)),
            None => Ok(Self::Memory(InMemoryContactStore::new())),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Memory(_) => "in-memory".to_string(),
            Self::Csv(store) => format!("csv:{}", store.path().display()),
        }
    }
}

impl ContactStore for ConfiguredStore {
    fn create(&self, submission: ContactSubmission) -> Result<StoredContact, StoreError> {
        match self {
            Self::Memory(store) => store.create(submission),
            Self::Csv(store) => store.create(submission),
        }
    }

    fn list(&self) -> Result<Vec<StoredContact>, StoreError> {
        match self {
            Self::Memory(store) => store.list(),
            Self::Csv(store) => store.list(),
        }
    }
}
