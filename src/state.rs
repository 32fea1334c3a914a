use std::sync::Arc;

use crate::{asset::AssetStore, record::RecordStore, ticket::TicketAssets};

/// Shared handles, constructed once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub assets: Arc<dyn AssetStore>,
    pub ticket: Arc<TicketAssets>,
    pub secret_key: Arc<str>,
}
