//! Application state

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tollgate_auth::{PasswordHasher, SessionCookie, TokenSigner};
use tollgate_db::Database;

/// Handle used to render the Prometheus exposition
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
///
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub signer: Arc<TokenSigner>,
    pub hasher: Arc<PasswordHasher>,
    pub session: SessionCookie,
}

impl AppState {
    pub fn new(
        db: Database,
        signer: Arc<TokenSigner>,
        hasher: Arc<PasswordHasher>,
        session: SessionCookie,
    ) -> Self {
        Self {
            db,
            signer,
            hasher,
            session,
        }
    }
}
