use std::sync::Arc;

use crate::infra::notifier::DeliveryNotifier;
use crate::infra::router_auth::HttpNetworkAuthorizer;
use crate::usecase::CredentialCore;

/// Core wired with the production adapters.
pub type PortalCore = CredentialCore<DeliveryNotifier, HttpNetworkAuthorizer>;

/// Shared application state passed to every handler via axum `State`.
pub struct AppState<N, A> {
    pub core: Arc<CredentialCore<N, A>>,
}

impl<N, A> AppState<N, A> {
    pub fn new(core: Arc<CredentialCore<N, A>>) -> Self {
        Self { core }
    }
}

// Manual impl: the collaborators themselves need not be `Clone`.
impl<N, A> Clone for AppState<N, A> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}
