use std::sync::Arc;
use std::time::Duration;

use crate::auth::Authenticator;
use crate::bus::EventBus;
use crate::store::StateStore;

/// Shared handles for the HTTP handlers. Backends are picked once at
/// startup; nothing downstream branches on the concrete implementation.
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    pub bus: Arc<dyn EventBus>,
    pub auth: Authenticator,
    pub heartbeat: Duration,
}
