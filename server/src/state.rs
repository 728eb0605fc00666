use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::services::EventService;

#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(events: EventService, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { events, identity }
    }
}
