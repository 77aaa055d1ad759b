use crate::fetch::HttpBackend;
use crate::orchestrator::Orchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Orchestrator<HttpBackend>>,
}

impl AppState {
    pub fn new(backend: HttpBackend) -> Self {
        Self {
            dashboard: Arc::new(Orchestrator::new(backend)),
        }
    }
}
