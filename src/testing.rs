use crate::errors::{DashboardError, FetchCause};
use crate::fetch::{Backend, Resource};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct MockBackend {
    responses: HashMap<Resource, Result<Value, FetchCause>>,
    delays: HashMap<Resource, Duration>,
    calls: Mutex<Vec<Resource>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, resource: Resource, body: Value) -> Self {
        self.responses.insert(resource, Ok(body));
        self
    }

    pub fn fail(mut self, resource: Resource, cause: FetchCause) -> Self {
        self.responses.insert(resource, Err(cause));
        self
    }

    pub fn delay(mut self, resource: Resource, delay: Duration) -> Self {
        self.delays.insert(resource, delay);
        self
    }

    pub fn calls(&self) -> Vec<Resource> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, resource: &Resource) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| *call == resource)
            .count()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn get(&self, resource: &Resource) -> Result<Value, DashboardError> {
        self.calls.lock().unwrap().push(resource.clone());
        if let Some(delay) = self.delays.get(resource) {
            tokio::time::sleep(*delay).await;
        }
        match self.responses.get(resource) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(cause)) => Err(DashboardError::fetch(resource.kind().name(), cause.clone())),
            None => Err(DashboardError::fetch(resource.kind().name(), FetchCause::Status(404))),
        }
    }
}
