use super::AuthorizedClient;
use crate::application_port::*;
use crate::domain_model::*;
use std::sync::Arc;

pub struct HttpTargetService {
    client: Arc<AuthorizedClient>,
}

impl HttpTargetService {
    pub fn new(client: Arc<AuthorizedClient>) -> Self {
        HttpTargetService { client }
    }
}

#[async_trait::async_trait]
impl TargetService for HttpTargetService {
    async fn list(&self) -> Result<Vec<Target>, ApiError> {
        self.client.get_json("targets").await
    }

    async fn get(&self, id: &TargetId) -> Result<Target, ApiError> {
        self.client.get_json(&format!("targets/{id}")).await
    }

    async fn create(&self, target: NewTarget) -> Result<Target, ApiError> {
        if !target.is_complete() {
            return Err(ApiError::InvalidInput(
                "first and last name are required".to_string(),
            ));
        }
        self.client.post_json("targets", &target).await
    }

    async fn delete(&self, id: &TargetId) -> Result<(), ApiError> {
        self.client.delete(&format!("targets/{id}")).await
    }
}
