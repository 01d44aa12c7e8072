//! Provider Query Handlers

use serde::Serialize;
use std::sync::Arc;

use crate::application::ports::SpeechProviderPort;
use crate::application::queries::CheckProviderHealth;

/// provider 健康状态
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub reachable: bool,
}

/// CheckProviderHealth Handler
pub struct CheckProviderHealthHandler {
    provider: Arc<dyn SpeechProviderPort>,
}

impl CheckProviderHealthHandler {
    pub fn new(provider: Arc<dyn SpeechProviderPort>) -> Self {
        Self { provider }
    }

    pub async fn handle(&self, _query: CheckProviderHealth) -> ProviderHealth {
        let reachable = self.provider.health_check().await;
        if !reachable {
            tracing::warn!("Speech provider is not reachable");
        }
        ProviderHealth { reachable }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeSpeechProvider;

    #[tokio::test]
    async fn test_fake_provider_is_healthy() {
        let handler = CheckProviderHealthHandler::new(Arc::new(FakeSpeechProvider::with_defaults()));
        assert!(handler.handle(CheckProviderHealth).await.reachable);
    }
}
