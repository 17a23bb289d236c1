//! Gemini collaborator for the CLI
//!
//! `ureq` is blocking, so each call runs on tokio's blocking pool.

use std::time::Duration;

use tracing::{debug, info};

use crate::core::collaborator::{Collaborator, GenerateRequest};
use crate::core::error::CollaboratorError;
use crate::core::gemini::{check_status, endpoint, parse_response, request_body, API_KEY_HEADER};

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct NativeGemini {
    agent: ureq::Agent,
    api_key: Option<String>,
    /// Overrides the per-kind default model
    model: Option<String>,
}

impl NativeGemini {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(TIMEOUT).build();
        Self {
            agent,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
        }
    }

    /// `GEMINI_API_KEY` and `GEMINI_MODEL`
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("GEMINI_MODEL").ok(),
        )
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn post(agent: &ureq::Agent, url: &str, key: &str, body: &str) -> Result<String, CollaboratorError> {
    let response = match agent
        .post(url)
        .set(API_KEY_HEADER, key)
        .set("Content-Type", "application/json")
        .send_string(body)
    {
        Ok(r) => r,
        Err(ureq::Error::Status(status, _)) => {
            check_status(status)?;
            return Err(CollaboratorError::Status { status });
        }
        Err(ureq::Error::Transport(t)) => return Err(CollaboratorError::Transport(t.to_string())),
    };
    check_status(response.status())?;
    response
        .into_string()
        .map_err(|e| CollaboratorError::Transport(e.to_string()))
}

impl Collaborator for NativeGemini {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, CollaboratorError> {
        let key = self.api_key.clone().ok_or(CollaboratorError::MissingApiKey)?;
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| request.model().to_string());
        let url = endpoint(&model);
        let body = request_body(request)?;
        let agent = self.agent.clone();

        debug!(%model, kind = ?request.kind, "Collaborator request");
        let raw = tokio::task::spawn_blocking(move || post(&agent, &url, &key, &body))
            .await
            .map_err(|e| CollaboratorError::Transport(e.to_string()))??;
        let text = parse_response(&raw)?;
        info!(%model, chars = text.len(), "Collaborator replied");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collaborator::SUMMARIZE_FAILED;
    use crate::core::entities::{MeshNode, Mode, NodeVariant, Point};
    use crate::core::publisher::Snapshot;
    use crate::core::store::EntityStore;
    use crate::core::summarize_or_fallback;

    #[tokio::test]
    async fn missing_key_never_touches_network() {
        let gemini = NativeGemini::new(Some("  ".into()), None);
        assert!(!gemini.has_key());
        let req = GenerateRequest::chat("dian", "hi");
        assert!(matches!(gemini.generate(&req).await, Err(CollaboratorError::MissingApiKey)));

        let local = MeshNode::new("PEER-1000", "Field Engineer", Point::new(0.0, 0.0), 20.0, NodeVariant::Local);
        let store = EntityStore::new(local);
        let snap = Snapshot::capture(&store, Mode::Mesh, 0);
        assert_eq!(summarize_or_fallback(&gemini, Mode::Mesh, &snap).await, SUMMARIZE_FAILED);
    }
}
