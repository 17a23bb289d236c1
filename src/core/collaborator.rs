//! External LLM collaborator
//!
//! The core sees the provider as one async text-generation call. The
//! browser implements it with `fetch`, the CLI with a blocking HTTP client
//! on tokio's blocking pool. Every failure resolves to a fixed fallback
//! string at the call site; nothing here retries.

use tracing::error;

use super::chat::{character, DEFAULT_INSTRUCTION};
use super::entities::Mode;
use super::error::CollaboratorError;
use super::publisher::Snapshot;

pub const CHAT_MODEL: &str = "gemini-3-pro-preview";
pub const ANALYSIS_MODEL: &str = "gemini-3-flash-preview";

pub const RESPOND_FAILED: &str =
    "Handshake failed. Encryption tunnel unstable. Check the collaborator API key configuration.";
pub const RESPOND_EMPTY: &str = "Handshake timeout. Signal lost in the mesh.";
pub const SUMMARIZE_FAILED: &str = "Analysis failure: Data packet corrupted during quantization.";
pub const SUMMARIZE_EMPTY: &str = "Diagnostic stream interrupted. System nominal.";

const ANALYST_INSTRUCTION: &str =
    "You are a high-speed diagnostic AI for the Sig-Nexus. Be accurate, concise, and technical.";

/// One generation call, provider-neutral.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Model override; None uses the collaborator's default for the kind
    pub model: Option<String>,
    pub kind: RequestKind,
    pub system_instruction: String,
    pub prompt: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Chat,
    Analysis,
}

impl RequestKind {
    pub fn default_model(self) -> &'static str {
        match self {
            RequestKind::Chat => CHAT_MODEL,
            RequestKind::Analysis => ANALYSIS_MODEL,
        }
    }
}

impl GenerateRequest {
    /// Chat turn for a council character. Unknown ids get the generic advisor.
    pub fn chat(character_id: &str, message: &str) -> Self {
        let (system_instruction, temperature) = match character(character_id) {
            Some(c) => (c.system_instruction, c.temperature),
            None => (DEFAULT_INSTRUCTION, 0.7),
        };
        Self {
            model: None,
            kind: RequestKind::Chat,
            system_instruction: system_instruction.to_string(),
            prompt: message.to_string(),
            temperature,
        }
    }

    /// Technical audit of the current state.
    pub fn analysis(mode: Mode, snapshot: &Snapshot) -> Self {
        let prompt = format!(
            "ACT AS: A Senior Systems Analyst for Sig-Nexus-Pro.\n\
             TASK: Perform a technical audit of the current {mode} simulation state.\n\
             DATA: {data}\n\n\
             REQUIREMENTS:\n\
             1. Provide a \"Current Status\" summary.\n\
             2. Identify specific \"Operational Risks\" or inefficiencies.\n\
             3. Give one \"Optimization Protocol\" (a specific, accurate recommendation).\n\n\
             Return the results in a clean Markdown format. Be technically accurate based on the data provided.",
            mode = mode.label(),
            data = snapshot.to_json(),
        );
        Self {
            model: None,
            kind: RequestKind::Analysis,
            system_instruction: ANALYST_INSTRUCTION.to_string(),
            prompt,
            temperature: 0.2,
        }
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.kind.default_model())
    }
}

#[allow(async_fn_in_trait)]
pub trait Collaborator {
    /// Run one generation. An empty reply is `Err(Empty)`.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, CollaboratorError>;

    async fn respond(&self, character_id: &str, message: &str) -> Result<String, CollaboratorError> {
        self.generate(&GenerateRequest::chat(character_id, message))
            .await
    }

    async fn summarize(&self, mode: Mode, snapshot: &Snapshot) -> Result<String, CollaboratorError> {
        self.generate(&GenerateRequest::analysis(mode, snapshot))
            .await
    }
}

/// Map a chat result to the text shown to the user.
pub fn reply_or_fallback(result: Result<String, CollaboratorError>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) | Err(CollaboratorError::Empty) => RESPOND_EMPTY.to_string(),
        Err(e) => {
            error!(error = %e, "Collaborator chat failed");
            RESPOND_FAILED.to_string()
        }
    }
}

/// Map an analysis result to the text shown to the user.
pub fn summary_or_fallback(result: Result<String, CollaboratorError>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) | Err(CollaboratorError::Empty) => SUMMARIZE_EMPTY.to_string(),
        Err(e) => {
            error!(error = %e, "Collaborator analysis failed");
            SUMMARIZE_FAILED.to_string()
        }
    }
}

pub async fn respond_or_fallback<C: Collaborator>(c: &C, character_id: &str, message: &str) -> String {
    reply_or_fallback(c.respond(character_id, message).await)
}

pub async fn summarize_or_fallback<C: Collaborator>(c: &C, mode: Mode, snapshot: &Snapshot) -> String {
    summary_or_fallback(c.summarize(mode, snapshot).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entities::{MeshNode, NodeVariant, Point};
    use crate::core::store::EntityStore;
    use std::cell::RefCell;

    /// Replays canned results and records requests
    struct Scripted {
        replies: RefCell<Vec<Result<String, CollaboratorError>>>,
        seen: RefCell<Vec<GenerateRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, CollaboratorError>>) -> Self {
            Self {
                replies: RefCell::new(replies),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Collaborator for Scripted {
        async fn generate(&self, request: &GenerateRequest) -> Result<String, CollaboratorError> {
            self.seen.borrow_mut().push(request.clone());
            self.replies.borrow_mut().remove(0)
        }
    }

    fn snapshot() -> Snapshot {
        let store = EntityStore::new(MeshNode::new("PEER-1000", "Field Engineer", Point::default(), 20.0, NodeVariant::Local));
        Snapshot::capture(&store, Mode::Energy, 0)
    }

    #[tokio::test]
    async fn respond_uses_character_settings() {
        let c = Scripted::new(vec![Ok("ok".into())]);
        assert_eq!(respond_or_fallback(&c, "dian", "hello").await, "ok");
        let seen = c.seen.borrow();
        let req = &seen[0];
        assert_eq!(req.temperature, 1.1);
        assert!(req.system_instruction.starts_with("You are Dian"));
        assert_eq!(req.model(), CHAT_MODEL);
    }

    #[tokio::test]
    async fn failures_resolve_to_fallbacks() {
        let c = Scripted::new(vec![
            Err(CollaboratorError::Status { status: 500 }),
            Ok("  ".into()),
            Err(CollaboratorError::MissingApiKey),
            Err(CollaboratorError::Empty),
        ]);
        assert_eq!(respond_or_fallback(&c, "ibhan", "x").await, RESPOND_FAILED);
        assert_eq!(respond_or_fallback(&c, "ibhan", "x").await, RESPOND_EMPTY);
        assert_eq!(summarize_or_fallback(&c, Mode::Energy, &snapshot()).await, SUMMARIZE_FAILED);
        assert_eq!(summarize_or_fallback(&c, Mode::Energy, &snapshot()).await, SUMMARIZE_EMPTY);
    }

    #[tokio::test]
    async fn analysis_prompt_embeds_snapshot() {
        let c = Scripted::new(vec![Ok("report".into())]);
        let snap = snapshot();
        assert_eq!(summarize_or_fallback(&c, Mode::Energy, &snap).await, "report");
        let seen = c.seen.borrow();
        let req = &seen[0];
        assert_eq!(req.kind, RequestKind::Analysis);
        assert_eq!(req.model(), ANALYSIS_MODEL);
        assert!(req.prompt.contains("Microgrid"));
        assert!(req.prompt.contains(&snap.to_json()));
    }

    #[test]
    fn unknown_character_gets_generic_instruction() {
        let req = GenerateRequest::chat("ghost", "boo");
        assert_eq!(req.system_instruction, DEFAULT_INSTRUCTION);
        assert_eq!(req.temperature, 0.7);
    }
}
