//! Gemini `generateContent` REST wire format
//!
//! Request building and response parsing only; the HTTP call lives in the
//! platform transports.

use serde::{Deserialize, Serialize};

use super::collaborator::GenerateRequest;
use super::error::CollaboratorError;

pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// `POST` target for a model. The key travels in a header, not the URL.
pub fn endpoint(model: &str) -> String {
    format!("{API_BASE}/{model}:generateContent")
}

pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// JSON body for a request.
pub fn request_body(request: &GenerateRequest) -> Result<String, CollaboratorError> {
    let body = RequestBody {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: request.system_instruction.clone(),
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: request.prompt.clone(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
        },
    };
    Ok(serde_json::to_string(&body)?)
}

/// Concatenated text of the first candidate.
pub fn parse_response(raw: &str) -> Result<String, CollaboratorError> {
    let body: ResponseBody = serde_json::from_str(raw)?;
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(CollaboratorError::Empty);
    }
    Ok(text)
}

/// Map a non-2xx status to an error.
pub fn check_status(status: u16) -> Result<(), CollaboratorError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(CollaboratorError::Status { status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_shape() {
        let req = GenerateRequest::chat("saanvi", "what is a mesh?");
        let json: serde_json::Value = serde_json::from_str(&request_body(&req).unwrap()).unwrap();
        assert!(json["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("You are Saanvi"));
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "what is a mesh?");
        assert!((json["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn parses_candidate_text() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        assert_eq!(parse_response(raw).unwrap(), "Hello world");
    }

    #[test]
    fn empty_and_malformed_responses() {
        assert!(matches!(parse_response(r#"{"candidates":[]}"#), Err(CollaboratorError::Empty)));
        assert!(matches!(parse_response(r#"{}"#), Err(CollaboratorError::Empty)));
        assert!(matches!(parse_response("<html>"), Err(CollaboratorError::Malformed(_))));
    }

    #[test]
    fn status_and_endpoint() {
        assert!(check_status(200).is_ok());
        assert!(matches!(check_status(429), Err(CollaboratorError::Status { status: 429 })));
        assert_eq!(
            endpoint("gemini-3-flash-preview"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }
}
