//! Gemini collaborator over the browser `fetch` API

use tracing::{debug, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::core::collaborator::{Collaborator, GenerateRequest};
use crate::core::error::CollaboratorError;
use crate::core::gemini::{check_status, endpoint, parse_response, request_body, API_KEY_HEADER};

fn js_err(e: JsValue) -> CollaboratorError {
    CollaboratorError::Transport(format!("{e:?}"))
}

#[derive(Clone)]
pub struct BrowserGemini {
    api_key: Option<String>,
}

impl BrowserGemini {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Key from `window.__sandbox_api_key`, if the page set one.
    pub fn from_window() -> Self {
        let key = js_sys::eval("window.__sandbox_api_key")
            .ok()
            .and_then(|v| v.as_string());
        Self::new(key)
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn post(&self, url: &str, key: &str, body: &str) -> Result<String, CollaboratorError> {
        let headers = Headers::new().map_err(js_err)?;
        headers.set(API_KEY_HEADER, key).map_err(js_err)?;
        headers.set("Content-Type", "application/json").map_err(js_err)?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_headers(&headers.into());
        opts.set_mode(RequestMode::Cors);
        opts.set_body(&JsValue::from_str(body));

        let request = Request::new_with_str_and_init(url, &opts).map_err(js_err)?;
        let window = web_sys::window()
            .ok_or_else(|| CollaboratorError::Transport("no window".to_string()))?;
        let resp_val = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_err)?;
        let resp: Response = resp_val
            .dyn_into()
            .map_err(|_| CollaboratorError::Malformed("not a Response".to_string()))?;
        check_status(resp.status())?;

        let text = JsFuture::from(resp.text().map_err(js_err)?)
            .await
            .map_err(js_err)?;
        text.as_string()
            .ok_or_else(|| CollaboratorError::Malformed("body is not text".to_string()))
    }
}

impl Collaborator for BrowserGemini {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, CollaboratorError> {
        let key = self.api_key.as_deref().ok_or(CollaboratorError::MissingApiKey)?;
        let model = request.model();
        let body = request_body(request)?;

        debug!(%model, kind = ?request.kind, "Collaborator request");
        let raw = self.post(&endpoint(model), key, &body).await?;
        let text = parse_response(&raw)?;
        info!(%model, chars = text.len(), "Collaborator replied");
        Ok(text)
    }
}
