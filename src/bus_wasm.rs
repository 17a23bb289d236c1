//! Cross-tab signal bus over the browser `BroadcastChannel`
//!
//! The channel callback only buffers text; envelopes are decoded and
//! applied when the session drains the buffer at the start of a frame.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{BroadcastChannel, MessageEvent};

use crate::core::error::SignalError;
use crate::core::signal::{decode_all, Envelope, SignalBus, CHANNEL_NAME};

/// Shared message buffer - channel callback pushes, session drains in frame()
type MessageBuffer = Rc<RefCell<VecDeque<String>>>;

pub struct BrowserBus {
    channel: Option<BroadcastChannel>,
    buffer: MessageBuffer,
    /// Kept alive for as long as the channel is subscribed
    _on_message: Closure<dyn Fn(MessageEvent)>,
}

impl BrowserBus {
    pub fn open() -> Result<Self, SignalError> {
        let channel = BroadcastChannel::new(CHANNEL_NAME)
            .map_err(|e| SignalError::Publish(format!("{e:?}")))?;
        let buffer: MessageBuffer = Rc::new(RefCell::new(VecDeque::new()));

        let sink = buffer.clone();
        let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
            if let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() {
                sink.borrow_mut().push_back(txt.into());
            }
        }) as Box<dyn Fn(MessageEvent)>);
        channel.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        info!(channel = CHANNEL_NAME, "Signal channel open");
        Ok(Self {
            channel: Some(channel),
            buffer,
            _on_message: on_message,
        })
    }
}

impl SignalBus for BrowserBus {
    fn publish(&mut self, envelope: &Envelope) -> Result<(), SignalError> {
        let channel = self.channel.as_ref().ok_or(SignalError::Closed)?;
        let raw = envelope.encode()?;
        channel
            .post_message(&JsValue::from_str(&raw))
            .map_err(|e| SignalError::Publish(format!("{e:?}")))
    }

    fn drain(&mut self) -> Vec<Envelope> {
        let raw: Vec<String> = self.buffer.borrow_mut().drain(..).collect();
        decode_all(raw)
    }

    fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.set_onmessage(None);
            channel.close();
            self.buffer.borrow_mut().clear();
            debug!(channel = CHANNEL_NAME, "Signal channel closed");
        }
    }
}

impl Drop for BrowserBus {
    fn drop(&mut self) {
        self.close();
    }
}
