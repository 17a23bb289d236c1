//! Canvas mount: one `SandboxSession` plus its browser resources
//!
//! The signal channel and the geolocation watch live exactly as long as
//! the canvas view is shown. Dropping a `CanvasSession` closes the channel
//! and clears the watch.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::bus_wasm::BrowserBus;
use crate::core::error::SignalError;
use crate::core::signal::{Envelope, LoopbackEndpoint, LoopbackHub, SignalBus};
use crate::core::{
    Bounds, FrameReport, GeoCoord, GlobalModifiers, Mode, SandboxConfig, SandboxSession,
    SystemRandom,
};

// ============================================================================
// Bus
// ============================================================================

/// Cross-tab channel, or an isolated loopback when the browser has none.
pub enum CanvasBus {
    Channel(BrowserBus),
    Isolated(LoopbackEndpoint),
}

impl CanvasBus {
    fn open() -> Self {
        match BrowserBus::open() {
            Ok(bus) => CanvasBus::Channel(bus),
            Err(e) => {
                warn!(error = %e, "BroadcastChannel unavailable, mesh is local only");
                CanvasBus::Isolated(LoopbackHub::new().endpoint())
            }
        }
    }
}

impl SignalBus for CanvasBus {
    fn publish(&mut self, envelope: &Envelope) -> Result<(), SignalError> {
        match self {
            CanvasBus::Channel(b) => b.publish(envelope),
            CanvasBus::Isolated(b) => b.publish(envelope),
        }
    }

    fn drain(&mut self) -> Vec<Envelope> {
        match self {
            CanvasBus::Channel(b) => b.drain(),
            CanvasBus::Isolated(b) => b.drain(),
        }
    }

    fn close(&mut self) {
        match self {
            CanvasBus::Channel(b) => b.close(),
            CanvasBus::Isolated(b) => b.close(),
        }
    }
}

// ============================================================================
// Geolocation
// ============================================================================

enum GeoUpdate {
    Fix(GeoCoord),
    Unavailable(String),
}

/// Latest watch callback result, applied on the next frame
type GeoInbox = Rc<RefCell<Option<GeoUpdate>>>;

fn read_f64(obj: &JsValue, key: &str) -> Option<f64> {
    js_sys::Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_f64())
}

struct GeoWatch {
    id: i32,
    geolocation: web_sys::Geolocation,
    _on_fix: Closure<dyn Fn(JsValue)>,
    _on_error: Closure<dyn Fn(JsValue)>,
}

impl GeoWatch {
    fn start(inbox: &GeoInbox) -> Result<Self, String> {
        let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
        let geolocation = window
            .navigator()
            .geolocation()
            .map_err(|_| "geolocation not supported".to_string())?;

        let sink = inbox.clone();
        let on_fix = Closure::wrap(Box::new(move |pos: JsValue| {
            let Ok(coords) = js_sys::Reflect::get(&pos, &JsValue::from_str("coords")) else {
                return;
            };
            if let (Some(lat), Some(lon)) = (read_f64(&coords, "latitude"), read_f64(&coords, "longitude")) {
                *sink.borrow_mut() = Some(GeoUpdate::Fix(GeoCoord { lat, lon }));
            }
        }) as Box<dyn Fn(JsValue)>);

        let sink = inbox.clone();
        let on_error = Closure::wrap(Box::new(move |err: JsValue| {
            let reason = js_sys::Reflect::get(&err, &JsValue::from_str("message"))
                .ok()
                .and_then(|v| v.as_string())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "position unavailable".to_string());
            *sink.borrow_mut() = Some(GeoUpdate::Unavailable(reason));
        }) as Box<dyn Fn(JsValue)>);

        let id = geolocation
            .watch_position_with_error_callback(
                on_fix.as_ref().unchecked_ref(),
                Some(on_error.as_ref().unchecked_ref()),
            )
            .map_err(|e| format!("{e:?}"))?;

        Ok(Self {
            id,
            geolocation,
            _on_fix: on_fix,
            _on_error: on_error,
        })
    }
}

impl Drop for GeoWatch {
    fn drop(&mut self) {
        self.geolocation.clear_watch(self.id);
    }
}

// ============================================================================
// Canvas session
// ============================================================================

pub struct CanvasSession {
    // Declared first so the bus closes before the watch is cleared
    session: SandboxSession<CanvasBus>,
    geo_inbox: GeoInbox,
    _geo_watch: Option<GeoWatch>,
}

impl CanvasSession {
    pub fn mount(config: SandboxConfig, bounds: Bounds, mode: Mode) -> Self {
        let mut session =
            SandboxSession::new(config, bounds, mode, CanvasBus::open(), Box::new(SystemRandom));
        let geo_inbox: GeoInbox = Rc::new(RefCell::new(None));
        let geo_watch = match GeoWatch::start(&geo_inbox) {
            Ok(w) => Some(w),
            Err(reason) => {
                session.set_geo_unavailable(reason);
                None
            }
        };
        info!(id = session.id(), "Canvas mounted");
        Self {
            session,
            geo_inbox,
            _geo_watch: geo_watch,
        }
    }

    pub fn session(&self) -> &SandboxSession<CanvasBus> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SandboxSession<CanvasBus> {
        &mut self.session
    }

    pub fn frame(&mut self, now: f64, modifiers: GlobalModifiers) -> FrameReport {
        if let Some(update) = self.geo_inbox.borrow_mut().take() {
            match update {
                GeoUpdate::Fix(coord) => self.session.set_geo_fix(coord),
                GeoUpdate::Unavailable(reason) => self.session.set_geo_unavailable(reason),
            }
        }
        self.session.frame(now, modifiers)
    }
}
