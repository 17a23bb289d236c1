//! Headless sandbox runner
//!
//! Spins several sessions on one in-process signal bus, scripts a scene
//! per mode and logs their state. With `GEMINI_API_KEY` set, each session
//! is audited by the collaborator at the end of the run.
//!
//! Run with: cargo run --features cli --bin sandbox-cli

use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use nexus_sandbox::bus_native::{NativeEndpoint, NativeHub};
use nexus_sandbox::core::signal::BROADCAST_TARGET;
use nexus_sandbox::core::{
    summarize_or_fallback, AchievementId, Bounds, DropPayload, Mode, Point, SandboxConfig,
    SandboxSession, Shell, SystemRandom,
};
use nexus_sandbox::gemini_native::NativeGemini;
use nexus_sandbox::time::{now_seconds, unix_millis};

type Session = SandboxSession<NativeEndpoint>;

const FRAME: Duration = Duration::from_millis(16);
const PING_EVERY: f64 = 4.0;
const MESSAGE_EVERY: f64 = 7.0;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn load_config() -> Result<SandboxConfig, Box<dyn std::error::Error>> {
    match std::env::var("SANDBOX_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)?;
            let config = SandboxConfig::from_json(&json)?;
            info!(%path, "Config loaded");
            Ok(config)
        }
        Err(_) => Ok(SandboxConfig::default()),
    }
}

/// Press and release at `p`
fn click(session: &mut Session, p: Point) -> Vec<AchievementId> {
    let events = session.pointer_down(p);
    session.pointer_up(p);
    Session::achievements_for(&events)
}

/// Lay out a starting scene for the session's mode.
fn seed_scene(session: &mut Session) -> Vec<AchievementId> {
    let c = session.bounds().center();
    match session.mode() {
        Mode::Mesh => {
            session.spawn_simulated_peer("relay", Point::new(c.x - 200.0, c.y - 120.0));
            session.spawn_simulated_peer("gateway", Point::new(c.x + 200.0, c.y + 120.0));
            Vec::new()
        }
        Mode::Energy => {
            for (subtype, dx) in [("solar", -240.0), ("battery", 0.0), ("load", 240.0)] {
                let payload = DropPayload::new(Mode::Energy, subtype);
                session.drop_item(&payload, Point::new(c.x + dx, c.y));
            }
            Vec::new()
        }
        Mode::Nano => {
            let core = Point::new(400.0, 300.0);
            let arms = [
                Point::new(320.0, 300.0),
                Point::new(480.0, 300.0),
                Point::new(400.0, 220.0),
            ];
            session.drop_item(&DropPayload::new(Mode::Nano, "C"), core);
            for p in arms {
                session.drop_item(&DropPayload::new(Mode::Nano, "H"), p);
            }
            let mut awards = Vec::new();
            for p in arms {
                awards.extend(click(session, core));
                awards.extend(click(session, p));
            }
            awards
        }
    }
}

fn log_stats(sessions: &[Session], shell: &Shell) {
    for s in sessions {
        let snap = s.snapshot();
        info!(
            id = s.id(),
            mode = %s.mode(),
            frames = s.frame_count(),
            nodes = snap.mesh.nodes,
            remote = snap.mesh.remote_peers,
            packets = snap.mesh.packets,
            components = snap.energy.components.len(),
            net_w = snap.energy.net,
            atoms = snap.nano.atoms,
            bonds = snap.nano.bonds,
            stable = snap.nano.stable,
            messages = s.messages().entries().len(),
            "stats"
        );
    }
    info!(
        achievements = ?shell.achievements.unlocked().iter().map(|a| a.key()).collect::<Vec<_>>(),
        "progress"
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nexus_sandbox=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = load_config()?;
    let count: usize = env_or("SANDBOX_SESSIONS", 3).max(1);
    let seconds: f64 = env_or("SANDBOX_SECONDS", 20.0);
    let bounds = Bounds::new(config.default_width, config.default_height);
    info!(sessions = count, seconds, "Starting sandbox");

    let mut shell = Shell::new();
    if let Ok(script) = std::env::var("SANDBOX_TERMINAL") {
        for line in script.split(';') {
            if let Some(effect) = shell.run_command(line, now_seconds(), &config) {
                debug!(command = line.trim(), ?effect, "Terminal");
            }
        }
        for line in shell.terminal.history() {
            info!(target: "terminal", "{line}");
        }
    }

    let hub = NativeHub::new();
    let mut sessions: Vec<Session> = (0..count)
        .map(|i| {
            let mode = Mode::ALL[i % Mode::ALL.len()];
            SandboxSession::new(config.clone(), bounds, mode, hub.endpoint(), Box::new(SystemRandom))
        })
        .collect();
    for s in sessions.iter_mut() {
        let awards = seed_scene(s);
        shell.award(awards);
    }

    let start = now_seconds();
    let mut frame_tick = tokio::time::interval(FRAME);
    let mut stats_interval = tokio::time::interval(Duration::from_secs(5));
    let mut next_ping = start + PING_EVERY;
    let mut next_message = start + MESSAGE_EVERY;
    let deadline = tokio::time::sleep(Duration::from_secs_f64(seconds.max(0.0)));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = frame_tick.tick() => {
                let now = now_seconds();
                for m in shell.tick(now) {
                    info!(modifier = ?m, "Modifier expired");
                }
                let flags = shell.modifiers.flags();
                for s in sessions.iter_mut() {
                    let report = s.frame(now, flags);
                    for event in &report.signals {
                        debug!(id = s.id(), ?event, "Signal");
                    }
                    for arrival in &report.arrivals {
                        debug!(id = s.id(), kind = ?arrival.kind, payload = ?arrival.payload, "Packet arrived");
                    }
                    shell.award(report.achievements);
                }

                if let Some(mesh) = sessions.iter_mut().find(|s| s.mode() == Mode::Mesh) {
                    if now >= next_ping {
                        next_ping = now + PING_EVERY;
                        mesh.ping_all();
                        shell.award([AchievementId::FirstPing]);
                    }
                    if now >= next_message {
                        next_message = now + MESSAGE_EVERY;
                        let text = format!("status check at t+{:.0}s", now - start);
                        mesh.send_message(BROADCAST_TARGET, &text, unix_millis());
                    }
                }
            }
            _ = stats_interval.tick() => log_stats(&sessions, &shell),
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted");
                break;
            }
        }
    }

    log_stats(&sessions, &shell);

    let gemini = NativeGemini::from_env();
    if gemini.has_key() {
        let audits = sessions.iter().map(|s| {
            let gemini = &gemini;
            let snap = s.snapshot();
            let mode = s.mode();
            let id = s.id().to_string();
            async move { (id, summarize_or_fallback(gemini, mode, &snap).await) }
        });
        for (id, report) in join_all(audits).await {
            info!(%id, "Audit\n{report}");
        }
    } else {
        info!("GEMINI_API_KEY not set, skipping audit");
    }

    for s in sessions {
        s.stop();
    }
    Ok(())
}
