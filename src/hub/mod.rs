//! Control hub: inbound request handling and the control context.
//!
//! All mutable control state lives in one [`ControlContext`] owned by
//! the hub loop and passed explicitly into every handler. There are no
//! process-wide singletons; a test can build a context, feed requests
//! through [`HubService`], and inspect the result directly.

pub mod http;
pub mod server;

use log::{info, warn};
use serde::Serialize;

use crate::arbiter::{ActuatorArbiter, ActuatorState, ManualOverrideSet, ToggleTarget};
use crate::config::SystemConfig;
use crate::error::AuthError;
use crate::frame::SensorFrame;
use crate::hub::http::{Request, Response};
use crate::ticks::Ticks;
use crate::transport::{line, signed};

/// Upstream link flags reported in the status snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkFlags {
    pub wifi: bool,
    pub firebase: bool,
    pub iot: bool,
}

/// Every piece of mutable control state, in one place.
pub struct ControlContext {
    pub frame: SensorFrame,
    pub overrides: ManualOverrideSet,
    pub arbiter: ActuatorArbiter,
    pub links: LinkFlags,
}

impl ControlContext {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            frame: SensorFrame::quiet(0),
            overrides: ManualOverrideSet::default(),
            arbiter: ActuatorArbiter::new(config),
            links: LinkFlags::default(),
        }
    }

    pub fn state(&self) -> ActuatorState {
        self.arbiter.state()
    }
}

/// Status snapshot wire shape. Declaration order is the JSON key order.
#[derive(Serialize)]
struct StatusSnapshot {
    wifi: bool,
    firebase: bool,
    iot: bool,
    fan: bool,
    exhaust: bool,
    #[serde(rename = "roomLight")]
    room_light: bool,
    #[serde(rename = "mainLight")]
    main_light: bool,
    temperature: f32,
    humidity: f32,
    motion: bool,
    gas: bool,
    sound: bool,
    distance: u32,
}

/// Request handlers for the hub's HTTP surface and the line ingest.
pub struct HubService {
    api_token: String,
}

impl HubService {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            api_token: config.api_token.clone(),
        }
    }

    /// Route one parsed request. `now` is the arrival tick used for the
    /// arbitration triggered by accepted updates.
    pub fn handle(&self, ctx: &mut ControlContext, req: &Request, now: Ticks) -> Response {
        match (req.method.as_str(), req.path.as_str()) {
            ("POST", "/update") => match self.apply_update(ctx, req, now) {
                Ok(()) => Response::ok_json(r#"{"status":"ok"}"#.to_string()),
                Err(AuthError::TokenMismatch) => {
                    warn!("hub: update rejected, token mismatch");
                    Response::unauthorized()
                }
                Err(AuthError::MalformedBody) => {
                    warn!("hub: update rejected, malformed body");
                    Response::bad_request()
                }
            },
            ("GET", "/status") => Response::ok_json(self.status_json(ctx)),
            ("GET", path) if path.starts_with("/toggle/") => {
                match toggle_target(&path["/toggle/".len()..]) {
                    Some(target) => {
                        let on = ctx.overrides.toggle(target);
                        info!("hub: toggle {:?} -> {}", target, on);
                        // Re-arbitrate so the override takes effect this
                        // cycle, not on the next telemetry frame.
                        ctx.arbiter.arbitrate(&ctx.frame, &ctx.overrides, now);
                        Response::ok_text("OK")
                    }
                    None => Response::not_found(),
                }
            }
            _ => Response::not_found(),
        }
    }

    /// Authenticate, validate, and merge one update request.
    ///
    /// Token first: a bad token is 401 even when the body is also bad.
    /// State is only touched after both checks pass.
    fn apply_update(
        &self,
        ctx: &mut ControlContext,
        req: &Request,
        now: Ticks,
    ) -> Result<(), AuthError> {
        if req.header("Authorization") != Some(self.api_token.as_str()) {
            return Err(AuthError::TokenMismatch);
        }
        if req.body.is_empty() {
            return Err(AuthError::MalformedBody);
        }
        let patch: signed::UpdatePatch =
            serde_json::from_str(&req.body).map_err(|_| AuthError::MalformedBody)?;

        if let Some(sig) = req.header("X-Signature") {
            let expected = signed::signature_hex(&req.body, &self.api_token);
            if sig != expected {
                // Logged, not rejected: old node builds sign a
                // differently-whitespaced body. The token already gates.
                warn!("hub: signature mismatch (got {}, want {})", sig, expected);
            }
        }

        patch.apply(&mut ctx.frame);
        ctx.arbiter.arbitrate(&ctx.frame, &ctx.overrides, now);
        Ok(())
    }

    /// Feed one ingest line. Malformed lines are dropped silently; the
    /// channel carries no responses.
    pub fn ingest_line(&self, ctx: &mut ControlContext, raw: &str, now: Ticks) {
        if let Some(frame) = line::parse_line(raw) {
            ctx.frame = frame;
            ctx.arbiter.arbitrate(&ctx.frame, &ctx.overrides, now);
        }
    }

    fn status_json(&self, ctx: &ControlContext) -> String {
        let state = ctx.state();
        let snap = StatusSnapshot {
            wifi: ctx.links.wifi,
            firebase: ctx.links.firebase,
            iot: ctx.links.iot,
            fan: state.fan,
            exhaust: state.exhaust,
            room_light: state.room_light,
            main_light: state.main_light,
            temperature: ctx.frame.temperature_c,
            humidity: ctx.frame.humidity_pct,
            motion: ctx.frame.motion,
            gas: ctx.frame.gas,
            sound: ctx.frame.sound,
            distance: ctx.frame.distance_cm,
        };
        // Serialization of a plain struct cannot fail.
        serde_json::to_string(&snap).unwrap_or_else(|_| "{}".to_string())
    }
}

fn toggle_target(name: &str) -> Option<ToggleTarget> {
    match name {
        "fan" => Some(ToggleTarget::Fan),
        "exhaust" => Some(ToggleTarget::Exhaust),
        "room-light" => Some(ToggleTarget::RoomLight),
        "main-light" => Some(ToggleTarget::MainLight),
        _ => None,
    }
}
