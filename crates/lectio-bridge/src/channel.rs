//! The asynchronous command/event transport between host and content surface.
//!
//! Commands flow host → content as fire-and-forget script invocations;
//! events flow content → host through a registered named handler. Both
//! directions are one-way and string-framed. The channel's contract is
//! "never throws outward": a surface that is mid-reload swallows commands,
//! and malformed inbound payloads are dropped and logged, never surfaced.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::command::Command;
use crate::event::Event;

/// The surface is transitioning or torn down and cannot evaluate script.
///
/// Expected steady-state behavior during pane (re)construction; callers that
/// need delivery defer sends until the surface signals content-ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGone;

/// Handle to the embedded, untrusted renderer. The host controls nothing
/// about the surface except this evaluation entry point.
pub trait ScriptSurface: Send + Sync {
    fn eval(&self, script: &str) -> Result<(), SurfaceGone>;
}

/// Host side of the bridge for one pane.
///
/// Constructed together with the receiver that yields decoded events; the
/// cloneable [`BridgeHandler`] is what the platform registers with the
/// renderer runtime as the named callback object.
pub struct BridgeChannel {
    surface: Arc<dyn ScriptSurface>,
    events_tx: mpsc::UnboundedSender<Event>,
}

impl BridgeChannel {
    pub fn new(surface: Arc<dyn ScriptSurface>) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (Self { surface, events_tx }, events_rx)
    }

    /// Send one command, fire-and-forget.
    ///
    /// Sends on the same channel are FIFO with respect to each other. If the
    /// surface is not ready the command is a silent no-op; there is no
    /// acknowledgment and no error to the caller.
    pub fn send(&self, command: &Command) {
        let script = command.to_invocation();
        match self.surface.eval(&script) {
            Ok(()) => {}
            Err(SurfaceGone) => {
                tracing::trace!(method = command.method(), "surface not ready, command dropped");
            }
        }
    }

    #[must_use]
    pub fn handler(&self) -> BridgeHandler {
        BridgeHandler {
            events_tx: self.events_tx.clone(),
        }
    }
}

/// The content → host callback object.
///
/// One invocation per event, one string argument per invocation. Decode
/// failures never cross this boundary.
#[derive(Clone)]
pub struct BridgeHandler {
    events_tx: mpsc::UnboundedSender<Event>,
}

impl BridgeHandler {
    /// Demultiplex one raw callback into a typed event and forward it.
    ///
    /// Returns whether the payload was accepted; malformed payloads and
    /// unknown methods are dropped with a warning.
    pub fn handle(&self, method: &str, payload: &str) -> bool {
        let event = match Event::parse(method, payload) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(method, error = %err, "dropping undecodable bridge event");
                return false;
            }
        };
        // The receiver is gone only when the pane was evicted; a late
        // renderer callback then has nowhere to go, by design.
        self.events_tx.send(event).is_ok()
    }
}
