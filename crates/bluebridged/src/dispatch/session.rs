//! Per-connection client session loop.

use tracing::debug;

use bluebridge_wire::{WireError, read_frame};

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::DISPATCH_TARGET;
use super::reply::{Flow, write_reply};
use super::router::{BridgeContext, CommandRouter};

/// Connection handler running one command loop per client.
///
/// Commands are strictly sequential on a connection: each one is fully
/// replied to before the next frame is read. Error replies keep the loop
/// alive; the loop ends on EXIT (after `BYE` goes out), on end-of-stream, or
/// on a transport fault on the connection itself. The loop owns its stream,
/// so the transport handle is released exactly once on every exit path.
pub(crate) struct ClientSessionHandler {
    router: CommandRouter,
    context: BridgeContext,
}

impl ClientSessionHandler {
    pub(crate) fn new(router: CommandRouter, context: BridgeContext) -> Self {
        Self { router, context }
    }

    fn run(&self, mut stream: ConnectionStream) {
        loop {
            let line = match read_frame(&mut stream) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!(target: DISPATCH_TARGET, "client disconnected");
                    break;
                }
                Err(error) => {
                    self.fault("failed to read command frame", &error);
                    break;
                }
            };

            // Blank input lines are skipped without a reply.
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let outcome = self.router.dispatch(trimmed, &self.context);
            if let Err(error) = write_reply(&mut stream, &outcome.reply) {
                self.fault("failed to write reply", &error);
                break;
            }
            if matches!(outcome.flow, Flow::Close) {
                debug!(target: DISPATCH_TARGET, "client session ended by EXIT");
                break;
            }
        }
    }

    /// Transport faults are fatal to this connection only; they surface on
    /// the notification sink, never on any other connection.
    fn fault(&self, detail: &str, error: &WireError) {
        debug!(target: DISPATCH_TARGET, %error, detail, "client connection fault");
        self.context
            .sink
            .connection_fault(&format!("{detail}: {error}"));
    }
}

impl ConnectionHandler for ClientSessionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.run(stream);
    }
}
