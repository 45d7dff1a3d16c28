/// WebSocket bridge to the upstream data/assistant backend
use actix::prelude::*;
use actix_web_actors::ws;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::dataset::rows_from_json;
use crate::messages::{InboundMessage, OutboundMessage};
use crate::session::ExplorerSession;

/// How often heartbeat pings are sent (and the chat outbox is flushed)
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// How long before lack of peer response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state for all WebSocket connections and HTTP handlers
pub struct AppState {
    pub session: Arc<Mutex<ExplorerSession>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: Arc::new(Mutex::new(ExplorerSession::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket connection actor. Applies the three inbound shapes to the
/// session and flushes queued chat lines back to the peer.
pub struct ExplorerWebSocket {
    hb: Instant,
    state: actix_web::web::Data<AppState>,
}

impl ExplorerWebSocket {
    pub fn new(state: actix_web::web::Data<AppState>) -> Self {
        Self {
            hb: Instant::now(),
            state,
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                log::warn!("websocket peer heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");

            // Flush outbound chat queued by the session since last tick.
            let outgoing = {
                let mut session = act.state.session.lock().unwrap();
                session.drain_outbox()
            };
            for text in outgoing {
                let msg = OutboundMessage::Chat { text };
                ctx.text(serde_json::to_string(&msg).unwrap());
            }
        });
    }

    fn handle_inbound(&mut self, msg: InboundMessage) {
        let mut session = self.state.session.lock().unwrap();
        match msg {
            InboundMessage::DataUpdate {
                rows,
                headers,
                total_row_count,
            } => {
                let values: Vec<serde_json::Value> = rows
                    .into_iter()
                    .map(|obj| serde_json::Value::Object(obj.into_iter().collect()))
                    .collect();
                let rows = rows_from_json(&values);
                log::info!(
                    "data update: {} rows, {} columns",
                    rows.len(),
                    headers.len()
                );
                session.apply_update(rows, headers, total_row_count);
            }

            InboundMessage::Chat { text } => {
                session.receive_chat(&text);
            }

            InboundMessage::Error { text } => {
                log::warn!("backend error: {}", text);
                session.push_error(&text);
            }
        }
    }
}

impl Actor for ExplorerWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // The channel is gone; no pointer session may survive the view it
        // belonged to.
        let mut session = self.state.session.lock().unwrap();
        session.dashboard_mut().cancel_interaction();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ExplorerWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<InboundMessage>(&text) {
                Ok(inbound) => self.handle_inbound(inbound),
                Err(e) => {
                    log::warn!("unrecognized frame: {}", e);
                    let mut session = self.state.session.lock().unwrap();
                    session.push_error(&format!("unrecognized message: {}", e));
                }
            },
            Ok(ws::Message::Binary(_)) => {
                log::debug!("ignoring binary frame");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}
