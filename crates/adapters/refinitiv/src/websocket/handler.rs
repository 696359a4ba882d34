// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! WebSocket message handler for Refinitiv.
//!
//! The handler runs in a dedicated Tokio task as the I/O boundary between the client
//! orchestrator and the network layer. It exclusively owns the [`WebSocketTransport`], so login,
//! pong and post sends are serialized, and it drives the [`RefinitivSession`] with every inbound
//! record in frame order.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::{
    codec::{decode_frame, encode_request},
    error::RefinitivWsError,
    messages::NautilusWsMessage,
    post::{PostCorrelator, PostEnvelope},
    session::{ConnectionState, RefinitivSession, SessionAction},
    transport::{TransportEvent, WebSocketTransport},
};

/// Commands sent from the client to the handler.
#[allow(missing_debug_implementations)]
pub enum HandlerCommand {
    /// Hand over the connected transport and start the login.
    SetTransport(WebSocketTransport),
    /// Send an encoded post.
    Post {
        envelope: Box<PostEnvelope>,
        payload: String,
    },
    /// Close the WebSocket.
    Disconnect,
}

/// Refinitiv WebSocket feed handler.
///
/// Runs in a dedicated Tokio task, processing commands and transport events until the session
/// closes or the cancellation token fires.
#[allow(missing_debug_implementations)]
pub struct RefinitivWsFeedHandler {
    session: RefinitivSession,
    inner: Option<WebSocketTransport>,
    correlator: PostCorrelator,
    cancellation_token: CancellationToken,
    cmd_rx: UnboundedReceiver<HandlerCommand>,
    event_rx: UnboundedReceiver<TransportEvent>,
    out_tx: UnboundedSender<NautilusWsMessage>,
}

impl RefinitivWsFeedHandler {
    /// Creates a new feed handler.
    #[must_use]
    pub fn new(
        session: RefinitivSession,
        correlator: PostCorrelator,
        cancellation_token: CancellationToken,
        cmd_rx: UnboundedReceiver<HandlerCommand>,
        event_rx: UnboundedReceiver<TransportEvent>,
        out_tx: UnboundedSender<NautilusWsMessage>,
    ) -> Self {
        Self {
            session,
            inner: None,
            correlator,
            cancellation_token,
            cmd_rx,
            event_rx,
            out_tx,
        }
    }

    /// Runs the receive loop until the session is closed.
    pub async fn run(mut self) {
        loop {
            // Commands first so `SetTransport` is applied before any inbound frame
            tokio::select! {
                biased;
                Some(cmd) = self.cmd_rx.recv() => {
                    self.process_command(cmd).await;
                }
                () = self.cancellation_token.cancelled() => {
                    tracing::debug!("Cancellation requested");
                    self.disconnect().await;
                }
                Some(event) = self.event_rx.recv() => {
                    self.process_event(event).await;
                }
            }

            if self.session.state() == ConnectionState::Closed {
                break;
            }
        }

        tracing::debug!("Handler stopped");
    }

    async fn process_command(&mut self, cmd: HandlerCommand) {
        match cmd {
            HandlerCommand::SetTransport(transport) => {
                tracing::debug!("Setting WebSocket transport");
                self.inner = Some(transport);
                match self.session.on_open() {
                    Ok(actions) => self.perform(actions).await,
                    Err(e) => tracing::error!("Cannot start login: {e}"),
                }
            }
            HandlerCommand::Post { envelope, payload } => {
                self.handle_post(*envelope, payload).await;
            }
            HandlerCommand::Disconnect => {
                tracing::debug!("Disconnecting WebSocket");
                self.disconnect().await;
            }
        }
    }

    async fn handle_post(&mut self, envelope: PostEnvelope, payload: String) {
        let status = self.session.status();
        if !status.can_post() {
            tracing::warn!(
                "Dropping post {} in state {} (shutdown={})",
                envelope.post_id,
                status.state,
                status.shutdown,
            );
            let _ = self
                .out_tx
                .send(NautilusWsMessage::Error(RefinitivWsError::InvalidState {
                    state: status.state,
                    operation: format!("post {}", envelope.post_id),
                }));
            return;
        }

        if self.send_text(payload).await {
            self.correlator.register(&envelope);
            tracing::debug!(
                "Sent {} post {} for {}",
                if envelope.request.is_refresh {
                    "refresh"
                } else {
                    "update"
                },
                envelope.post_id,
                envelope.request.item,
            );
        }
    }

    async fn process_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Message(Message::Text(text)) => {
                tracing::debug!("RECEIVED: {}", text.as_str());
                self.process_frame(text.as_str()).await;
            }
            TransportEvent::Message(Message::Ping(data)) => {
                if let Some(transport) = self.inner.as_mut()
                    && let Err(e) = transport.send(Message::Pong(data)).await
                {
                    tracing::warn!("Failed to send pong frame: {e}");
                }
            }
            TransportEvent::Message(Message::Binary(data)) => {
                tracing::warn!("Ignoring binary frame of {} bytes", data.len());
            }
            TransportEvent::Message(_) => {}
            TransportEvent::Error(e) => {
                self.inner = None;
                let actions = self.session.on_transport_error(&e);
                self.perform(actions).await;
            }
            TransportEvent::Closed => {
                self.inner = None;
                let actions = self.session.on_transport_closed();
                self.perform(actions).await;
            }
        }
    }

    async fn process_frame(&mut self, text: &str) {
        let records = match decode_frame(text) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Dropping frame: {e}");
                return;
            }
        };

        for record in records {
            let actions = self.session.on_message(record);
            self.perform(actions).await;
        }
    }

    async fn perform(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::Send(request) => match encode_request(&request) {
                    Ok(payload) => {
                        self.send_text(payload).await;
                    }
                    Err(e) => tracing::error!("Failed to encode request: {e}"),
                },
                SessionAction::Notify(msg) => {
                    if let NautilusWsMessage::Ack(ack) = &msg {
                        match self.correlator.acknowledge(ack.ack_id) {
                            Some(post) if ack.is_nak() => tracing::warn!(
                                "Post {} for {} refused: {:?} {:?}",
                                ack.ack_id,
                                post.item,
                                ack.nak_code,
                                ack.text,
                            ),
                            Some(post) => {
                                tracing::debug!("Post {} for {} acknowledged", ack.ack_id, post.item);
                            }
                            None => tracing::warn!("Ack for unknown post {}", ack.ack_id),
                        }
                    }
                    if self.out_tx.send(msg).is_err() {
                        tracing::trace!("Output receiver dropped");
                    }
                }
            }
        }
    }

    async fn send_text(&mut self, payload: String) -> bool {
        let Some(transport) = self.inner.as_mut() else {
            tracing::warn!("Cannot send, {}", RefinitivWsError::NotConnected);
            return false;
        };

        tracing::debug!("SENT: {payload}");
        match transport.send_text(payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("{e}");
                let _ = self.out_tx.send(NautilusWsMessage::Error(e));
                false
            }
        }
    }

    async fn disconnect(&mut self) {
        if let Some(transport) = self.inner.take() {
            transport.disconnect().await;
        }
        let actions = self.session.on_transport_closed();
        self.perform(actions).await;
    }
}
