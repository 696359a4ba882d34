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

//! WebSocket client for contributing to a Refinitiv Real-Time gateway.
//!
//! The [`RefinitivWebSocketClient`] connects with the `tr_json2` subprotocol, logs in with the
//! configured identity and posts refreshes and updates to a single item. Login, keepalive and
//! acknowledgment handling run in the handler task; the client exposes the session status and
//! a stream of [`NautilusWsMessage`]s.

use std::{fmt::Debug, sync::Arc, time::Duration};

use futures_util::Stream;
use tokio::{
    sync::{
        Mutex,
        mpsc::{UnboundedReceiver, UnboundedSender},
        watch,
    },
    task::JoinHandle,
};
use tokio_tungstenite::tungstenite::http::header::USER_AGENT;
use tokio_util::sync::CancellationToken;

use super::{
    codec::encode_post,
    error::{RefinitivWsError, RefinitivWsResult},
    handler::{HandlerCommand, RefinitivWsFeedHandler},
    messages::NautilusWsMessage,
    post::{ContributionRequest, PostCorrelator, PostEnvelope},
    session::{ConnectionState, RefinitivSession, SessionStatus},
    transport::{WebSocketConfig, WebSocketTransport},
};
use crate::{
    common::consts::{
        CLOSE_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LOGIN_TIMEOUT_SECS,
        REFINITIV_USER_AGENT, REFINITIV_WS_SUBPROTOCOL,
    },
    config::RefinitivContributorConfig,
};

/// WebSocket client for contributing market price data to Refinitiv.
#[derive(Clone)]
pub struct RefinitivWebSocketClient {
    config: RefinitivContributorConfig,
    url: String,
    cmd_tx: Option<UnboundedSender<HandlerCommand>>,
    out_rx: Option<Arc<UnboundedReceiver<NautilusWsMessage>>>,
    status_rx: Option<watch::Receiver<SessionStatus>>,
    task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    correlator: PostCorrelator,
    post_lock: Arc<Mutex<()>>,
    cancellation_token: CancellationToken,
}

impl Debug for RefinitivWebSocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.status();
        f.debug_struct("RefinitivWebSocketClient")
            .field("url", &self.url)
            .field("user", &self.config.user)
            .field("app_id", &self.config.app_id)
            .field("state", &status.state)
            .field("is_authenticated", &status.authenticated)
            .field("is_shutting_down", &status.shutdown)
            .field("pending_posts", &self.correlator.pending_count())
            .finish_non_exhaustive()
    }
}

impl RefinitivWebSocketClient {
    /// Creates a new [`RefinitivWebSocketClient`] instance.
    #[must_use]
    pub fn new(config: RefinitivContributorConfig) -> Self {
        let url = config.ws_url();
        Self {
            config,
            url,
            cmd_tx: None,
            out_rx: None,
            status_rx: None,
            task_handle: Arc::new(Mutex::new(None)),
            correlator: PostCorrelator::default(),
            post_lock: Arc::new(Mutex::new(())),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Returns the WebSocket URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &RefinitivContributorConfig {
        &self.config
    }

    /// Returns the cancellation token for this client.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    /// Returns a snapshot of the session status (`Connecting` before [`Self::connect`]).
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status_rx
            .as_ref()
            .map(|rx| rx.borrow().clone())
            .unwrap_or_default()
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.status().state
    }

    /// Returns whether the transport is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Returns whether the connection is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.connection_state() == ConnectionState::Closed
    }

    /// Returns whether the gateway accepted the login.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status().authenticated
    }

    /// Returns whether the session has raised its shutdown flag.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.status().shutdown
    }

    /// Returns the number of posts awaiting acknowledgment.
    #[must_use]
    pub fn pending_posts(&self) -> usize {
        self.correlator.pending_count()
    }

    /// Returns the configured login timeout.
    #[must_use]
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(
            self.config
                .login_timeout_secs
                .unwrap_or(DEFAULT_LOGIN_TIMEOUT_SECS),
        )
    }

    /// Connects to the gateway and starts the login.
    ///
    /// Returns once the WebSocket handshake completes; use [`Self::wait_for_login`] to await the
    /// login response. A session started by an earlier call is closed first.
    ///
    /// # Errors
    ///
    /// Returns an error if the WebSocket connection cannot be established. The session is then
    /// `Closed` with its shutdown flag raised.
    pub async fn connect(&mut self) -> RefinitivWsResult<()> {
        if self.task_handle.lock().await.is_some() {
            tracing::info!("Closing previous session before reconnecting");
            if let Err(e) = self.close().await {
                tracing::warn!("Previous session did not close cleanly: {e}");
            }
        }

        tracing::info!("Connecting to Refinitiv WebSocket: {}", self.url);

        self.cmd_tx = None;
        self.out_rx = None;
        self.correlator = PostCorrelator::default();
        self.cancellation_token = CancellationToken::new();

        let ws_config = WebSocketConfig {
            url: self.url.clone(),
            headers: vec![(
                USER_AGENT.as_str().to_string(),
                REFINITIV_USER_AGENT.to_string(),
            )],
            subprotocol: Some(REFINITIV_WS_SUBPROTOCOL.to_string()),
            connect_timeout_secs: self
                .config
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
        let transport = match WebSocketTransport::connect(&ws_config, event_tx).await {
            Ok(transport) => transport,
            Err(e) => {
                let mut session = RefinitivSession::new(self.config.identity(None));
                self.status_rx = Some(session.subscribe());
                session.on_transport_error(&e.to_string());
                return Err(e);
            }
        };

        let local_ip = transport.local_addr().map(|addr| addr.ip());
        let mut session = RefinitivSession::new(self.config.identity(local_ip));
        self.status_rx = Some(session.subscribe());

        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel();
        let (out_tx, out_rx) = tokio::sync::mpsc::unbounded_channel();

        let handler = RefinitivWsFeedHandler::new(
            session,
            self.correlator.clone(),
            self.cancellation_token.clone(),
            cmd_rx,
            event_rx,
            out_tx,
        );

        // Sent before spawning so the login is the first frame written
        cmd_tx
            .send(HandlerCommand::SetTransport(transport))
            .map_err(|e| RefinitivWsError::ClientError(e.to_string()))?;

        let task_handle = tokio::spawn(handler.run());

        self.cmd_tx = Some(cmd_tx);
        self.out_rx = Some(Arc::new(out_rx));
        *self.task_handle.lock().await = Some(task_handle);

        tracing::info!("Connected to Refinitiv WebSocket");
        Ok(())
    }

    /// Waits until the login is accepted, rejected or `timeout` expires.
    ///
    /// # Errors
    ///
    /// Returns [`RefinitivWsError::Timeout`] if no login response arrives in time, the cause of
    /// the shutdown (e.g. [`RefinitivWsError::LoginRejected`]) if the session shut down before
    /// the login was accepted, or [`RefinitivWsError::NotConnected`] before [`Self::connect`].
    pub async fn wait_for_login(&self, timeout: Duration) -> RefinitivWsResult<()> {
        let mut rx = self
            .status_rx
            .clone()
            .ok_or(RefinitivWsError::NotConnected)?;

        let waited = tokio::time::timeout(timeout, rx.wait_for(|s| s.authenticated || s.shutdown))
            .await
            .map(|result| result.map(|status| status.clone()));

        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(_)) => rx.borrow().clone(),
            Err(_) => {
                return Err(RefinitivWsError::Timeout(format!(
                    "Login not confirmed within {timeout:?}"
                )));
            }
        };

        if status.authenticated {
            return Ok(());
        }

        Err(status.reason.unwrap_or(RefinitivWsError::ShuttingDown))
    }

    /// Waits until the session raises its shutdown flag, returning the cause (if any).
    ///
    /// A clean close has no cause.
    ///
    /// # Errors
    ///
    /// Returns [`RefinitivWsError::NotConnected`] before [`Self::connect`].
    pub async fn wait_for_shutdown(&self) -> RefinitivWsResult<Option<RefinitivWsError>> {
        let mut rx = self
            .status_rx
            .clone()
            .ok_or(RefinitivWsError::NotConnected)?;

        let waited = rx
            .wait_for(|s| s.shutdown)
            .await
            .map(|status| status.reason.clone());

        let reason = match waited {
            Ok(reason) => reason,
            Err(_) => rx.borrow().reason.clone(),
        };

        Ok(reason)
    }

    /// Posts a contribution, returning the envelope with its assigned post ID.
    ///
    /// IDs are assigned and the post enqueued under one lock, so the wire order of posts
    /// matches their ID order.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is not connected, the login has not been accepted, the
    /// session is shutting down, or the handler has stopped.
    pub async fn send_post(&self, request: ContributionRequest) -> RefinitivWsResult<PostEnvelope> {
        let cmd_tx = self.cmd_tx.as_ref().ok_or(RefinitivWsError::NotConnected)?;

        let status = self.status();
        if status.shutdown {
            return Err(RefinitivWsError::ShuttingDown);
        }
        if !status.authenticated {
            return Err(RefinitivWsError::Authentication(
                "Login not accepted".to_string(),
            ));
        }
        if status.state != ConnectionState::Authenticated {
            return Err(RefinitivWsError::InvalidState {
                state: status.state,
                operation: "send_post".to_string(),
            });
        }

        let _guard = self.post_lock.lock().await;

        let envelope = PostEnvelope::new(self.correlator.next_id(), self.config.request_ack, request);
        let payload = encode_post(&envelope)?;

        cmd_tx
            .send(HandlerCommand::Post {
                envelope: Box::new(envelope.clone()),
                payload,
            })
            .map_err(|e| RefinitivWsError::Send(e.to_string()))?;

        Ok(envelope)
    }

    /// Returns a stream of WebSocket messages.
    ///
    /// # Errors
    ///
    /// Returns an error if called before [`Self::connect`], if the stream was already taken,
    /// or if clones of this client still share the receiver.
    pub fn stream(
        &mut self,
    ) -> RefinitivWsResult<impl Stream<Item = NautilusWsMessage> + 'static> {
        let rx = self.out_rx.take().ok_or_else(|| {
            RefinitivWsError::ClientError(
                "Stream receiver already taken or not connected".to_string(),
            )
        })?;
        let mut rx = Arc::try_unwrap(rx).map_err(|_| {
            RefinitivWsError::ClientError(
                "Cannot take ownership of stream receiver, other references exist".to_string(),
            )
        })?;

        Ok(async_stream::stream! {
            while let Some(msg) = rx.recv().await {
                yield msg;
            }
        })
    }

    /// Closes the WebSocket connection and waits for the handler to stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler task failed.
    pub async fn close(&self) -> RefinitivWsResult<()> {
        tracing::info!("Closing Refinitiv WebSocket connection");

        if let Some(cmd_tx) = &self.cmd_tx
            && cmd_tx.send(HandlerCommand::Disconnect).is_err()
        {
            tracing::debug!("Handler already stopped");
        }

        let Some(mut handle) = self.task_handle.lock().await.take() else {
            return Ok(());
        };

        match tokio::time::timeout(Duration::from_secs(CLOSE_TIMEOUT_SECS), &mut handle).await {
            Ok(Ok(())) => {
                tracing::debug!("Handler task completed");
                Ok(())
            }
            Ok(Err(e)) => Err(RefinitivWsError::ClientError(format!(
                "Handler task failed: {e}"
            ))),
            Err(_) => {
                tracing::warn!("Handler did not stop within {CLOSE_TIMEOUT_SECS}s, cancelling");
                self.cancellation_token.cancel();
                handle.abort();
                Ok(())
            }
        }
    }
}
