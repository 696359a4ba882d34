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

//! WebSocket transport built on `tokio-tungstenite`.
//!
//! The socket is split on connect: a spawned reader task forwards every inbound frame as a
//! [`TransportEvent`], while the write half stays with the owner of the [`WebSocketTransport`].

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tokio::{net::TcpStream, sync::mpsc::UnboundedSender, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        http::{HeaderName, HeaderValue, header::SEC_WEBSOCKET_PROTOCOL},
    },
};

use super::error::{RefinitivWsError, RefinitivWsResult};

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Configuration for a WebSocket transport.
#[derive(Clone, Debug)]
pub struct WebSocketConfig {
    /// The URL to connect to.
    pub url: String,
    /// Additional handshake headers.
    pub headers: Vec<(String, String)>,
    /// Subprotocol requested in the handshake.
    pub subprotocol: Option<String>,
    /// Timeout (seconds) for the TCP connect and WebSocket handshake.
    pub connect_timeout_secs: u64,
}

/// Events forwarded by the reader task.
#[derive(Debug)]
pub enum TransportEvent {
    /// An inbound frame.
    Message(Message),
    /// The connection failed; no further events follow.
    Error(String),
    /// The connection closed; no further events follow.
    Closed,
}

/// Write half of an open WebSocket, plus its reader task.
#[allow(missing_debug_implementations)]
pub struct WebSocketTransport {
    writer: WsWriter,
    reader_task: JoinHandle<()>,
    local_addr: Option<SocketAddr>,
}

impl WebSocketTransport {
    /// Connects to `config.url` and starts forwarding inbound frames to `event_tx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid, the handshake fails or the connect timeout
    /// expires.
    pub async fn connect(
        config: &WebSocketConfig,
        event_tx: UnboundedSender<TransportEvent>,
    ) -> RefinitivWsResult<Self> {
        let mut request = config.url.as_str().into_client_request()?;

        let headers = request.headers_mut();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| RefinitivWsError::ClientError(format!("Invalid header {key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| RefinitivWsError::ClientError(format!("Invalid header {key}: {e}")))?;
            headers.insert(name, value);
        }
        if let Some(protocol) = &config.subprotocol {
            let value = HeaderValue::from_str(protocol).map_err(|e| {
                RefinitivWsError::ClientError(format!("Invalid subprotocol {protocol}: {e}"))
            })?;
            headers.insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        let timeout = Duration::from_secs(config.connect_timeout_secs);
        let (stream, response) = tokio::time::timeout(timeout, connect_async(request))
            .await
            .map_err(|_| {
                RefinitivWsError::Timeout(format!(
                    "Connection to {} not established within {}s",
                    config.url, config.connect_timeout_secs
                ))
            })?
            .map_err(|e| RefinitivWsError::Transport(format!("{}: {e}", config.url)))?;

        tracing::debug!(
            "WebSocket handshake complete: status={}, protocol={:?}",
            response.status(),
            response.headers().get(SEC_WEBSOCKET_PROTOCOL),
        );

        let local_addr = match stream.get_ref() {
            MaybeTlsStream::Plain(tcp) => tcp.local_addr().ok(),
            MaybeTlsStream::Rustls(tls) => tls.get_ref().0.local_addr().ok(),
            _ => None,
        };

        let (writer, mut reader) = stream.split();

        let reader_task = tokio::spawn(async move {
            while let Some(result) = reader.next().await {
                match result {
                    Ok(Message::Close(frame)) => {
                        tracing::debug!("Received close frame: {frame:?}");
                        break;
                    }
                    Ok(message) => {
                        if event_tx.send(TransportEvent::Message(message)).is_err() {
                            tracing::debug!("Event receiver dropped, stopping reader");
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = event_tx.send(TransportEvent::Error(e.to_string()));
                        return;
                    }
                }
            }
            let _ = event_tx.send(TransportEvent::Closed);
        });

        Ok(Self {
            writer,
            reader_task,
            local_addr,
        })
    }

    /// Returns the local address of the underlying TCP connection, if known.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Sends a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written.
    pub async fn send_text(&mut self, text: String) -> RefinitivWsResult<()> {
        self.send(Message::text(text)).await
    }

    /// Sends a raw frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written.
    pub async fn send(&mut self, message: Message) -> RefinitivWsResult<()> {
        self.writer
            .send(message)
            .await
            .map_err(|e| RefinitivWsError::Send(e.to_string()))
    }

    /// Sends a close frame and stops the reader task.
    pub async fn disconnect(mut self) {
        if let Err(e) = self.writer.send(Message::Close(None)).await {
            tracing::debug!("Close frame not sent: {e}");
        }
        if let Err(e) = self.writer.close().await {
            tracing::debug!("Error closing writer: {e}");
        }
        self.reader_task.abort();
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}
