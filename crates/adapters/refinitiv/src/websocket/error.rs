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

//! Refinitiv WebSocket client error types.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

use super::session::ConnectionState;

/// Error types for the Refinitiv WebSocket client.
#[derive(Debug, Clone, Error)]
pub enum RefinitivWsError {
    /// Client is not connected.
    #[error("Not connected")]
    NotConnected,
    /// Transport-level error during WebSocket communication.
    #[error("Transport error: {0}")]
    Transport(String),
    /// Failed to send message over WebSocket.
    #[error("Send error: {0}")]
    Send(String),
    /// Malformed inbound payload or failed serialization.
    #[error("Codec error: {0}")]
    Codec(String),
    /// Login was refused by the gateway.
    #[error("Login rejected: stream={stream}, data={data}, text={text}")]
    LoginRejected {
        /// The stream state reported by the gateway.
        stream: String,
        /// The data state reported by the gateway.
        data: String,
        /// The explanatory text reported by the gateway.
        text: String,
    },
    /// Error message sent by the gateway.
    #[error("Server error: {0}")]
    Server(String),
    /// Operation requires an authenticated session.
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// Session has raised its shutdown flag.
    #[error("Session is shutting down")]
    ShuttingDown,
    /// Operation is not valid in the current session state.
    #[error("Invalid state {state:?} for {operation}")]
    InvalidState {
        /// The state the session was in.
        state: ConnectionState,
        /// The rejected operation.
        operation: String,
    },
    /// Generic client error.
    #[error("Client error: {0}")]
    ClientError(String),
    /// WebSocket transport error from tungstenite.
    #[error("Tungstenite error: {0}")]
    TungsteniteError(String),
    /// Request timeout.
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<tungstenite::Error> for RefinitivWsError {
    fn from(error: tungstenite::Error) -> Self {
        Self::TungsteniteError(error.to_string())
    }
}

impl From<serde_json::Error> for RefinitivWsError {
    fn from(error: serde_json::Error) -> Self {
        Self::Codec(error.to_string())
    }
}

impl From<String> for RefinitivWsError {
    fn from(msg: String) -> Self {
        Self::ClientError(msg)
    }
}

/// Result type alias for Refinitiv WebSocket operations.
pub type RefinitivWsResult<T> = Result<T, RefinitivWsError>;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_refinitiv_ws_error_display() {
        let error = RefinitivWsError::Codec("expected value at line 1".to_string());
        assert_eq!(error.to_string(), "Codec error: expected value at line 1");

        let error = RefinitivWsError::LoginRejected {
            stream: "Closed".to_string(),
            data: "Suspect".to_string(),
            text: "User unknown to permission system".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Login rejected: stream=Closed, data=Suspect, text=User unknown to permission system"
        );

        let error = RefinitivWsError::InvalidState {
            state: ConnectionState::Authenticated,
            operation: "on_open".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid state Authenticated for on_open");
    }

    #[rstest]
    fn test_refinitiv_ws_error_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{\"Type\":")
            .expect_err("Should fail to parse");
        let ws_err = RefinitivWsError::from(json_err);

        assert!(matches!(ws_err, RefinitivWsError::Codec(_)));
    }

    #[rstest]
    fn test_refinitiv_ws_error_from_string() {
        let error = RefinitivWsError::from("Test client error".to_string());
        assert_eq!(error.to_string(), "Client error: Test client error");
    }
}
