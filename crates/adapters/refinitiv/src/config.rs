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

//! Configuration structures for the Refinitiv adapter.

use std::net::IpAddr;

use crate::common::{
    consts::{
        DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LOGIN_TIMEOUT_SECS, REFINITIV_DEFAULT_APP_ID,
        REFINITIV_DEFAULT_HOST, REFINITIV_DEFAULT_PORT, REFINITIV_WS_PATH,
    },
    identity::{RefinitivIdentity, local_position},
};

/// Configuration for the Refinitiv contributor WebSocket client.
#[derive(Clone, Debug)]
pub struct RefinitivContributorConfig {
    /// Gateway host name.
    pub host: String,
    /// Gateway WebSocket port.
    pub port: u16,
    /// Optional override for the full WebSocket URL (ignores `host` and `port`).
    pub base_url_ws: Option<String>,
    /// DACS user name presented at login.
    pub user: String,
    /// Application ID presented at login.
    pub app_id: String,
    /// Optional network position; taken from the local address of the connection when `None`.
    pub position: Option<String>,
    /// Optional timeout (seconds) for the login handshake.
    pub login_timeout_secs: Option<u64>,
    /// Optional timeout (seconds) for the WebSocket handshake.
    pub connect_timeout_secs: Option<u64>,
    /// Request an acknowledgment for every post (default: true).
    pub request_ack: bool,
}

impl Default for RefinitivContributorConfig {
    fn default() -> Self {
        Self {
            host: REFINITIV_DEFAULT_HOST.to_string(),
            port: REFINITIV_DEFAULT_PORT,
            base_url_ws: None,
            user: "user".to_string(),
            app_id: REFINITIV_DEFAULT_APP_ID.to_string(),
            position: None,
            login_timeout_secs: Some(DEFAULT_LOGIN_TIMEOUT_SECS),
            connect_timeout_secs: Some(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_ack: true,
        }
    }
}

impl RefinitivContributorConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for the given gateway and user, all else default.
    #[must_use]
    pub fn for_gateway(host: impl Into<String>, port: u16, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            ..Self::default()
        }
    }

    /// Returns the WebSocket URL, considering overrides.
    #[must_use]
    pub fn ws_url(&self) -> String {
        self.base_url_ws
            .clone()
            .unwrap_or_else(|| format!("ws://{}:{}{REFINITIV_WS_PATH}", self.host, self.port))
    }

    /// Returns the login identity, using `local_ip` as the position when none is configured.
    #[must_use]
    pub fn identity(&self, local_ip: Option<IpAddr>) -> RefinitivIdentity {
        let position = self
            .position
            .clone()
            .unwrap_or_else(|| local_position(local_ip));
        RefinitivIdentity::new(self.user.clone(), self.app_id.clone(), position)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_default_ws_url() {
        let config = RefinitivContributorConfig::for_gateway("myADS", 15000, "jane.doe");
        assert_eq!(config.ws_url(), "ws://myADS:15000/WebSocket");
    }

    #[rstest]
    fn test_ws_url_override() {
        let config = RefinitivContributorConfig {
            base_url_ws: Some("ws://127.0.0.1:9000/WebSocket".to_string()),
            ..RefinitivContributorConfig::default()
        };
        assert_eq!(config.ws_url(), "ws://127.0.0.1:9000/WebSocket");
    }

    #[rstest]
    fn test_identity_prefers_configured_position() {
        let config = RefinitivContributorConfig {
            position: Some("10.0.0.7".to_string()),
            app_id: "180".to_string(),
            ..RefinitivContributorConfig::for_gateway("myADS", 15000, "jane.doe")
        };

        let identity = config.identity(Some(IpAddr::from([192, 168, 1, 20])));

        assert_eq!(identity, RefinitivIdentity::new("jane.doe", "180", "10.0.0.7"));
    }

    #[rstest]
    fn test_identity_uses_local_address_without_configured_position() {
        let config = RefinitivContributorConfig::for_gateway("myADS", 15000, "jane.doe");

        let identity = config.identity(Some(IpAddr::from([192, 168, 1, 20])));

        assert_eq!(identity, RefinitivIdentity::new("jane.doe", "256", "192.168.1.20"));
    }
}
