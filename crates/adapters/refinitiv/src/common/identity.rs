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

//! Login identity for a Refinitiv gateway session.

use std::net::{IpAddr, Ipv4Addr};

/// Identity presented in the login request.
///
/// Built once per session and never mutated; the gateway authorizes posts against it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefinitivIdentity {
    /// DACS user name.
    pub user: String,
    /// Application ID allocated by the market data team.
    pub app_id: String,
    /// Network position of the client (typically its IP address).
    pub position: String,
}

impl RefinitivIdentity {
    /// Creates a new [`RefinitivIdentity`] instance.
    #[must_use]
    pub fn new(
        user: impl Into<String>,
        app_id: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            app_id: app_id.into(),
            position: position.into(),
        }
    }
}

/// Returns the position string for the local address of the gateway connection.
///
/// Falls back to the IPv4 loopback address when the address is unknown or unspecified.
#[must_use]
pub fn local_position(local_ip: Option<IpAddr>) -> String {
    match local_ip {
        Some(ip) if !ip.is_unspecified() => ip.to_string(),
        _ => Ipv4Addr::LOCALHOST.to_string(),
    }
}
