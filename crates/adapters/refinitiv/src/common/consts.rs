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

//! Core constants for the Refinitiv adapter.

// Gateway defaults
pub const REFINITIV_DEFAULT_HOST: &str = "localhost";
pub const REFINITIV_DEFAULT_PORT: u16 = 15_000;
pub const REFINITIV_WS_PATH: &str = "/WebSocket";

/// WebSocket subprotocol for the Refinitiv JSON message model (version 2).
pub const REFINITIV_WS_SUBPROTOCOL: &str = "tr_json2";

/// User agent sent during the WebSocket handshake.
pub const REFINITIV_USER_AGENT: &str = concat!("NautilusTrader/", env!("CARGO_PKG_VERSION"));

/// Application ID used when none has been allocated by the market data team.
pub const REFINITIV_DEFAULT_APP_ID: &str = "256";

// Stream IDs
pub const LOGIN_STREAM_ID: i64 = 1;
/// Stream ID of the off-stream post envelope.
///
/// Every post goes out on stream 1 regardless of item, which limits a connection to one
/// contributed stream.
pub const POST_STREAM_ID: i64 = 1;
/// Stream ID of the content message nested in a post.
pub const POST_CONTENT_STREAM_ID: i64 = 0;

/// First post ID issued by a session.
pub const FIRST_POST_ID: u64 = 1;

// Timeouts
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const CLOSE_TIMEOUT_SECS: u64 = 5;
