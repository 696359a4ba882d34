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

//! Enumerations for the Refinitiv WebSocket JSON message model.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Refinitiv message types (the `Type` key).
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum RefinitivMessageType {
    /// Full image of a stream (login response or item snapshot).
    Refresh,
    /// Stream or data state change.
    Status,
    /// Incremental field changes.
    Update,
    /// Server keepalive.
    Ping,
    /// Client keepalive reply.
    Pong,
    /// Server-side error report.
    Error,
    /// Acknowledgment of a post.
    Ack,
    /// Contribution from the client.
    Post,
}

/// Refinitiv message domains (the `Domain` key).
///
/// Messages without a `Domain` key belong to [`RefinitivDomain::MarketPrice`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum RefinitivDomain {
    /// Login stream.
    Login,
    /// Level 1 market price data.
    #[default]
    MarketPrice,
    /// Any other domain.
    #[serde(other)]
    Other,
}

/// Stream states reported in a `State` object.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum RefinitivStreamState {
    /// Stream is open and will receive updates.
    Open,
    /// Stream delivers a single refresh only.
    NonStreaming,
    /// Stream is closed.
    Closed,
    /// Stream is closed but may be recovered.
    ClosedRecover,
    /// Stream is closed and redirected.
    Redirected,
    /// Unrecognized stream state.
    #[serde(other)]
    Unknown,
}

/// Data states reported in a `State` object.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum RefinitivDataState {
    /// Data is current.
    Ok,
    /// Data may be stale.
    Suspect,
    /// Data state unchanged from the previous message.
    NoChange,
    /// Unrecognized data state.
    #[serde(other)]
    Unknown,
}
