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

//! Data structures for Refinitiv WebSocket JSON messages.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{error::RefinitivWsError, post::PostEnvelope};
use crate::common::{
    consts::{LOGIN_STREAM_ID, POST_CONTENT_STREAM_ID, POST_STREAM_ID},
    enums::{RefinitivDataState, RefinitivDomain, RefinitivMessageType, RefinitivStreamState},
    identity::RefinitivIdentity,
};

/// Stream and data state carried by refresh and status messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefinitivState {
    /// Stream state.
    pub stream: RefinitivStreamState,
    /// Data state.
    pub data: RefinitivDataState,
    /// Optional state code (e.g. `NotEntitled`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Optional explanatory text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RefinitivState {
    /// Returns the `{Stream: Open, Data: Ok}` state.
    #[must_use]
    pub const fn open_ok() -> Self {
        Self {
            stream: RefinitivStreamState::Open,
            data: RefinitivDataState::Ok,
            code: None,
            text: None,
        }
    }

    /// Returns whether the stream is open with good data.
    #[must_use]
    pub fn is_open_ok(&self) -> bool {
        self.stream == RefinitivStreamState::Open && self.data == RefinitivDataState::Ok
    }
}

/// Login request key elements.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefinitivLoginElements {
    /// Application ID.
    pub application_id: String,
    /// Network position of the client.
    pub position: String,
}

/// Login request key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefinitivLoginKey {
    /// User name.
    pub name: String,
    /// Additional login elements.
    pub elements: RefinitivLoginElements,
}

/// Login request opening the login stream.
#[derive(Debug, Clone, Serialize)]
pub struct RefinitivLoginRequest {
    /// Login stream ID.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Always `Login`.
    #[serde(rename = "Domain")]
    pub domain: RefinitivDomain,
    /// User identification.
    #[serde(rename = "Key")]
    pub key: RefinitivLoginKey,
}

impl RefinitivLoginRequest {
    /// Creates a login request for the given identity.
    #[must_use]
    pub fn new(identity: &RefinitivIdentity) -> Self {
        Self {
            id: LOGIN_STREAM_ID,
            domain: RefinitivDomain::Login,
            key: RefinitivLoginKey {
                name: identity.user.clone(),
                elements: RefinitivLoginElements {
                    application_id: identity.app_id.clone(),
                    position: identity.position.clone(),
                },
            },
        }
    }
}

/// A contributed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Integer field.
    Int(i64),
    /// Real (price) field.
    Real(f64),
    /// Text field.
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Ordered field name to value mapping.
pub type FieldMap = IndexMap<String, FieldValue>;

/// Item key of a post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefinitivItemKey {
    /// Service the item is contributed to.
    pub service: String,
    /// Item name (RIC).
    pub name: String,
}

/// Content message nested inside a post.
#[derive(Debug, Clone, Serialize)]
pub struct RefinitivPostContent {
    /// Content stream ID.
    #[serde(rename = "ID")]
    pub id: i64,
    /// `Refresh` or `Update`.
    #[serde(rename = "Type")]
    pub msg_type: RefinitivMessageType,
    /// Contributed fields.
    #[serde(rename = "Fields")]
    pub fields: FieldMap,
    /// Present (false) on refreshes: the refresh is contribution-initiated.
    #[serde(rename = "Solicited", skip_serializing_if = "Option::is_none")]
    pub solicited: Option<bool>,
    /// Present (`Open`/`Ok`) on refreshes.
    #[serde(rename = "State", skip_serializing_if = "Option::is_none")]
    pub state: Option<RefinitivState>,
}

/// Off-stream post message.
#[derive(Debug, Clone, Serialize)]
pub struct RefinitivPostMessage {
    /// Post stream ID (constant).
    #[serde(rename = "ID")]
    pub id: i64,
    /// Always `Post`.
    #[serde(rename = "Type")]
    pub msg_type: RefinitivMessageType,
    /// Target item.
    #[serde(rename = "Key")]
    pub key: RefinitivItemKey,
    /// Whether the gateway should acknowledge the post.
    #[serde(rename = "Ack")]
    pub ack: bool,
    /// Session-assigned ID echoed back as `AckID`.
    #[serde(rename = "PostID")]
    pub post_id: u64,
    /// Contributed content.
    #[serde(rename = "Message")]
    pub message: RefinitivPostContent,
}

impl RefinitivPostMessage {
    /// Creates the wire message for a post envelope.
    #[must_use]
    pub fn new(envelope: &PostEnvelope) -> Self {
        let request = &envelope.request;
        let (msg_type, solicited, state) = if request.is_refresh {
            (
                RefinitivMessageType::Refresh,
                Some(false),
                Some(RefinitivState::open_ok()),
            )
        } else {
            (RefinitivMessageType::Update, None, None)
        };

        Self {
            id: POST_STREAM_ID,
            msg_type: RefinitivMessageType::Post,
            key: RefinitivItemKey {
                service: request.service.to_string(),
                name: request.item.to_string(),
            },
            ack: envelope.ack,
            post_id: envelope.post_id,
            message: RefinitivPostContent {
                id: POST_CONTENT_STREAM_ID,
                msg_type,
                fields: request.fields.clone(),
                solicited,
                state,
            },
        }
    }
}

/// Message carrying only a `Type` key (`Pong`).
#[derive(Debug, Clone, Serialize)]
pub struct RefinitivTypeOnly {
    /// Message type.
    #[serde(rename = "Type")]
    pub msg_type: RefinitivMessageType,
}

/// Outbound Refinitiv requests.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RefinitivWsRequest {
    /// Login request.
    Login(RefinitivLoginRequest),
    /// Post message.
    Post(Box<RefinitivPostMessage>),
    /// Pong reply.
    Pong(RefinitivTypeOnly),
}

impl RefinitivWsRequest {
    /// Returns the pong reply.
    #[must_use]
    pub const fn pong() -> Self {
        Self::Pong(RefinitivTypeOnly {
            msg_type: RefinitivMessageType::Pong,
        })
    }
}

/// Acknowledgment of a post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefinitivAck {
    /// Stream ID the post was sent on.
    #[serde(rename = "ID", default)]
    pub id: Option<i64>,
    /// Echo of the post's `PostID`.
    #[serde(rename = "AckID")]
    pub ack_id: u64,
    /// Negative acknowledgment code, when the post was refused.
    #[serde(rename = "NakCode", default)]
    pub nak_code: Option<String>,
    /// Explanatory text.
    #[serde(rename = "Text", default)]
    pub text: Option<String>,
}

impl RefinitivAck {
    /// Returns whether this is a negative acknowledgment.
    #[must_use]
    pub fn is_nak(&self) -> bool {
        self.nak_code.is_some()
    }
}

/// Fields common to every inbound message, used for classification.
#[derive(Debug, Clone, Deserialize)]
pub struct RefinitivMessageHeader {
    /// Message type.
    #[serde(rename = "Type")]
    pub msg_type: String,
    /// Domain; absent means `MarketPrice`.
    #[serde(rename = "Domain", default)]
    pub domain: Option<RefinitivDomain>,
}

/// Inbound message records decoded from a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RefinitivWsMessage {
    /// Refresh on the login stream: login accepted.
    LoginRefresh {
        /// Reported login stream state.
        state: Option<RefinitivState>,
    },
    /// Status on the login stream.
    LoginStatus {
        /// Reported login stream state; `None` when absent or unreadable.
        state: Option<RefinitivState>,
    },
    /// Server keepalive.
    Ping,
    /// Server error report.
    Error {
        /// Error text.
        text: String,
        /// Optional debug details.
        debug: Option<serde_json::Value>,
    },
    /// Post acknowledgment.
    Ack(RefinitivAck),
    /// Anything else.
    Other(serde_json::Value),
}

/// Normalized Nautilus domain message emitted on the client stream.
#[derive(Debug, Clone)]
pub enum NautilusWsMessage {
    /// Login accepted.
    Authenticated,
    /// Login refused; the session is shutting down.
    LoginRejected(Option<RefinitivState>),
    /// Post acknowledged (or refused with a NAK code).
    Ack(RefinitivAck),
    /// Error from the gateway or the connection.
    Error(RefinitivWsError),
    /// Unhandled/raw message for debugging.
    Raw(serde_json::Value),
    /// Connection closed.
    Closed,
}
