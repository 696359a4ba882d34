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

pub mod client;
pub mod codec;
pub mod error;
pub mod handler;
pub mod messages;
pub mod post;
pub mod session;
pub mod transport;

pub use client::RefinitivWebSocketClient;
pub use error::{RefinitivWsError, RefinitivWsResult};
pub use messages::{FieldValue, NautilusWsMessage, RefinitivAck, RefinitivState};
pub use post::{ContributionRequest, PostEnvelope};
pub use session::{ConnectionState, SessionStatus};
