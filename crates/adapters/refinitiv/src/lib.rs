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

//! [NautilusTrader](http://nautilustrader.io) adapter for contributing market price data to a
//! Refinitiv Real-Time gateway (ADS) over the WebSocket API.
//!
//! The `nautilus-refinitiv` crate covers the login, steady-state and post lifecycle of a single
//! WebSocket connection contributing a single item:
//!
//! - **Codec**: JSON (`tr_json2`) encoding of login, post and pong messages, and decoding of
//!   packed inbound frames into discrete message records.
//! - **Session**: a pure state machine deciding what to send on open, classifying inbound records
//!   and raising the shutdown flag on login rejection or server errors.
//! - **Post correlation**: monotonically increasing post IDs used to match acknowledgments.
//! - **Client**: the orchestrator exposing `send_post`, login/shutdown waiting and an event stream,
//!   backed by a handler task which exclusively owns the socket writer.
//!
//! # Platform
//!
//! [NautilusTrader](http://nautilustrader.io) is an open-source, high-performance, production-grade
//! algorithmic trading platform, providing quantitative traders with the ability to backtest
//! portfolios of automated trading strategies on historical data with an event-driven engine,
//! and also deploy those same strategies live, with no code changes.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod common;
pub mod config;
pub mod websocket;
