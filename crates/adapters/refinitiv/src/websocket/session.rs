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

//! Session state machine for a Refinitiv contributor connection.
//!
//! The session never touches the socket. It consumes transport notifications and decoded message
//! records, updates the published [`SessionStatus`] and returns the [`SessionAction`]s the caller
//! must perform, in order. Protocol failures raise the shutdown flag; tearing down the transport
//! is left to the caller.

use strum::Display;
use tokio::sync::watch;

use super::{
    error::{RefinitivWsError, RefinitivWsResult},
    messages::{
        NautilusWsMessage, RefinitivLoginRequest, RefinitivState, RefinitivWsMessage,
        RefinitivWsRequest,
    },
};
use crate::common::identity::RefinitivIdentity;

/// Lifecycle state of a contributor connection.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Transport handshake in progress.
    #[default]
    Connecting,
    /// Transport open, login not yet sent.
    Open,
    /// Login sent, awaiting the login refresh.
    AwaitingLogin,
    /// Login accepted, posts may be sent.
    Authenticated,
    /// Shutdown raised, transport still open.
    Closing,
    /// Transport closed.
    Closed,
}

/// Snapshot of the session published to readers.
#[derive(Clone, Debug, Default)]
pub struct SessionStatus {
    /// Current connection state.
    pub state: ConnectionState,
    /// Set once by the login refresh.
    pub authenticated: bool,
    /// Raised on login rejection, server error or transport loss. Never lowered.
    pub shutdown: bool,
    /// Cause of the first shutdown, if any.
    pub reason: Option<RefinitivWsError>,
}

impl SessionStatus {
    /// Returns whether the transport is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Open
                | ConnectionState::AwaitingLogin
                | ConnectionState::Authenticated
                | ConnectionState::Closing
        )
    }

    /// Returns whether posts may be sent.
    #[must_use]
    pub fn can_post(&self) -> bool {
        self.authenticated && !self.shutdown && self.state == ConnectionState::Authenticated
    }
}

/// Work the caller must perform after a session transition.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Encode and send a request on the transport.
    Send(RefinitivWsRequest),
    /// Emit a message on the client output stream.
    Notify(NautilusWsMessage),
}

/// Refinitiv contributor session state machine.
#[derive(Debug)]
pub struct RefinitivSession {
    identity: RefinitivIdentity,
    status_tx: watch::Sender<SessionStatus>,
}

impl RefinitivSession {
    /// Creates a new [`RefinitivSession`] instance in the `Connecting` state.
    #[must_use]
    pub fn new(identity: RefinitivIdentity) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::default());
        Self {
            identity,
            status_tx,
        }
    }

    /// Returns a receiver of status updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Returns a snapshot of the current status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status_tx.borrow().clone()
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.status_tx.borrow().state
    }

    /// Handles the transport opening: emits the login request.
    ///
    /// # Errors
    ///
    /// Returns [`RefinitivWsError::InvalidState`] if the session is not `Connecting`.
    pub fn on_open(&mut self) -> RefinitivWsResult<Vec<SessionAction>> {
        let state = self.state();
        if state != ConnectionState::Connecting {
            return Err(RefinitivWsError::InvalidState {
                state,
                operation: "on_open".to_string(),
            });
        }

        self.set_state(ConnectionState::Open);
        tracing::info!(
            "Connection opened, logging in as {} (app_id={}, position={})",
            self.identity.user,
            self.identity.app_id,
            self.identity.position,
        );

        let login = RefinitivWsRequest::Login(RefinitivLoginRequest::new(&self.identity));
        self.set_state(ConnectionState::AwaitingLogin);

        Ok(vec![SessionAction::Send(login)])
    }

    /// Handles one decoded message record.
    pub fn on_message(&mut self, record: RefinitivWsMessage) -> Vec<SessionAction> {
        match self.state() {
            ConnectionState::Closed => {
                tracing::debug!("Session closed, ignoring {record:?}");
                return Vec::new();
            }
            ConnectionState::Connecting | ConnectionState::Open => {
                if matches!(record, RefinitivWsMessage::Ping) {
                    return vec![SessionAction::Send(RefinitivWsRequest::pong())];
                }
                tracing::debug!("Login not yet sent, ignoring {record:?}");
                return Vec::new();
            }
            ConnectionState::AwaitingLogin
            | ConnectionState::Authenticated
            | ConnectionState::Closing => {}
        }

        match record {
            RefinitivWsMessage::LoginRefresh { state } => self.handle_login_refresh(state),
            RefinitivWsMessage::LoginStatus { state } => self.handle_login_status(state),
            RefinitivWsMessage::Ping => vec![SessionAction::Send(RefinitivWsRequest::pong())],
            RefinitivWsMessage::Error { text, debug } => {
                match debug {
                    Some(details) => tracing::error!("Gateway error: {text} (debug={details})"),
                    None => tracing::error!("Gateway error: {text}"),
                }
                let error = RefinitivWsError::Server(text);
                self.raise_shutdown(error.clone());
                vec![SessionAction::Notify(NautilusWsMessage::Error(error))]
            }
            RefinitivWsMessage::Ack(ack) => {
                vec![SessionAction::Notify(NautilusWsMessage::Ack(ack))]
            }
            RefinitivWsMessage::Other(value) => {
                tracing::debug!("Unhandled message: {value}");
                vec![SessionAction::Notify(NautilusWsMessage::Raw(value))]
            }
        }
    }

    /// Handles a transport failure: the session is closed for good.
    pub fn on_transport_error(&mut self, error: &str) -> Vec<SessionAction> {
        if self.state() == ConnectionState::Closed {
            return Vec::new();
        }

        tracing::error!("Transport error: {error}");
        let error = RefinitivWsError::Transport(error.to_string());
        self.close_with(Some(error.clone()));

        vec![
            SessionAction::Notify(NautilusWsMessage::Error(error)),
            SessionAction::Notify(NautilusWsMessage::Closed),
        ]
    }

    /// Handles the transport closing.
    pub fn on_transport_closed(&mut self) -> Vec<SessionAction> {
        if self.state() == ConnectionState::Closed {
            return Vec::new();
        }

        tracing::info!("Connection closed");
        self.close_with(None);

        vec![SessionAction::Notify(NautilusWsMessage::Closed)]
    }

    fn handle_login_refresh(&mut self, state: Option<RefinitivState>) -> Vec<SessionAction> {
        if self.status_tx.borrow().shutdown {
            tracing::warn!("Ignoring login refresh after shutdown: {state:?}");
            return Vec::new();
        }

        match state.as_ref().and_then(|s| s.text.as_deref()) {
            Some(text) => tracing::info!("Login accepted: {text}"),
            None => tracing::info!("Login accepted"),
        }

        self.status_tx.send_modify(|status| {
            status.authenticated = true;
            status.state = ConnectionState::Authenticated;
        });

        vec![SessionAction::Notify(NautilusWsMessage::Authenticated)]
    }

    fn handle_login_status(&mut self, state: Option<RefinitivState>) -> Vec<SessionAction> {
        if let Some(state) = state.as_ref().filter(|s| s.is_open_ok()) {
            tracing::debug!("Login status: {state:?}");
            return Vec::new();
        }

        let error = login_rejection(state.as_ref());
        tracing::error!("{error}");
        self.raise_shutdown(error);

        vec![SessionAction::Notify(NautilusWsMessage::LoginRejected(
            state,
        ))]
    }

    fn raise_shutdown(&self, error: RefinitivWsError) {
        self.status_tx.send_modify(|status| {
            status.shutdown = true;
            if status.state != ConnectionState::Closed {
                status.state = ConnectionState::Closing;
            }
            if status.reason.is_none() {
                status.reason = Some(error);
            }
        });
    }

    fn close_with(&self, error: Option<RefinitivWsError>) {
        self.status_tx.send_modify(|status| {
            status.state = ConnectionState::Closed;
            status.shutdown = true;
            if status.reason.is_none() {
                status.reason = error;
            }
        });
    }

    fn set_state(&self, state: ConnectionState) {
        self.status_tx.send_modify(|status| status.state = state);
    }
}

fn login_rejection(state: Option<&RefinitivState>) -> RefinitivWsError {
    match state {
        Some(state) => RefinitivWsError::LoginRejected {
            stream: state.stream.to_string(),
            data: state.data.to_string(),
            text: state.text.clone().unwrap_or_default(),
        },
        None => RefinitivWsError::LoginRejected {
            stream: "Unknown".to_string(),
            data: "Unknown".to_string(),
            text: "Login status without state".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::{
        common::enums::{RefinitivDataState, RefinitivStreamState},
        websocket::messages::RefinitivAck,
    };

    #[fixture]
    fn session() -> RefinitivSession {
        RefinitivSession::new(RefinitivIdentity::new("jane.doe", "256", "10.0.0.7"))
    }

    #[fixture]
    fn awaiting_login(session: RefinitivSession) -> RefinitivSession {
        let mut session = session;
        session.on_open().unwrap();
        session
    }

    fn login_refresh() -> RefinitivWsMessage {
        RefinitivWsMessage::LoginRefresh {
            state: Some(RefinitivState::open_ok()),
        }
    }

    fn login_status(stream: RefinitivStreamState, data: RefinitivDataState) -> RefinitivWsMessage {
        RefinitivWsMessage::LoginStatus {
            state: Some(RefinitivState {
                stream,
                data,
                code: None,
                text: Some("status".to_string()),
            }),
        }
    }

    fn server_error() -> RefinitivWsMessage {
        RefinitivWsMessage::Error {
            text: "boom".to_string(),
            debug: None,
        }
    }

    fn is_pong(action: &SessionAction) -> bool {
        matches!(action, SessionAction::Send(RefinitivWsRequest::Pong(_)))
    }

    #[rstest]
    fn test_on_open_sends_login(mut session: RefinitivSession) {
        let actions = session.on_open().unwrap();

        assert_eq!(actions.len(), 1);
        match &actions[0] {
            SessionAction::Send(RefinitivWsRequest::Login(login)) => {
                assert_eq!(login.id, 1);
                assert_eq!(login.key.name, "jane.doe");
                assert_eq!(login.key.elements.application_id, "256");
                assert_eq!(login.key.elements.position, "10.0.0.7");
            }
            other => panic!("Expected login request, was {other:?}"),
        }
        assert_eq!(session.state(), ConnectionState::AwaitingLogin);
        assert!(session.status().is_active());
    }

    #[rstest]
    fn test_on_open_twice_is_invalid(mut awaiting_login: RefinitivSession) {
        let result = awaiting_login.on_open();

        assert!(matches!(
            result,
            Err(RefinitivWsError::InvalidState {
                state: ConnectionState::AwaitingLogin,
                ..
            })
        ));
    }

    #[rstest]
    fn test_login_refresh_authenticates(mut awaiting_login: RefinitivSession) {
        let actions = awaiting_login.on_message(login_refresh());

        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Notify(NautilusWsMessage::Authenticated)]
        ));
        let status = awaiting_login.status();
        assert!(status.authenticated);
        assert!(!status.shutdown);
        assert!(status.can_post());
        assert_eq!(status.state, ConnectionState::Authenticated);
    }

    #[rstest]
    fn test_ping_then_login_refresh_in_order(mut awaiting_login: RefinitivSession) {
        let mut actions = awaiting_login.on_message(RefinitivWsMessage::Ping);
        actions.extend(awaiting_login.on_message(login_refresh()));

        assert_eq!(actions.len(), 2);
        assert!(is_pong(&actions[0]));
        assert!(matches!(
            actions[1],
            SessionAction::Notify(NautilusWsMessage::Authenticated)
        ));
        assert!(awaiting_login.status().authenticated);
    }

    #[rstest]
    fn test_one_pong_per_ping(mut awaiting_login: RefinitivSession) {
        let records = [
            RefinitivWsMessage::Ping,
            login_refresh(),
            RefinitivWsMessage::Ping,
            RefinitivWsMessage::Ping,
        ];

        let pongs = records
            .into_iter()
            .flat_map(|record| awaiting_login.on_message(record))
            .filter(is_pong)
            .count();

        assert_eq!(pongs, 3);
    }

    #[rstest]
    #[case(RefinitivStreamState::Closed, RefinitivDataState::Suspect)]
    #[case(RefinitivStreamState::ClosedRecover, RefinitivDataState::Suspect)]
    #[case(RefinitivStreamState::Open, RefinitivDataState::Suspect)]
    fn test_login_status_rejects(
        mut awaiting_login: RefinitivSession,
        #[case] stream: RefinitivStreamState,
        #[case] data: RefinitivDataState,
    ) {
        let actions = awaiting_login.on_message(login_status(stream, data));

        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Notify(NautilusWsMessage::LoginRejected(Some(_)))]
        ));
        let status = awaiting_login.status();
        assert!(status.shutdown);
        assert!(!status.authenticated);
        assert_eq!(status.state, ConnectionState::Closing);
        assert!(matches!(
            status.reason,
            Some(RefinitivWsError::LoginRejected { .. })
        ));
    }

    #[rstest]
    fn test_login_status_without_state_rejects(mut awaiting_login: RefinitivSession) {
        let actions = awaiting_login.on_message(RefinitivWsMessage::LoginStatus { state: None });

        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Notify(NautilusWsMessage::LoginRejected(None))]
        ));
        assert!(awaiting_login.status().shutdown);
    }

    #[rstest]
    fn test_login_status_open_ok_is_informational(mut awaiting_login: RefinitivSession) {
        let actions = awaiting_login.on_message(login_status(
            RefinitivStreamState::Open,
            RefinitivDataState::Ok,
        ));

        assert!(actions.is_empty());
        let status = awaiting_login.status();
        assert!(!status.shutdown);
        assert_eq!(status.state, ConnectionState::AwaitingLogin);
    }

    #[rstest]
    fn test_error_raises_shutdown(mut awaiting_login: RefinitivSession) {
        awaiting_login.on_message(login_refresh());

        let actions = awaiting_login.on_message(server_error());

        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Notify(NautilusWsMessage::Error(RefinitivWsError::Server(_)))]
        ));
        let status = awaiting_login.status();
        assert!(status.shutdown);
        assert!(status.authenticated);
        assert!(!status.can_post());
        assert_eq!(status.state, ConnectionState::Closing);
    }

    #[rstest]
    fn test_error_with_debug_details_raises_shutdown(mut awaiting_login: RefinitivSession) {
        let error = RefinitivWsMessage::Error {
            text: "JSON parsing failed".to_string(),
            debug: Some(serde_json::json!({"File": "Parser.C", "Line": 42, "Offset": 12})),
        };

        let actions = awaiting_login.on_message(error);

        match actions.as_slice() {
            [SessionAction::Notify(NautilusWsMessage::Error(RefinitivWsError::Server(text)))] => {
                assert_eq!(text, "JSON parsing failed");
            }
            other => panic!("Expected server error, was {other:?}"),
        }
        assert!(awaiting_login.status().shutdown);
    }

    #[rstest]
    #[case::refresh_first(vec![login_refresh(), server_error()], true)]
    #[case::error_first(vec![server_error(), login_refresh()], false)]
    #[case::rejected_first(
        vec![login_status(RefinitivStreamState::Closed, RefinitivDataState::Suspect), login_refresh()],
        false
    )]
    #[case::ping_then_refresh(vec![RefinitivWsMessage::Ping, login_refresh()], true)]
    fn test_authenticated_iff_refresh_precedes_rejection(
        mut awaiting_login: RefinitivSession,
        #[case] records: Vec<RefinitivWsMessage>,
        #[case] expected: bool,
    ) {
        for record in records {
            awaiting_login.on_message(record);
        }

        assert_eq!(awaiting_login.status().authenticated, expected);
    }

    #[rstest]
    fn test_pings_answered_while_closing(mut awaiting_login: RefinitivSession) {
        awaiting_login.on_message(server_error());

        let actions = awaiting_login.on_message(RefinitivWsMessage::Ping);

        assert!(matches!(actions.as_slice(), [action] if is_pong(action)));
    }

    #[rstest]
    fn test_ack_is_forwarded(mut awaiting_login: RefinitivSession) {
        awaiting_login.on_message(login_refresh());
        let ack = RefinitivAck {
            id: Some(1),
            ack_id: 1,
            nak_code: None,
            text: None,
        };

        let actions = awaiting_login.on_message(RefinitivWsMessage::Ack(ack));

        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Notify(NautilusWsMessage::Ack(a))] if a.ack_id == 1
        ));
        assert_eq!(awaiting_login.state(), ConnectionState::Authenticated);
    }

    #[rstest]
    fn test_other_leaves_state_unchanged(mut awaiting_login: RefinitivSession) {
        let actions = awaiting_login.on_message(RefinitivWsMessage::Other(
            serde_json::json!({"Type": "Update", "ID": 5}),
        ));

        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Notify(NautilusWsMessage::Raw(_))]
        ));
        let status = awaiting_login.status();
        assert_eq!(status.state, ConnectionState::AwaitingLogin);
        assert!(!status.shutdown);
    }

    #[rstest]
    fn test_before_login_only_ping_is_answered(mut session: RefinitivSession) {
        assert!(is_pong(&session.on_message(RefinitivWsMessage::Ping)[0]));
        assert!(session.on_message(login_refresh()).is_empty());
        assert!(session.on_message(server_error()).is_empty());

        let status = session.status();
        assert!(!status.authenticated);
        assert!(!status.shutdown);
        assert_eq!(status.state, ConnectionState::Connecting);
    }

    #[rstest]
    fn test_transport_error_closes(mut awaiting_login: RefinitivSession) {
        let actions = awaiting_login.on_transport_error("connection reset");

        assert!(matches!(
            actions.as_slice(),
            [
                SessionAction::Notify(NautilusWsMessage::Error(RefinitivWsError::Transport(_))),
                SessionAction::Notify(NautilusWsMessage::Closed),
            ]
        ));
        let status = awaiting_login.status();
        assert_eq!(status.state, ConnectionState::Closed);
        assert!(status.shutdown);
        assert!(!status.is_active());

        assert!(awaiting_login.on_transport_closed().is_empty());
    }

    #[rstest]
    fn test_closed_ignores_everything(mut awaiting_login: RefinitivSession) {
        awaiting_login.on_transport_closed();

        assert!(awaiting_login.on_message(RefinitivWsMessage::Ping).is_empty());
        assert!(awaiting_login.on_message(login_refresh()).is_empty());
        assert!(!awaiting_login.status().authenticated);
        assert_eq!(awaiting_login.state(), ConnectionState::Closed);
    }

    #[rstest]
    fn test_subscribers_observe_transitions(mut awaiting_login: RefinitivSession) {
        let rx = awaiting_login.subscribe();
        assert_eq!(rx.borrow().state, ConnectionState::AwaitingLogin);

        awaiting_login.on_message(login_refresh());

        assert!(rx.borrow().authenticated);
        assert_eq!(rx.borrow().state, ConnectionState::Authenticated);
    }
}
