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

//! JSON encoding and decoding of Refinitiv WebSocket messages.
//!
//! The gateway packs several messages into one text frame as a JSON array. Decoding unpacks the
//! frame and classifies each element into a [`RefinitivWsMessage`], preserving order.

use std::str::FromStr;

use serde_json::Value;

use super::{
    error::{RefinitivWsError, RefinitivWsResult},
    messages::{
        RefinitivAck, RefinitivLoginRequest, RefinitivMessageHeader, RefinitivPostMessage,
        RefinitivState, RefinitivWsMessage, RefinitivWsRequest,
    },
    post::PostEnvelope,
};
use crate::common::{
    enums::{RefinitivDomain, RefinitivMessageType},
    identity::RefinitivIdentity,
};

/// Encodes any outbound request.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_request(request: &RefinitivWsRequest) -> RefinitivWsResult<String> {
    Ok(serde_json::to_string(request)?)
}

/// Encodes the login request for `identity`.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_login(identity: &RefinitivIdentity) -> RefinitivWsResult<String> {
    encode_request(&RefinitivWsRequest::Login(RefinitivLoginRequest::new(
        identity,
    )))
}

/// Encodes a post envelope.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_post(envelope: &PostEnvelope) -> RefinitivWsResult<String> {
    encode_request(&RefinitivWsRequest::Post(Box::new(
        RefinitivPostMessage::new(envelope),
    )))
}

/// Encodes the pong reply.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_pong() -> RefinitivWsResult<String> {
    encode_request(&RefinitivWsRequest::pong())
}

/// Decodes a text frame into message records, in frame order.
///
/// Elements which cannot be classified are dropped with a warning; their siblings are still
/// returned.
///
/// # Errors
///
/// Returns [`RefinitivWsError::Codec`] if the frame is not valid JSON, or is neither an array
/// nor an object.
pub fn decode_frame(text: &str) -> RefinitivWsResult<Vec<RefinitivWsMessage>> {
    let value: Value = serde_json::from_str(text)?;

    let elements = match value {
        Value::Array(elements) => elements,
        Value::Object(_) => vec![value],
        other => {
            return Err(RefinitivWsError::Codec(format!(
                "Expected JSON array or object, received: {other}"
            )));
        }
    };

    Ok(elements.into_iter().filter_map(classify_message).collect())
}

/// Classifies a single JSON message, returning `None` when it has no usable `Type`.
#[must_use]
pub fn classify_message(value: Value) -> Option<RefinitivWsMessage> {
    if !value.is_object() {
        tracing::warn!("Dropping non-object message element: {value}");
        return None;
    }

    let header: RefinitivMessageHeader = match serde_json::from_value(value.clone()) {
        Ok(header) => header,
        Err(e) => {
            tracing::warn!("Dropping unclassifiable message element: {e}, value={value}");
            return None;
        }
    };

    let domain = header.domain.unwrap_or_default();
    let msg_type = RefinitivMessageType::from_str(&header.msg_type).ok();

    let record = match (msg_type, domain) {
        (Some(RefinitivMessageType::Refresh), RefinitivDomain::Login) => {
            RefinitivWsMessage::LoginRefresh {
                state: parse_state(&value),
            }
        }
        (Some(RefinitivMessageType::Status), RefinitivDomain::Login) => {
            RefinitivWsMessage::LoginStatus {
                state: parse_state(&value),
            }
        }
        (Some(RefinitivMessageType::Ping), _) => RefinitivWsMessage::Ping,
        (Some(RefinitivMessageType::Error), _) => RefinitivWsMessage::Error {
            text: value
                .get("Text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            debug: value.get("Debug").cloned(),
        },
        (Some(RefinitivMessageType::Ack), _) => {
            match serde_json::from_value::<RefinitivAck>(value.clone()) {
                Ok(ack) => RefinitivWsMessage::Ack(ack),
                Err(e) => {
                    tracing::warn!("Unreadable ack passed through as raw: {e}");
                    RefinitivWsMessage::Other(value)
                }
            }
        }
        _ => RefinitivWsMessage::Other(value),
    };

    Some(record)
}

fn parse_state(value: &Value) -> Option<RefinitivState> {
    let state = value.get("State")?;
    match serde_json::from_value(state.clone()) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!("Unreadable state {state}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::{
        common::enums::{RefinitivDataState, RefinitivStreamState},
        websocket::post::ContributionRequest,
    };

    fn to_value(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    fn refresh_request() -> ContributionRequest {
        ContributionRequest::refresh("NIPROV", "UMER.TST")
            .with_field("BID", 22.1)
            .with_field("ASK", 24.5)
            .with_field("TRDPRC_1", 23.3)
            .with_field("GEN_TEXT16", "some text")
    }

    #[rstest]
    fn test_encode_login() {
        let identity = RefinitivIdentity::new("jane.doe", "256", "10.0.0.7");

        let value = to_value(&encode_login(&identity).unwrap());

        assert_eq!(
            value,
            json!({
                "ID": 1,
                "Domain": "Login",
                "Key": {
                    "Name": "jane.doe",
                    "Elements": {"ApplicationId": "256", "Position": "10.0.0.7"}
                }
            })
        );
    }

    #[rstest]
    fn test_encode_pong() {
        assert_eq!(encode_pong().unwrap(), r#"{"Type":"Pong"}"#);
    }

    #[rstest]
    fn test_encode_refresh_post() {
        let envelope = PostEnvelope::new(1, true, refresh_request());

        let value = to_value(&encode_post(&envelope).unwrap());

        assert_eq!(
            value,
            json!({
                "ID": 1,
                "Type": "Post",
                "Key": {"Service": "NIPROV", "Name": "UMER.TST"},
                "Ack": true,
                "PostID": 1,
                "Message": {
                    "ID": 0,
                    "Type": "Refresh",
                    "Fields": {
                        "BID": 22.1,
                        "ASK": 24.5,
                        "TRDPRC_1": 23.3,
                        "GEN_TEXT16": "some text"
                    },
                    "Solicited": false,
                    "State": {"Stream": "Open", "Data": "Ok"}
                }
            })
        );
    }

    #[rstest]
    fn test_encode_update_post_has_no_refresh_keys() {
        let request = ContributionRequest::update("NIPROV", "UMER.TST")
            .with_field("BID", 22.5)
            .with_field("ASK", 24.9);
        let envelope = PostEnvelope::new(2, true, request);

        let value = to_value(&encode_post(&envelope).unwrap());

        assert_eq!(value["PostID"], 2);
        assert_eq!(value["Message"]["Type"], "Update");
        let message = value["Message"].as_object().unwrap();
        assert!(!message.contains_key("Solicited"));
        assert!(!message.contains_key("State"));
    }

    #[rstest]
    fn test_encode_post_preserves_field_order() {
        let envelope = PostEnvelope::new(7, false, refresh_request());

        let encoded = encode_post(&envelope).unwrap();

        let bid = encoded.find("\"BID\"").unwrap();
        let ask = encoded.find("\"ASK\"").unwrap();
        let trd = encoded.find("\"TRDPRC_1\"").unwrap();
        let text = encoded.find("\"GEN_TEXT16\"").unwrap();
        assert!(bid < ask && ask < trd && trd < text);
        assert!(encoded.contains("\"Ack\":false"));
    }

    #[rstest]
    fn test_decode_login_refresh() {
        let frame = r#"[{"ID":1,"Type":"Refresh","Domain":"Login","Key":{"Name":"user"},
            "State":{"Stream":"Open","Data":"Ok","Text":"Login accepted by host."}}]"#;

        let records = decode_frame(frame).unwrap();

        assert_eq!(records.len(), 1);
        match &records[0] {
            RefinitivWsMessage::LoginRefresh { state: Some(state) } => {
                assert!(state.is_open_ok());
                assert_eq!(state.text.as_deref(), Some("Login accepted by host."));
            }
            other => panic!("Expected LoginRefresh, was {other:?}"),
        }
    }

    #[rstest]
    fn test_decode_login_status_closed() {
        let frame = r#"[{"ID":1,"Type":"Status","Domain":"Login",
            "State":{"Stream":"Closed","Data":"Suspect","Code":"NotEntitled","Text":"denied"}}]"#;

        let records = decode_frame(frame).unwrap();

        match &records[0] {
            RefinitivWsMessage::LoginStatus { state: Some(state) } => {
                assert_eq!(state.stream, RefinitivStreamState::Closed);
                assert_eq!(state.data, RefinitivDataState::Suspect);
                assert_eq!(state.code.as_deref(), Some("NotEntitled"));
            }
            other => panic!("Expected LoginStatus, was {other:?}"),
        }
    }

    #[rstest]
    fn test_decode_login_status_without_state() {
        let records = decode_frame(r#"{"ID":1,"Type":"Status","Domain":"Login"}"#).unwrap();

        assert_eq!(records, vec![RefinitivWsMessage::LoginStatus { state: None }]);
    }

    #[rstest]
    fn test_decode_preserves_batched_order() {
        let frame = r#"[{"Type":"Ping"},
            {"ID":1,"Type":"Refresh","Domain":"Login","State":{"Stream":"Open","Data":"Ok"}},
            {"Type":"Ack","ID":1,"AckID":3}]"#;

        let records = decode_frame(frame).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], RefinitivWsMessage::Ping);
        assert!(matches!(records[1], RefinitivWsMessage::LoginRefresh { .. }));
        assert!(matches!(
            &records[2],
            RefinitivWsMessage::Ack(ack) if ack.ack_id == 3 && !ack.is_nak()
        ));
    }

    #[rstest]
    fn test_decode_single_object_frame() {
        assert_eq!(
            decode_frame(r#"{"Type":"Ping"}"#).unwrap(),
            vec![RefinitivWsMessage::Ping]
        );
    }

    #[rstest]
    fn test_decode_error_message() {
        let frame = r#"[{"Type":"Error","Text":"JSON parsing error","Debug":{"Offset":12}}]"#;

        let records = decode_frame(frame).unwrap();

        assert_eq!(
            records,
            vec![RefinitivWsMessage::Error {
                text: "JSON parsing error".to_string(),
                debug: Some(json!({"Offset": 12})),
            }]
        );
    }

    #[rstest]
    fn test_decode_nak() {
        let frame = r#"[{"ID":1,"Type":"Ack","AckID":5,"NakCode":"DeniedBySrc","Text":"no"}]"#;

        let records = decode_frame(frame).unwrap();

        match &records[0] {
            RefinitivWsMessage::Ack(ack) => {
                assert_eq!(ack.ack_id, 5);
                assert!(ack.is_nak());
                assert_eq!(ack.text.as_deref(), Some("no"));
            }
            other => panic!("Expected Ack, was {other:?}"),
        }
    }

    #[rstest]
    #[case(r#"{"ID":5,"Type":"Refresh","Key":{"Name":"UMER.TST"},"Fields":{"BID":1.0}}"#)]
    #[case(r#"{"ID":5,"Type":"Status","Domain":"MarketPrice","State":{"Stream":"Closed","Data":"Suspect"}}"#)]
    #[case(r#"{"ID":5,"Type":"Update","Fields":{"BID":1.0}}"#)]
    #[case(r#"{"Type":"SomethingNew"}"#)]
    fn test_decode_non_login_messages_are_other(#[case] frame: &str) {
        let records = decode_frame(frame).unwrap();

        assert_eq!(records, vec![RefinitivWsMessage::Other(to_value(frame))]);
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"[{"Type":"Ping"}"#)]
    #[case("42")]
    #[case(r#""Ping""#)]
    fn test_decode_malformed_frame_fails(#[case] frame: &str) {
        let result = decode_frame(frame);

        assert!(matches!(result, Err(RefinitivWsError::Codec(_))));
    }

    #[rstest]
    fn test_decode_drops_unclassifiable_elements() {
        let frame = r#"[{"ID":1}, 7, {"Type":"Ping"}]"#;

        let records = decode_frame(frame).unwrap();

        assert_eq!(records, vec![RefinitivWsMessage::Ping]);
    }
}
