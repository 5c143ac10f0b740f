use crate::action::RemoteCommand;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field of a `GetStreamingStatus` response that reports the replay buffer
pub const REPLAY_BUFFER_ACTIVE_FIELD: &str = "replay-buffer-active";

/// Identifies which workflow step a response belongs to.
///
/// Only one request is ever outstanding, so each step uses a fixed tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationTag {
    #[serde(rename = "single-step")]
    SingleStep,
    #[serde(rename = "checkStatus")]
    CheckStatus,
    #[serde(rename = "startReplay")]
    StartReplay,
    #[serde(rename = "saveReplay")]
    SaveReplay,
}

impl CorrelationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleStep => "single-step",
            Self::CheckStatus => "checkStatus",
            Self::StartReplay => "startReplay",
            Self::SaveReplay => "saveReplay",
        }
    }
}

/// Outgoing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    #[serde(rename = "request-type")]
    pub command: RemoteCommand,
    #[serde(rename = "message-id")]
    pub tag: CorrelationTag,
}

impl Request {
    pub fn new(command: RemoteCommand, tag: CorrelationTag) -> Self {
        Self { command, tag }
    }
}

/// Anything but `"ok"` counts as an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Reply to a request, matched by its echoed `message-id`
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub message_id: String,
    pub status: ResponseStatus,
    pub error: Option<String>,
    /// Every other key of the reply
    pub fields: Map<String, Value>,
}

/// Result carried by a response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome<'a> {
    Success { fields: &'a Map<String, Value> },
    Failure { error: &'a str },
}

impl Response {
    /// Decode a reply object. Never fails, so a reply to the awaited request
    /// always reaches the session even when its shape is off.
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        let message_id = match object.remove("message-id") {
            Some(Value::String(id)) => id,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let status = match object.remove("status") {
            Some(Value::String(status)) if status == "ok" => ResponseStatus::Ok,
            _ => ResponseStatus::Error,
        };

        let error = match object.remove("error") {
            None | Some(Value::Null) => None,
            Some(Value::String(error)) => Some(error),
            Some(other) => Some(other.to_string()),
        };

        Self {
            message_id,
            status,
            error,
            fields: object,
        }
    }

    pub fn is_tagged(&self, tag: CorrelationTag) -> bool {
        self.message_id == tag.as_str()
    }

    pub fn outcome(&self) -> ResponseOutcome<'_> {
        match self.status {
            ResponseStatus::Ok => ResponseOutcome::Success {
                fields: &self.fields,
            },
            ResponseStatus::Error => ResponseOutcome::Failure {
                error: self.error.as_deref().unwrap_or("Unknown error"),
            },
        }
    }

    /// Replay buffer flag of a status response; missing reads as inactive
    pub fn replay_buffer_active(&self) -> bool {
        self.fields
            .get(REPLAY_BUFFER_ACTIVE_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Anything the server can push at us
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Response(Response),
    /// Unsolicited `update-type` notification
    Event(String),
    Unrecognized(Value),
}

impl Inbound {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        let value = match value {
            Value::Object(object) if object.contains_key("message-id") => {
                return Ok(Inbound::Response(Response::from_object(object)));
            }
            other => other,
        };

        match value.get("update-type").and_then(Value::as_str) {
            Some(kind) => Ok(Inbound::Event(kind.to_string())),
            None => Ok(Inbound::Unrecognized(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = Request::new(RemoteCommand::SaveReplayBuffer, CorrelationTag::SingleStep);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "request-type": "SaveReplayBuffer",
                "message-id": "single-step",
            })
        );
    }

    #[test]
    fn test_tags_match_serde_names() {
        for tag in [
            CorrelationTag::SingleStep,
            CorrelationTag::CheckStatus,
            CorrelationTag::StartReplay,
            CorrelationTag::SaveReplay,
        ] {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.as_str()));
        }
    }

    #[test]
    fn test_parse_success_response_keeps_fields() {
        let inbound = Inbound::parse(
            r#"{"message-id":"checkStatus","status":"ok","replay-buffer-active":true,"recording":false}"#,
        )
        .unwrap();

        let Inbound::Response(response) = inbound else {
            panic!("expected a response, got {:?}", inbound);
        };
        assert!(response.is_tagged(CorrelationTag::CheckStatus));
        assert!(response.replay_buffer_active());
        assert!(matches!(response.outcome(), ResponseOutcome::Success { fields } if fields.contains_key("recording")));
    }

    #[test]
    fn test_parse_error_response() {
        let inbound =
            Inbound::parse(r#"{"message-id":"startReplay","status":"error","error":"replay buffer already active"}"#)
                .unwrap();

        let Inbound::Response(response) = inbound else {
            panic!("expected a response, got {:?}", inbound);
        };
        assert_eq!(
            response.outcome(),
            ResponseOutcome::Failure {
                error: "replay buffer already active"
            }
        );
    }

    #[test]
    fn test_error_without_description() {
        let inbound = Inbound::parse(r#"{"message-id":"single-step","status":"error"}"#).unwrap();
        let Inbound::Response(response) = inbound else {
            panic!("expected a response");
        };
        assert_eq!(
            response.outcome(),
            ResponseOutcome::Failure {
                error: "Unknown error"
            }
        );
    }

    #[test]
    fn test_unknown_status_is_a_failure() {
        let inbound =
            Inbound::parse(r#"{"message-id":"single-step","status":"failed","error":"nope"}"#).unwrap();
        let Inbound::Response(response) = inbound else {
            panic!("expected a response");
        };
        assert_eq!(response.status, ResponseStatus::Error);
        assert_eq!(response.outcome(), ResponseOutcome::Failure { error: "nope" });

        let inbound = Inbound::parse(r#"{"message-id":"single-step"}"#).unwrap();
        let Inbound::Response(response) = inbound else {
            panic!("expected a response");
        };
        assert_eq!(
            response.outcome(),
            ResponseOutcome::Failure {
                error: "Unknown error"
            }
        );
    }

    #[test]
    fn test_structured_error_kept_as_json_text() {
        let inbound =
            Inbound::parse(r#"{"message-id":"single-step","status":"error","error":{"code":604}}"#)
                .unwrap();
        let Inbound::Response(response) = inbound else {
            panic!("expected a response");
        };
        assert_eq!(
            response.outcome(),
            ResponseOutcome::Failure {
                error: r#"{"code":604}"#
            }
        );

        let inbound =
            Inbound::parse(r#"{"message-id":"single-step","status":"error","error":null}"#).unwrap();
        let Inbound::Response(response) = inbound else {
            panic!("expected a response");
        };
        assert_eq!(
            response.outcome(),
            ResponseOutcome::Failure {
                error: "Unknown error"
            }
        );
    }

    #[test]
    fn test_missing_active_flag_reads_inactive() {
        let inbound = Inbound::parse(r#"{"message-id":"checkStatus","status":"ok"}"#).unwrap();
        let Inbound::Response(response) = inbound else {
            panic!("expected a response");
        };
        assert!(!response.replay_buffer_active());
    }

    #[test]
    fn test_parse_event_and_unknown() {
        assert_eq!(
            Inbound::parse(r#"{"update-type":"ReplayStarted"}"#).unwrap(),
            Inbound::Event("ReplayStarted".to_string())
        );
        assert!(matches!(
            Inbound::parse(r#"{"hello":1}"#).unwrap(),
            Inbound::Unrecognized(_)
        ));
        assert!(Inbound::parse("not json").is_err());
    }
}
