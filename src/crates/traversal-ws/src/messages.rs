//! Wire envelope
//!
//! Requests and responses are JSON text frames. One request may be answered
//! by several response frames; all but the last carry [`status::PARTIAL`].
//!
//! ```json
//! {"requestId": "…", "op": "traversal", "traversal": [ … ]}
//! {"requestId": "…", "status": {"code": 206, "message": ""}, "result": [ … ]}
//! {"requestId": "…", "status": {"code": 200, "message": ""}, "result": [ … ]}
//! ```

use serde::{Deserialize, Serialize};
use traversal_core::{CompiledTraversal, RawResult, TraversalRequest};
use uuid::Uuid;

/// Response status codes
pub mod status {
    /// Final frame with results
    pub const SUCCESS: u16 = 200;
    /// Final frame, nothing to return
    pub const NO_CONTENT: u16 = 204;
    /// More frames follow
    pub const PARTIAL: u16 = 206;
    /// The request frame could not be parsed
    pub const MALFORMED_REQUEST: u16 = 498;
    /// Evaluation failed without a more specific code
    pub const SERVER_ERROR: u16 = 500;
}

/// Operation name carried by traversal requests
pub const TRAVERSAL_OP: &str = "traversal";

/// Client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage {
    pub request_id: Uuid,
    pub op: String,
    pub traversal: CompiledTraversal,
}

impl From<TraversalRequest> for RequestMessage {
    fn from(request: TraversalRequest) -> Self {
        Self {
            request_id: request.request_id,
            op: TRAVERSAL_OP.to_string(),
            traversal: request.traversal,
        }
    }
}

impl From<RequestMessage> for TraversalRequest {
    fn from(message: RequestMessage) -> Self {
        Self {
            request_id: message.request_id,
            traversal: message.traversal,
        }
    }
}

/// Outcome of one response frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseStatus {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// Server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    /// Absent only when the request itself could not be read
    #[serde(default)]
    pub request_id: Option<Uuid>,
    pub status: ResponseStatus,
    #[serde(default)]
    pub result: Vec<RawResult>,
}

impl ResponseMessage {
    /// A batch with more to follow
    pub fn partial(request_id: Uuid, result: Vec<RawResult>) -> Self {
        Self::with_status(Some(request_id), status::PARTIAL, String::new(), result)
    }

    /// The last batch; an empty one is sent as no content
    pub fn success(request_id: Uuid, result: Vec<RawResult>) -> Self {
        let code = if result.is_empty() {
            status::NO_CONTENT
        } else {
            status::SUCCESS
        };
        Self::with_status(Some(request_id), code, String::new(), result)
    }

    /// A failure, ending the request
    pub fn error(request_id: Option<Uuid>, code: u16, message: impl Into<String>) -> Self {
        Self::with_status(request_id, code, message.into(), Vec::new())
    }

    fn with_status(
        request_id: Option<Uuid>,
        code: u16,
        message: String,
        result: Vec<RawResult>,
    ) -> Self {
        Self {
            request_id,
            status: ResponseStatus { code, message },
            result,
        }
    }

    /// No further frames follow for this request
    pub fn is_terminal(&self) -> bool {
        self.status.code != status::PARTIAL
    }

    /// Status is an error
    pub fn is_error(&self) -> bool {
        !matches!(
            self.status.code,
            status::SUCCESS | status::NO_CONTENT | status::PARTIAL
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use traversal_core::{ElementKind, Step, StepSequence};

    #[test]
    fn test_request_envelope() {
        let steps = StepSequence::new().append(Step::SelectAll {
            kind: ElementKind::Vertex,
        });
        let request = TraversalRequest {
            request_id: Uuid::nil(),
            traversal: CompiledTraversal::new(steps).unwrap(),
        };
        let json = serde_json::to_value(RequestMessage::from(request.clone())).unwrap();
        assert_eq!(json["op"], "traversal");
        assert_eq!(json["requestId"], Uuid::nil().to_string());
        assert!(json["traversal"].is_array());

        let back: RequestMessage = serde_json::from_value(json).unwrap();
        assert_eq!(TraversalRequest::from(back), request);
    }

    #[test]
    fn test_response_status() {
        let id = Uuid::new_v4();
        assert!(!ResponseMessage::partial(id, vec![]).is_terminal());
        assert_eq!(ResponseMessage::success(id, vec![]).status.code, 204);

        let done = ResponseMessage::success(id, vec![RawResult::Value(json!(1))]);
        assert_eq!(done.status.code, 200);
        assert!(done.is_terminal() && !done.is_error());

        let failed = ResponseMessage::error(Some(id), 597, "boom");
        assert!(failed.is_terminal() && failed.is_error());
    }

    #[test]
    fn test_response_without_request_id() {
        let parsed: ResponseMessage =
            serde_json::from_str(r#"{"status": {"code": 498, "message": "bad"}}"#).unwrap();
        assert_eq!(parsed.request_id, None);
        assert!(parsed.result.is_empty());
    }
}
