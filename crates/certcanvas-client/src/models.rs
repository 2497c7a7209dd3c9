//! Wire models for the certificate backend.

use crate::error::ApiError;
use certcanvas_core::binding::Record;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response envelope `{ success, msg, data }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// The payload, or `Rejected` when `success` is false.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.msg.unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Decode("response has no data".to_string()))
    }
}

/// Decode a response body. Bodies carrying a `success` flag are treated as
/// envelopes; anything else is the payload itself.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    let is_envelope = value.as_object().is_some_and(|map| map.contains_key("success"));
    if is_envelope {
        let envelope: ApiResponse<T> =
            serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
        envelope.into_data()
    } else {
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Check an envelope for `success` without reading `data`.
pub fn check_body(body: &[u8]) -> Result<(), ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    let envelope: ApiResponse<Value> =
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if envelope.success {
        Ok(())
    } else {
        Err(ApiError::Rejected(
            envelope.msg.unwrap_or_else(|| "request failed".to_string()),
        ))
    }
}

/// Body of `POST /certificate/render/{id}` and `POST /participant/distribute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantIds<'a> {
    pub participant_ids: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub participant_id: String,
    pub status: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

impl RenderResult {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    #[serde(default)]
    pub results: Vec<RenderResult>,
    #[serde(default)]
    pub zip_file_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerStatus {
    Pending,
    Signed,
    Rejected,
    #[serde(other)]
    Unknown,
}

/// One signer of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub status: SignerStatus,
    #[serde(default)]
    pub signed_at: Option<String>,
}

/// Body of `POST /signature/resend`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendRequest<'a> {
    pub certificate_id: &'a str,
    pub signer_id: &'a str,
}

/// A certificate recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub certificate_id: Option<String>,
    /// Column values keyed by column name.
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub is_revoked: bool,
    #[serde(default)]
    pub is_distributed: bool,
}

impl From<&Participant> for Record {
    fn from(participant: &Participant) -> Self {
        Record {
            id: participant.id.clone(),
            data: participant.data.clone(),
        }
    }
}

/// Fields for creating or updating a participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<String>,
    pub data: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_envelope_success() {
        let body = br#"{"success":true,"msg":"ok","data":["name","date"]}"#;
        let columns: Vec<String> = decode_body(body).unwrap();
        assert_eq!(columns, vec!["name", "date"]);
    }

    #[test]
    fn test_envelope_failure_carries_message() {
        let body = br#"{"success":false,"msg":"Certificate not found"}"#;
        let result: Result<Vec<String>, _> = decode_body(body);
        assert!(matches!(result, Err(ApiError::Rejected(m)) if m == "Certificate not found"));
        assert!(check_body(body).is_err());
        assert!(check_body(br#"{"success":true}"#).is_ok());
    }

    #[test]
    fn test_bare_render_response() {
        let body = json!({
            "results": [
                { "participantId": "p1", "status": "success", "filePath": "/out/p1.pdf" },
                { "participantId": "p2", "status": "failed" }
            ],
            "zipFilePath": "/out/all.zip"
        })
        .to_string();
        let response: RenderResponse = decode_body(body.as_bytes()).unwrap();
        assert_eq!(response.results.len(), 2);
        assert!(response.results[0].is_success());
        assert!(!response.results[1].is_success());
        assert_eq!(response.zip_file_path.as_deref(), Some("/out/all.zip"));
    }

    #[test]
    fn test_unknown_signer_status() {
        let signer: Signer =
            serde_json::from_value(json!({ "_id": "s1", "name": "Dean", "status": "expired" }))
                .unwrap();
        assert_eq!(signer.status, SignerStatus::Unknown);
    }

    #[test]
    fn test_participant_to_record() {
        let participant: Participant = serde_json::from_value(json!({
            "_id": "p1",
            "data": { "name": "Ada", "score": 97 }
        }))
        .unwrap();
        let record = Record::from(&participant);
        assert_eq!(record.text("name").as_deref(), Some("Ada"));
        assert_eq!(record.text("score").as_deref(), Some("97"));
    }

    #[test]
    fn test_participant_ids_body() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let body = serde_json::to_value(ParticipantIds {
            participant_ids: &ids,
        })
        .unwrap();
        assert_eq!(body, json!({ "participantIds": ["a", "b"] }));
    }
}
