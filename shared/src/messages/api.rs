//! Response envelope of the v1 HTTP API

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{SharedError, SharedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
    Error,
}

/// `{"status": ..., "data": ..., "errorType": ..., "error": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status: ApiStatus,

    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Convert an error envelope into `SharedError::ApiError`
    pub fn into_result(self) -> SharedResult<Option<T>> {
        match self.status {
            ApiStatus::Success => Ok(self.data),
            ApiStatus::Error => Err(SharedError::ApiError {
                error_type: self.error_type.unwrap_or_else(|| "unknown".to_string()),
                message: self.error.unwrap_or_default(),
            }),
        }
    }

    /// Like [`into_result`](Self::into_result) but requires a payload
    pub fn into_data(self) -> SharedResult<T> {
        self.into_result()?.ok_or(SharedError::MissingData)
    }
}

/// Payload of a successful silence creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SilenceCreated {
    #[serde(deserialize_with = "silence_id")]
    pub silence_id: String,
}

/// Older releases hand out numeric silence identifiers, newer ones UUIDs.
fn silence_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_id_accepts_string_and_number() {
        let text: ApiResponse<SilenceCreated> =
            serde_json::from_str(r#"{"status":"success","data":{"silenceId":"7d8f"}}"#).unwrap();
        assert_eq!(text.into_data().unwrap().silence_id, "7d8f");

        let number: ApiResponse<SilenceCreated> =
            serde_json::from_str(r#"{"status":"success","data":{"silenceId":42}}"#).unwrap();
        assert_eq!(number.into_data().unwrap().silence_id, "42");
    }

    #[test]
    fn test_error_envelope() {
        let resp: ApiResponse<SilenceCreated> =
            serde_json::from_str(r#"{"status":"error","errorType":"bad_data","error":"invalid matcher"}"#)
                .unwrap();

        match resp.into_data() {
            Err(SharedError::ApiError { error_type, message }) => {
                assert_eq!(error_type, "bad_data");
                assert_eq!(message, "invalid matcher");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_success_without_data() {
        let resp: ApiResponse<SilenceCreated> = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(matches!(resp.into_data(), Err(SharedError::MissingData)));
    }
}
