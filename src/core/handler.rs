use crate::config::SubmissionSettings;
use crate::core::submission::{SubmissionOrchestrator, SubmissionReport};
use crate::domain::model::SubmissionPayload;
use crate::domain::ports::RecordStore;
use crate::utils::error::{IntakeError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// API Gateway / Function URL 代理事件中用得到的部分
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormEvent {
    #[serde(default)]
    pub http_method: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl FormEvent {
    pub fn post(body: impl Into<String>) -> Self {
        Self {
            http_method: "POST".to_string(),
            body: Some(body.into()),
            is_base64_encoded: false,
        }
    }

    /// 取出請求內容，閘道以 base64 傳送時先解碼
    pub fn decoded_body(&self) -> Result<Cow<'_, str>> {
        let body = self.body.as_deref().ok_or(IntakeError::MissingBody)?;
        if !self.is_base64_encoded {
            return Ok(Cow::Borrowed(body));
        }

        let bytes = STANDARD
            .decode(body.trim())
            .map_err(|e| IntakeError::BodyDecodeError(e.to_string()))?;
        String::from_utf8(bytes)
            .map(Cow::Owned)
            .map_err(|e| IntakeError::BodyDecodeError(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl FormResponse {
    fn new(status_code: u16, content_type: &str, body: String) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        Self {
            status_code,
            headers,
            body,
        }
    }

    pub fn method_not_allowed() -> Self {
        Self::new(405, "text/plain", "Method Not Allowed".to_string())
    }

    pub fn success() -> Self {
        Self::new(
            200,
            "application/json",
            serde_json::json!({ "success": true }).to_string(),
        )
    }

    pub fn error(message: &str) -> Self {
        Self::new(
            500,
            "application/json",
            serde_json::json!({ "error": message }).to_string(),
        )
    }
}

/// 處理一次表單送出：非 POST 直接回 405，其餘錯誤一律回 500
pub async fn handle_event<S: RecordStore>(
    event: &FormEvent,
    store: &S,
    settings: &SubmissionSettings,
) -> FormResponse {
    if event.http_method != "POST" {
        tracing::warn!("Rejected {} request", event.http_method);
        return FormResponse::method_not_allowed();
    }

    match process(event, store, settings).await {
        Ok(report) => {
            tracing::info!(
                "✅ Submission stored for user {} ({} jurisdiction records)",
                report.user_id,
                report.created_count()
            );
            FormResponse::success()
        }
        Err(e) => {
            tracing::error!("Function error ({:?}): {}", e.kind(), e);
            FormResponse::error(&e.to_string())
        }
    }
}

async fn process<S: RecordStore>(
    event: &FormEvent,
    store: &S,
    settings: &SubmissionSettings,
) -> Result<SubmissionReport> {
    let body = event.decoded_body()?;
    let payload: SubmissionPayload = serde_json::from_str(&body)?;

    SubmissionOrchestrator::new(store, settings)
        .submit(&payload)
        .await?
        .into_result()
}
