use crate::config::AirtableSettings;
use crate::domain::model::{CreatedRecord, RecordPage};
use crate::domain::ports::RecordStore;
use crate::utils::error::{IntakeError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// Airtable REST API（`{api_url}/{base_id}/{table}`）的 RecordStore 實作
#[derive(Clone)]
pub struct AirtableClient {
    client: Client,
    api_url: Url,
    base_id: String,
    token: String,
}

impl AirtableClient {
    pub fn new(settings: &AirtableSettings) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let api_url =
            Url::parse(&settings.api_url).map_err(|e| IntakeError::InvalidConfigValueError {
                field: "airtable.api_url".to_string(),
                value: settings.api_url.clone(),
                reason: format!("Invalid URL format: {}", e),
            })?;

        Ok(Self {
            client: builder.build()?,
            api_url,
            base_id: settings.base_id.clone(),
            token: settings.token.clone(),
        })
    }

    /// 資料表名稱作為路徑片段，會自動做百分比編碼
    pub fn table_url(&self, table: &str) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| IntakeError::ConfigError {
                message: format!("API URL cannot carry a path: {}", self.api_url),
            })?
            .pop_if_empty()
            .push(&self.base_id)
            .push(table);
        Ok(url)
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Airtable responded {}: {}", status, body);
        Err(IntakeError::UpstreamRejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RecordStore for AirtableClient {
    async fn list_page(
        &self,
        table: &str,
        page_size: usize,
        offset: Option<&str>,
    ) -> Result<RecordPage> {
        let url = self.table_url(table)?;
        tracing::debug!("Listing {} (pageSize={}, offset={:?})", url, page_size, offset);

        let mut request = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("pageSize", page_size.to_string())]);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response = Self::ensure_success(request.send().await?).await?;
        Ok(response.json::<RecordPage>().await?)
    }

    async fn create_record(
        &self,
        table: &str,
        fields: serde_json::Value,
    ) -> Result<CreatedRecord> {
        let url = self.table_url(table)?;
        let body = serde_json::json!({ "fields": fields });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        tracing::debug!("Airtable create response status for {}: {}", table, response.status());

        let response = Self::ensure_success(response).await?;
        Ok(response.json::<CreatedRecord>().await?)
    }
}
