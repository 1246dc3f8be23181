use crate::domain::model::{CreatedRecord, RecordPage};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 外部記錄管理服務（資料表 + 記錄）的存取介面
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 讀取一頁記錄；`offset` 為上一頁回傳的游標
    async fn list_page(
        &self,
        table: &str,
        page_size: usize,
        offset: Option<&str>,
    ) -> Result<RecordPage>;

    /// 以 `{"fields": ...}` 建立一筆記錄
    async fn create_record(
        &self,
        table: &str,
        fields: serde_json::Value,
    ) -> Result<CreatedRecord>;
}
