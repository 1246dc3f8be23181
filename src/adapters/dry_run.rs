use crate::domain::model::{CreatedRecord, RecordPage};
use crate::domain::ports::RecordStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// 一筆被攔截下來、未真正送出的寫入
#[derive(Debug, Clone, serde::Serialize)]
pub struct PendingWrite {
    pub table: String,
    pub id: String,
    pub fields: serde_json::Value,
}

/// 讀取照常轉發給內層 store，寫入只保留在記憶體中
pub struct DryRunStore<S: RecordStore> {
    inner: S,
    writes: Mutex<Vec<PendingWrite>>,
}

impl<S: RecordStore> DryRunStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub async fn writes(&self) -> Vec<PendingWrite> {
        self.writes.lock().await.clone()
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for DryRunStore<S> {
    async fn list_page(
        &self,
        table: &str,
        page_size: usize,
        offset: Option<&str>,
    ) -> Result<RecordPage> {
        self.inner.list_page(table, page_size, offset).await
    }

    async fn create_record(
        &self,
        table: &str,
        fields: serde_json::Value,
    ) -> Result<CreatedRecord> {
        let mut writes = self.writes.lock().await;
        let id = format!("dry-run-{}", writes.len() + 1);
        tracing::info!("🧪 Dry run: would create {} record {}", table, id);
        writes.push(PendingWrite {
            table: table.to_string(),
            id: id.clone(),
            fields,
        });
        Ok(CreatedRecord { id })
    }
}
