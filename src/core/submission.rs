use crate::config::{FailurePolicy, SubmissionSettings};
use crate::core::category_map::{CategoryResolver, CategorySource};
use crate::core::field_mapping::{
    joined_services, resolve_category, JoinedJurisdictionFields, JurisdictionRecordFields,
    JurisdictionRecordInput, UserRecordFields,
};
use crate::domain::model::{CreatedRecord, JurisdictionPayload, ServiceEntry, SubmissionPayload};
use crate::domain::ports::RecordStore;
use crate::utils::error::{IntakeError, Result};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteStatus {
    Created { id: String },
    Failed { reason: String },
}

/// 單筆管轄區 × 服務項目寫入的結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub jurisdiction: String,
    pub product: String,
    #[serde(flatten)]
    pub status: WriteStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub user_id: String,
    pub outcomes: Vec<WriteOutcome>,
}

impl SubmissionReport {
    fn new(user_id: String) -> Self {
        Self {
            user_id,
            outcomes: Vec::new(),
        }
    }

    pub fn created_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, WriteStatus::Created { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.created_count()
    }

    /// 有任何寫入失敗時轉成錯誤
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed_count();
        if failed > 0 {
            return Err(IntakeError::PartialSubmission {
                failed,
                attempted: self.outcomes.len(),
            });
        }
        Ok(self)
    }
}

/// 使用者記錄 → 管轄區記錄的建立流程，全部依序執行
pub struct SubmissionOrchestrator<'a, S: RecordStore> {
    store: &'a S,
    settings: &'a SubmissionSettings,
}

impl<'a, S: RecordStore> SubmissionOrchestrator<'a, S> {
    pub fn new(store: &'a S, settings: &'a SubmissionSettings) -> Self {
        Self { store, settings }
    }

    pub async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReport> {
        let jurisdictions = self.jurisdictions_to_write(payload)?;

        // 分類對照要在寫入任何記錄前建好，讀取失敗時不會留下使用者記錄
        let source = CategoryResolver::new(self.store, self.settings)
            .load(self.settings.category_strategy)
            .await?;

        let user = self.create_user(payload).await?;
        let mut report = SubmissionReport::new(user.id.clone());

        let user_name = payload.user_fields.display_name();
        for jurisdiction in jurisdictions {
            if self.settings.field_set.is_per_jurisdiction() {
                let result = self
                    .create_joined_jurisdiction(jurisdiction, &source, &user.id)
                    .await;
                let outcome = self.record_outcome(
                    jurisdiction.name(),
                    &joined_services(jurisdiction),
                    result,
                )?;
                report.outcomes.push(outcome);
                continue;
            }

            for service in jurisdiction.services() {
                let result = self
                    .create_jurisdiction(jurisdiction, service, &source, &user.id, &user_name)
                    .await;
                let outcome = self.record_outcome(
                    jurisdiction.name(),
                    service.product.as_deref().unwrap_or_default(),
                    result,
                )?;
                report.outcomes.push(outcome);
            }
        }

        tracing::info!(
            "✅ Submission finished: {} jurisdiction record(s) created, {} failed",
            report.created_count(),
            report.failed_count()
        );
        Ok(report)
    }

    /// 只有律師且提供了管轄區陣列時才會寫入管轄區記錄；
    /// 每個管轄區都必須帶 services 清單，否則在任何寫入前就中止
    fn jurisdictions_to_write<'p>(
        &self,
        payload: &'p SubmissionPayload,
    ) -> Result<&'p [JurisdictionPayload]> {
        if !payload.user_fields.is_attorney() {
            tracing::info!("User is not an attorney, skipping jurisdiction records");
            return Ok(Default::default());
        }
        let Some(jurisdictions) = &payload.jurisdiction_payloads else {
            tracing::info!("No jurisdiction list supplied, skipping jurisdiction records");
            return Ok(Default::default());
        };

        if let Some(missing) = jurisdictions.iter().find(|j| j.services.is_none()) {
            return Err(IntakeError::MissingServices {
                jurisdiction: missing.name().to_string(),
            });
        }
        Ok(jurisdictions.as_slice())
    }

    async fn create_user(&self, payload: &SubmissionPayload) -> Result<CreatedRecord> {
        let fields = UserRecordFields::from(&payload.user_fields).to_value()?;

        match self.store.create_record(&self.settings.user_table, fields).await {
            Ok(user) => {
                tracing::info!("👤 User record created: {}", user.id);
                Ok(user)
            }
            Err(e) if e.is_upstream_rejection() => {
                tracing::error!("❌ User creation rejected: {}", e);
                Err(IntakeError::UserCreationFailed)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_jurisdiction(
        &self,
        jurisdiction: &JurisdictionPayload,
        service: &ServiceEntry,
        source: &CategorySource,
        user_id: &str,
        user_name: &str,
    ) -> Result<CreatedRecord> {
        let category = resolve_category(service, source);
        let fields = JurisdictionRecordFields::build(JurisdictionRecordInput {
            jurisdiction,
            service,
            category,
            user_id,
            user_name,
            field_set: self.settings.field_set,
        })
        .to_value()?;

        tracing::debug!("Posting jurisdiction record with fields: {}", fields);
        self.store
            .create_record(&self.settings.jurisdiction_table, fields)
            .await
    }

    async fn create_joined_jurisdiction(
        &self,
        jurisdiction: &JurisdictionPayload,
        source: &CategorySource,
        user_id: &str,
    ) -> Result<CreatedRecord> {
        let fields = JoinedJurisdictionFields::build(jurisdiction, source, user_id).to_value()?;

        tracing::debug!("Posting joined jurisdiction record with fields: {}", fields);
        self.store
            .create_record(&self.settings.jurisdiction_table, fields)
            .await
    }

    /// 依失敗策略決定中止或記錄後繼續
    fn record_outcome(
        &self,
        jurisdiction: &str,
        product: &str,
        result: Result<CreatedRecord>,
    ) -> Result<WriteOutcome> {
        let status = match result {
            Ok(record) => {
                tracing::debug!("Jurisdiction record created: {}", record.id);
                WriteStatus::Created { id: record.id }
            }
            Err(e) => {
                tracing::error!(
                    "❌ Jurisdiction record failed ({} / {}): {}",
                    jurisdiction,
                    product,
                    e
                );
                match self.settings.failure_policy {
                    FailurePolicy::AbortOnFirst if e.is_upstream_rejection() => {
                        return Err(IntakeError::JurisdictionCreationFailed {
                            jurisdiction: jurisdiction.to_string(),
                            product: product.to_string(),
                        });
                    }
                    FailurePolicy::AbortOnFirst => return Err(e),
                    FailurePolicy::ContinueAndReport => WriteStatus::Failed {
                        reason: e.to_string(),
                    },
                }
            }
        };

        Ok(WriteOutcome {
            jurisdiction: jurisdiction.to_string(),
            product: product.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryStrategy, FieldSet};
    use crate::domain::model::{RecordPage, TableRecord};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const USERS: &str = "User Onboarding 2";
    const JURISDICTIONS: &str = "Jurisdictions";

    #[derive(Clone, Default)]
    struct MockStore {
        products: Vec<TableRecord>,
        fail_products: bool,
        fail_user: bool,
        /// 第 N 筆（從 1 起算）管轄區寫入回傳 422
        fail_jurisdiction_write: Option<usize>,
        list_calls: Arc<Mutex<usize>>,
        writes: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    }

    impl MockStore {
        fn with_products(products: &[(&str, &str)]) -> Self {
            let products = products
                .iter()
                .enumerate()
                .map(|(i, (category, product))| TableRecord {
                    id: format!("recP{}", i),
                    fields: json!({"Category": category, "Product Name": product})
                        .as_object()
                        .unwrap()
                        .clone(),
                })
                .collect();
            Self {
                products,
                ..Self::default()
            }
        }

        async fn writes_to(&self, table: &str) -> Vec<serde_json::Value> {
            self.writes
                .lock()
                .await
                .iter()
                .filter(|(t, _)| t == table)
                .map(|(_, fields)| fields.clone())
                .collect()
        }
    }

    #[async_trait]
    impl RecordStore for MockStore {
        async fn list_page(
            &self,
            _table: &str,
            _page_size: usize,
            _offset: Option<&str>,
        ) -> Result<RecordPage> {
            *self.list_calls.lock().await += 1;
            if self.fail_products {
                return Err(IntakeError::UpstreamRejected {
                    status: 401,
                    body: "AUTHENTICATION_REQUIRED".to_string(),
                });
            }
            Ok(RecordPage {
                records: self.products.clone(),
                offset: None,
            })
        }

        async fn create_record(
            &self,
            table: &str,
            fields: serde_json::Value,
        ) -> Result<CreatedRecord> {
            let mut writes = self.writes.lock().await;
            if table == USERS && self.fail_user {
                return Err(IntakeError::UpstreamRejected {
                    status: 422,
                    body: "INVALID_VALUE_FOR_COLUMN".to_string(),
                });
            }
            if table == JURISDICTIONS {
                let attempt = writes
                    .iter()
                    .filter(|(t, _)| t.starts_with(JURISDICTIONS))
                    .count()
                    + 1;
                if self.fail_jurisdiction_write == Some(attempt) {
                    writes.push((format!("{}:rejected", table), fields));
                    return Err(IntakeError::UpstreamRejected {
                        status: 422,
                        body: "UNKNOWN_FIELD_NAME".to_string(),
                    });
                }
            }
            writes.push((table.to_string(), fields));
            Ok(CreatedRecord {
                id: format!("rec{}", writes.len()),
            })
        }
    }

    fn attorney_payload(services: serde_json::Value) -> SubmissionPayload {
        serde_json::from_value(json!({
            "userFields": {"firstName": "A", "lastName": "B", "email": "a@b.com", "isAttorney": true},
            "jurisdictionPayloads": [
                {"jurisdiction": "CA", "barNumber": "123", "services": services}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_trademark_filing_resolves_to_ip() {
        let store = MockStore::with_products(&[("IP", "Trademark Filing"), ("Tax", "Audit")]);
        let settings = SubmissionSettings::default();
        let payload = attorney_payload(json!([{"product": "Trademark Filing"}]));

        let report = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap();

        let users = store.writes_to(USERS).await;
        let jurisdictions = store.writes_to(JURISDICTIONS).await;
        assert_eq!(users.len(), 1);
        assert_eq!(jurisdictions.len(), 1);
        assert_eq!(jurisdictions[0]["Parent Categories"], "IP");
        assert_eq!(jurisdictions[0]["Subcategory"], "Uncategorized");
        assert_eq!(jurisdictions[0]["Linked User"], json!([report.user_id]));
        assert_eq!(jurisdictions[0]["User"], "A B");
        assert_eq!(report.created_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_product_gets_unknown_category() {
        let store = MockStore::with_products(&[("IP", "Trademark Filing")]);
        let settings = SubmissionSettings::default();
        let payload = attorney_payload(json!([{"product": "Maritime Salvage"}]));

        SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap();

        let jurisdictions = store.writes_to(JURISDICTIONS).await;
        assert_eq!(jurisdictions[0]["Parent Categories"], "Unknown");
        assert!(jurisdictions[0].get("Subcategory").is_none());
    }

    #[tokio::test]
    async fn test_non_attorney_creates_no_jurisdictions() {
        let store = MockStore::with_products(&[("IP", "Trademark Filing")]);
        let settings = SubmissionSettings::default();
        let mut payload = attorney_payload(json!([{"product": "Trademark Filing"}]));
        payload.user_fields.is_attorney = Some(false);

        let report = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap();

        assert_eq!(store.writes_to(USERS).await[0]["Is Attorney"], "No");
        assert!(store.writes_to(JURISDICTIONS).await.is_empty());
        assert!(report.outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_user_creation_failure_stops_before_jurisdictions() {
        let store = MockStore {
            fail_user: true,
            ..MockStore::with_products(&[("IP", "Trademark Filing")])
        };
        let settings = SubmissionSettings::default();
        let payload = attorney_payload(json!([{"product": "Trademark Filing"}]));

        let err = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::UserCreationFailed));
        assert!(store.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_category_fetch_failure_writes_nothing() {
        let store = MockStore {
            fail_products: true,
            ..MockStore::default()
        };
        let settings = SubmissionSettings::default();
        let payload = attorney_payload(json!([{"product": "Trademark Filing"}]));

        let err = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::CategoryFetchFailed));
        assert!(store.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_abort_on_first_failed_jurisdiction_write() {
        let store = MockStore {
            fail_jurisdiction_write: Some(2),
            ..MockStore::with_products(&[("IP", "One"), ("IP", "Two"), ("IP", "Three")])
        };
        let settings = SubmissionSettings::default();
        let payload = attorney_payload(json!([
            {"product": "One"}, {"product": "Two"}, {"product": "Three"}
        ]));

        let err = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Jurisdiction record creation failed (CA / Two)"
        );
        // 已寫入的記錄保留，後續的不再送出
        let persisted = store.writes_to(JURISDICTIONS).await;
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0]["Services"], "One");
        assert_eq!(store.writes.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_continue_and_report_attempts_every_write() {
        let store = MockStore {
            fail_jurisdiction_write: Some(2),
            ..MockStore::with_products(&[("IP", "One"), ("IP", "Two"), ("IP", "Three")])
        };
        let settings = SubmissionSettings {
            failure_policy: FailurePolicy::ContinueAndReport,
            ..SubmissionSettings::default()
        };
        let payload = attorney_payload(json!([
            {"product": "One"}, {"product": "Two"}, {"product": "Three"}
        ]));

        let report = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.created_count(), 2);
        assert!(matches!(
            report.outcomes[1].status,
            WriteStatus::Failed { .. }
        ));
        let err = report.into_result().unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 jurisdiction records failed");
    }

    #[tokio::test]
    async fn test_embedded_strategy_never_reads_products() {
        let store = MockStore::default();
        let settings = SubmissionSettings {
            category_strategy: CategoryStrategy::Embedded,
            field_set: FieldSet::Litigation,
            ..SubmissionSettings::default()
        };
        let payload: SubmissionPayload = serde_json::from_value(json!({
            "userFields": {"firstName": "A", "lastName": "B", "isAttorney": true},
            "jurisdictionPayloads": [{
                "jurisdiction": "TX",
                "barNumber": "77",
                "doesLitigation": true,
                "services": [{"product": "LLC Formation", "category": "Corporate", "subcategory": "Formation"}]
            }]
        }))
        .unwrap();

        SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap();

        assert_eq!(*store.list_calls.lock().await, 0);
        let jurisdictions = store.writes_to(JURISDICTIONS).await;
        assert_eq!(jurisdictions[0]["Parent Categories"], "Corporate");
        assert_eq!(jurisdictions[0]["Subcategory"], "Formation");
        assert_eq!(jurisdictions[0]["Does Litigation"], "Yes");
    }

    #[tokio::test]
    async fn test_records_fan_out_per_jurisdiction_and_service() {
        let store = MockStore::with_products(&[("IP", "Trademark Filing"), ("Tax", "Audit")]);
        let settings = SubmissionSettings::default();
        let payload: SubmissionPayload = serde_json::from_value(json!({
            "userFields": {"firstName": "A", "lastName": "B", "isAttorney": true},
            "jurisdictionPayloads": [
                {"jurisdiction": "CA", "barNumber": "1", "services": [{"product": "Trademark Filing"}, {"product": "Audit"}]},
                {"jurisdiction": "NV", "barNumber": "2", "patentLicense": "P-9", "services": [{"product": "Audit"}]},
                {"jurisdiction": "OR", "barNumber": "3", "services": []}
            ]
        }))
        .unwrap();

        let report = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap();

        let jurisdictions = store.writes_to(JURISDICTIONS).await;
        assert_eq!(jurisdictions.len(), 3);
        assert_eq!(jurisdictions[2]["Jurisdiction"], "NV");
        assert_eq!(jurisdictions[2]["Patent License Number"], "P-9");
        assert_eq!(jurisdictions[2]["Parent Categories"], "Tax");
        assert!(jurisdictions
            .iter()
            .all(|fields| fields["Linked User"] == json!([report.user_id.clone()])));
    }

    #[tokio::test]
    async fn test_attorney_without_jurisdiction_array() {
        let store = MockStore::default();
        let settings = SubmissionSettings::default();
        let payload: SubmissionPayload = serde_json::from_value(json!({
            "userFields": {"firstName": "A", "isAttorney": true},
            "jurisdictionPayloads": "CA"
        }))
        .unwrap();

        let report = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap();

        assert_eq!(report.user_id, "rec1");
        assert!(store.writes_to(JURISDICTIONS).await.is_empty());
    }

    #[tokio::test]
    async fn test_jurisdiction_without_services_list_fails_before_any_write() {
        let store = MockStore::with_products(&[("IP", "Trademark Filing")]);
        let settings = SubmissionSettings::default();
        let payload: SubmissionPayload = serde_json::from_value(json!({
            "userFields": {"firstName": "A", "isAttorney": true},
            "jurisdictionPayloads": [
                {"jurisdiction": "CA", "barNumber": "1", "services": ["Trademark Filing"]},
                {"jurisdiction": "OR", "barNumber": "3"}
            ]
        }))
        .unwrap();

        let err = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Jurisdiction OR has no services list");
        assert!(store.writes.lock().await.is_empty());
        assert_eq!(*store.list_calls.lock().await, 0);
    }

    #[tokio::test]
    async fn test_non_attorney_ignores_missing_services() {
        let store = MockStore::default();
        let settings = SubmissionSettings {
            category_strategy: CategoryStrategy::Embedded,
            ..SubmissionSettings::default()
        };
        let payload: SubmissionPayload = serde_json::from_value(json!({
            "userFields": {"firstName": "A", "isAttorney": false},
            "jurisdictionPayloads": [{"jurisdiction": "OR"}]
        }))
        .unwrap();

        let report = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap();

        assert!(report.outcomes.is_empty());
        assert_eq!(store.writes_to(USERS).await.len(), 1);
    }

    #[tokio::test]
    async fn test_joined_field_set_writes_one_record_per_jurisdiction() {
        let store = MockStore::default();
        let settings = SubmissionSettings {
            category_strategy: CategoryStrategy::Embedded,
            field_set: FieldSet::Joined,
            ..SubmissionSettings::default()
        };
        let payload: SubmissionPayload = serde_json::from_value(json!({
            "userFields": {"firstName": "A", "lastName": "B", "isAttorney": true},
            "jurisdictionPayloads": [
                {
                    "jurisdiction": "CA",
                    "barNumber": "123",
                    "parentCategories": ["IP", "Tax"],
                    "services": ["Trademark Filing", "Audit"]
                },
                {"jurisdiction": "NV", "barNumber": "9", "parentCategories": [], "services": []}
            ]
        }))
        .unwrap();

        let report = SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap();

        let jurisdictions = store.writes_to(JURISDICTIONS).await;
        assert_eq!(jurisdictions.len(), 2);
        assert_eq!(jurisdictions[0]["Parent Categories"], "IP, Tax");
        assert_eq!(jurisdictions[0]["Services"], "Trademark Filing, Audit");
        assert_eq!(jurisdictions[0]["Linked User"], json!([report.user_id.clone()]));
        assert!(jurisdictions[0].get("Appearance").is_none());
        assert_eq!(jurisdictions[1]["Services"], "");
        assert_eq!(report.outcomes[0].product, "Trademark Filing, Audit");
        assert_eq!(*store.list_calls.lock().await, 0);
    }

    #[tokio::test]
    async fn test_flat_strategy_resolves_through_flat_map() {
        let store = MockStore::with_products(&[("IP", "Trademark Filing"), ("Tax", "Audit")]);
        let settings = SubmissionSettings {
            category_strategy: CategoryStrategy::Flat,
            ..SubmissionSettings::default()
        };
        let payload = attorney_payload(json!(["Audit", "Maritime Salvage"]));

        SubmissionOrchestrator::new(&store, &settings)
            .submit(&payload)
            .await
            .unwrap();

        let jurisdictions = store.writes_to(JURISDICTIONS).await;
        assert_eq!(*store.list_calls.lock().await, 1);
        assert_eq!(jurisdictions[0]["Parent Categories"], "Tax");
        assert!(jurisdictions[0].get("Subcategory").is_none());
        assert_eq!(jurisdictions[1]["Parent Categories"], "Unknown");
    }
}
