#[cfg(feature = "cli")]
pub mod cli;
pub mod lambda;
pub mod toml_config;

use crate::utils::error::{IntakeError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_secret, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_BASE_ID: &str = "appHuFySGdecIs6Cq";
pub const DEFAULT_USER_TABLE: &str = "User Onboarding 2";
pub const DEFAULT_JURISDICTION_TABLE: &str = "Jurisdictions";
pub const DEFAULT_PRODUCTS_TABLE: &str = "Master Products";
/// 列表 API 單頁上限
pub const MAX_PAGE_SIZE: usize = 100;

/// 行程啟動時建立一次，之後以參考傳入各元件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeConfig {
    #[serde(default)]
    pub airtable: AirtableSettings,
    #[serde(default)]
    pub submission: SubmissionSettings,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AirtableSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_base_id")]
    pub base_id: String,
    #[serde(default)]
    pub token: String,
    pub timeout_seconds: Option<u64>,
}

// token 不可出現在日誌中
impl fmt::Debug for AirtableSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirtableSettings")
            .field("api_url", &self.api_url)
            .field("base_id", &self.base_id)
            .field("token", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for AirtableSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            base_id: default_base_id(),
            token: String::new(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionSettings {
    pub user_table: String,
    pub jurisdiction_table: String,
    pub products_table: String,
    pub page_size: usize,
    pub category_strategy: CategoryStrategy,
    pub field_set: FieldSet,
    pub failure_policy: FailurePolicy,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            user_table: DEFAULT_USER_TABLE.to_string(),
            jurisdiction_table: DEFAULT_JURISDICTION_TABLE.to_string(),
            products_table: DEFAULT_PRODUCTS_TABLE.to_string(),
            page_size: MAX_PAGE_SIZE,
            category_strategy: CategoryStrategy::default(),
            field_set: FieldSet::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// 服務項目的父分類從哪裡來
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStrategy {
    /// 以產品名稱查詢 Master Products 資料表
    #[default]
    Lookup,
    /// 直接採用表單內已帶的 category / subcategory
    Embedded,
    /// 查詢不分子分類的 分類 → 產品 對照
    Flat,
}

/// 管轄區記錄的欄位組合
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSet {
    /// 每個服務項目一筆，含出庭 / 全權代理旗標
    #[default]
    Representation,
    /// 每個服務項目一筆，含訴訟旗標
    Litigation,
    /// 每個管轄區一筆，分類與服務以逗號串接
    Joined,
}

impl FieldSet {
    pub fn is_per_jurisdiction(self) -> bool {
        matches!(self, FieldSet::Joined)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    AbortOnFirst,
    ContinueAndReport,
}

impl FromStr for CategoryStrategy {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lookup" => Ok(Self::Lookup),
            "embedded" => Ok(Self::Embedded),
            "flat" => Ok(Self::Flat),
            other => Err(invalid_choice(
                "category_strategy",
                other,
                "lookup, embedded, flat",
            )),
        }
    }
}

impl FromStr for FieldSet {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "representation" => Ok(Self::Representation),
            "litigation" => Ok(Self::Litigation),
            "joined" => Ok(Self::Joined),
            other => Err(invalid_choice(
                "field_set",
                other,
                "representation, litigation, joined",
            )),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort_on_first" => Ok(Self::AbortOnFirst),
            "continue_and_report" => Ok(Self::ContinueAndReport),
            other => Err(invalid_choice(
                "failure_policy",
                other,
                "abort_on_first, continue_and_report",
            )),
        }
    }
}

fn invalid_choice(field: &str, value: &str, allowed: &str) -> IntakeError {
    IntakeError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: format!("Unsupported value. Valid values: {}", allowed),
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_base_id() -> String {
    DEFAULT_BASE_ID.to_string()
}

impl Validate for IntakeConfig {
    fn validate(&self) -> Result<()> {
        validate_url("airtable.api_url", &self.airtable.api_url)?;
        validate_non_empty_string("airtable.base_id", &self.airtable.base_id)?;
        validate_secret("airtable.token", &self.airtable.token)?;
        if let Some(timeout) = self.airtable.timeout_seconds {
            validate_range("airtable.timeout_seconds", timeout, 1, 900)?;
        }

        let submission = &self.submission;
        validate_non_empty_string("submission.user_table", &submission.user_table)?;
        validate_non_empty_string(
            "submission.jurisdiction_table",
            &submission.jurisdiction_table,
        )?;
        validate_non_empty_string("submission.products_table", &submission.products_table)?;
        validate_range("submission.page_size", submission.page_size, 1, MAX_PAGE_SIZE)?;

        tracing::debug!("✅ Intake configuration validation passed");
        Ok(())
    }
}
