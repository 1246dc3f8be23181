use crate::config::IntakeConfig;
use crate::utils::error::{IntakeError, Result};
use std::env;
use std::str::FromStr;

pub const TOKEN_VAR: &str = "AIRTABLE_TOKEN";

/// 從行程環境變數建立配置（Lambda 冷啟動時呼叫一次）
pub fn from_env() -> Result<IntakeConfig> {
    from_lookup(|key| env::var(key).ok())
}

/// 以任意查詢函式建立配置，方便測試時不必修改行程環境
pub fn from_lookup<F>(lookup: F) -> Result<IntakeConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let mut config = IntakeConfig::default();

    config.airtable.token = get(TOKEN_VAR).ok_or_else(|| IntakeError::MissingConfigError {
        field: TOKEN_VAR.to_string(),
    })?;
    if let Some(api_url) = get("AIRTABLE_API_URL") {
        config.airtable.api_url = api_url;
    }
    if let Some(base_id) = get("AIRTABLE_BASE_ID") {
        config.airtable.base_id = base_id;
    }
    if let Some(timeout) = get("AIRTABLE_TIMEOUT_SECONDS") {
        config.airtable.timeout_seconds = Some(parse_var("AIRTABLE_TIMEOUT_SECONDS", &timeout)?);
    }

    let submission = &mut config.submission;
    if let Some(table) = get("AIRTABLE_USER_TABLE") {
        submission.user_table = table;
    }
    if let Some(table) = get("AIRTABLE_JURISDICTION_TABLE") {
        submission.jurisdiction_table = table;
    }
    if let Some(table) = get("AIRTABLE_PRODUCTS_TABLE") {
        submission.products_table = table;
    }
    if let Some(page_size) = get("AIRTABLE_PAGE_SIZE") {
        submission.page_size = parse_var("AIRTABLE_PAGE_SIZE", &page_size)?;
    }
    if let Some(strategy) = get("INTAKE_CATEGORY_STRATEGY") {
        submission.category_strategy = strategy.parse()?;
    }
    if let Some(field_set) = get("INTAKE_FIELD_SET") {
        submission.field_set = field_set.parse()?;
    }
    if let Some(policy) = get("INTAKE_FAILURE_POLICY") {
        submission.failure_policy = policy.parse()?;
    }

    Ok(config)
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| IntakeError::InvalidConfigValueError {
            field: key.to_string(),
            value: raw.to_string(),
            reason: "Value is not a valid number".to_string(),
        })
}
