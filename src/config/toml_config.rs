use crate::config::IntakeConfig;
use crate::utils::error::{IntakeError, Result};
use regex::Regex;
use std::path::Path;

/// 從 TOML 檔案載入配置
///
/// 檔案格式：
///
/// ```toml
/// [airtable]
/// token = "${AIRTABLE_TOKEN}"
/// base_id = "appHuFySGdecIs6Cq"
///
/// [submission]
/// category_strategy = "lookup"
/// failure_policy = "abort_on_first"
/// ```
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<IntakeConfig> {
    let content = std::fs::read_to_string(&path).map_err(IntakeError::IoError)?;
    from_toml_str(&content)
}

/// 從 TOML 字串解析配置
pub fn from_toml_str(content: &str) -> Result<IntakeConfig> {
    let processed_content = substitute_env_vars(content, |name| std::env::var(name).ok())?;

    toml::from_str(&processed_content).map_err(|e| IntakeError::ConfigValidationError {
        field: "toml_parsing".to_string(),
        message: format!("TOML parsing error: {}", e),
    })
}

/// 替換環境變數 (例如 ${AIRTABLE_TOKEN})，找不到的變數保留原樣
pub fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| IntakeError::ConfigError {
        message: format!("Invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    });

    Ok(result.into_owned())
}
