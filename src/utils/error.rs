use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Request body is missing")]
    MissingBody,

    #[error("Request body could not be decoded: {0}")]
    BodyDecodeError(String),

    #[error("Jurisdiction {jurisdiction} has no services list")]
    MissingServices { jurisdiction: String },

    #[error("Upstream returned {status}: {body}")]
    UpstreamRejected { status: u16, body: String },

    #[error("Failed to fetch category map from Airtable")]
    CategoryFetchFailed,

    #[error("User creation failed")]
    UserCreationFailed,

    #[error("Jurisdiction record creation failed ({jurisdiction} / {product})")]
    JurisdictionCreationFailed {
        jurisdiction: String,
        product: String,
    },

    #[error("{failed} of {attempted} jurisdiction records failed")]
    PartialSubmission { failed: usize, attempted: usize },
}

/// 錯誤分類，用於日誌與 CLI 退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    UpstreamRead,
    UpstreamWrite,
    Configuration,
    Transport,
}

impl IntakeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IntakeError::SerializationError(_)
            | IntakeError::MissingBody
            | IntakeError::BodyDecodeError(_)
            | IntakeError::MissingServices { .. } => ErrorKind::MalformedInput,
            IntakeError::CategoryFetchFailed => ErrorKind::UpstreamRead,
            IntakeError::UserCreationFailed
            | IntakeError::JurisdictionCreationFailed { .. }
            | IntakeError::PartialSubmission { .. }
            | IntakeError::UpstreamRejected { .. } => ErrorKind::UpstreamWrite,
            IntakeError::ConfigError { .. }
            | IntakeError::MissingConfigError { .. }
            | IntakeError::InvalidConfigValueError { .. }
            | IntakeError::ConfigValidationError { .. } => ErrorKind::Configuration,
            IntakeError::ApiError(_) | IntakeError::IoError(_) => ErrorKind::Transport,
        }
    }

    /// 上游服務以非成功狀態碼回應（而非連線層錯誤）
    pub fn is_upstream_rejection(&self) -> bool {
        matches!(self, IntakeError::UpstreamRejected { .. })
    }
}

pub type Result<T> = std::result::Result<T, IntakeError>;
