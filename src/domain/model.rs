use serde::{Deserialize, Deserializer, Serialize};

/// 表單送出的完整內容
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub user_fields: UserFields,
    /// 只有在 JSON 中是陣列時才採用，其他型別一律視為未提供
    #[serde(default, deserialize_with = "array_or_absent")]
    pub jurisdiction_payloads: Option<Vec<JurisdictionPayload>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub office_phone: Option<String>,
    pub cell_phone: Option<String>,
    pub firm_name: Option<String>,
    pub job_title: Option<String>,
    pub is_attorney: Option<bool>,
    pub date_admitted: Option<String>,
}

impl UserFields {
    pub fn is_attorney(&self) -> bool {
        self.is_attorney.unwrap_or(false)
    }

    /// 寫入管轄區記錄時使用的顯示名稱
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JurisdictionPayload {
    pub jurisdiction: Option<String>,
    pub bar_number: Option<String>,
    pub patent_license: Option<String>,
    /// 每個元素可以是產品名稱字串或完整的服務物件；未提供時為 None
    #[serde(default, deserialize_with = "names_or_entries")]
    pub services: Option<Vec<ServiceEntry>>,
    /// 表單已選好的父分類，串接格式會直接採用
    pub parent_categories: Option<Vec<String>>,
    pub does_litigation: Option<bool>,
}

impl JurisdictionPayload {
    pub fn services(&self) -> &[ServiceEntry] {
        self.services.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.jurisdiction.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub product: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub court_appearances: Option<bool>,
    pub full_representation: Option<bool>,
    pub none: Option<bool>,
    pub court_counties: Option<String>,
    pub representation_counties: Option<String>,
}

impl ServiceEntry {
    pub fn named(product: impl Into<String>) -> Self {
        Self {
            product: Some(product.into()),
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServiceItem {
    Name(String),
    Entry(ServiceEntry),
}

impl From<ServiceItem> for ServiceEntry {
    fn from(item: ServiceItem) -> Self {
        match item {
            ServiceItem::Name(product) => ServiceEntry::named(product),
            ServiceItem::Entry(entry) => entry,
        }
    }
}

/// 遠端資料表中的一筆記錄
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRecord {
    pub id: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// 列表 API 的一頁結果，`offset` 為下一頁的游標
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub records: Vec<TableRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub id: String,
}

fn array_or_absent<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<JurisdictionPayload>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(value @ serde_json::Value::Array(_)) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn names_or_entries<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<ServiceEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<ServiceItem>>::deserialize(deserializer)?;
    Ok(items.map(|items| items.into_iter().map(ServiceEntry::from).collect()))
}
