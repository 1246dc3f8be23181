use crate::config::FieldSet;
use crate::core::category_map::CategorySource;
use crate::domain::model::{JurisdictionPayload, ServiceEntry, UserFields};
use crate::utils::error::Result;
use serde::Serialize;

pub const UNKNOWN_CATEGORY: &str = "Unknown";

pub fn yes_no(flag: bool) -> String {
    let answer = if flag { "Yes" } else { "No" };
    answer.to_string()
}

/// 空字串視為未提供
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// 使用者資料表的欄位
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecordFields {
    #[serde(rename = "First Name", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "Last Name", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "Phone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "Cell Phone", skip_serializing_if = "Option::is_none")]
    pub cell_phone: Option<String>,
    #[serde(rename = "Firm Name", skip_serializing_if = "Option::is_none")]
    pub firm_name: Option<String>,
    #[serde(rename = "Job Title", skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(rename = "Is Attorney")]
    pub is_attorney: String,
    #[serde(rename = "Date Admitted", skip_serializing_if = "Option::is_none")]
    pub date_admitted: Option<String>,
}

impl From<&UserFields> for UserRecordFields {
    fn from(user: &UserFields) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.office_phone.clone(),
            cell_phone: user.cell_phone.clone(),
            firm_name: user.firm_name.clone(),
            job_title: user.job_title.clone(),
            is_attorney: yes_no(user.is_attorney()),
            date_admitted: non_empty(&user.date_admitted),
        }
    }
}

impl UserRecordFields {
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategory {
    pub parent: String,
    pub subcategory: Option<String>,
}

/// 決定服務項目的父分類，找不到時一律為 "Unknown"
pub fn resolve_category(service: &ServiceEntry, source: &CategorySource) -> ResolvedCategory {
    let product = service.product.as_deref();
    match source {
        CategorySource::Embedded => ResolvedCategory {
            parent: non_empty(&service.category).unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
            subcategory: service.subcategory.clone(),
        },
        CategorySource::Tree(tree) => {
            let placement = product.and_then(|p| tree.placement_of(p));
            ResolvedCategory {
                parent: placement
                    .map(|p| p.category.clone())
                    .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
                subcategory: service
                    .subcategory
                    .clone()
                    .or_else(|| placement.map(|p| p.subcategory.clone())),
            }
        }
        CategorySource::Flat(map) => ResolvedCategory {
            parent: product
                .and_then(|p| map.category_of(p))
                .unwrap_or(UNKNOWN_CATEGORY)
                .to_string(),
            subcategory: service.subcategory.clone(),
        },
    }
}

/// 管轄區資料表的欄位
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JurisdictionRecordFields {
    #[serde(rename = "Jurisdiction", skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(rename = "Bar Number", skip_serializing_if = "Option::is_none")]
    pub bar_number: Option<String>,
    #[serde(rename = "Patent License Number", skip_serializing_if = "Option::is_none")]
    pub patent_license: Option<String>,
    #[serde(rename = "Parent Categories")]
    pub parent_category: String,
    #[serde(rename = "Subcategory", skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(rename = "Services", skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(rename = "Linked User")]
    pub linked_user: Vec<String>,
    #[serde(rename = "User")]
    pub user_name: String,
    #[serde(flatten)]
    pub flags: Option<JurisdictionFlags>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JurisdictionFlags {
    Representation {
        #[serde(rename = "Appearance")]
        appearance: String,
        #[serde(rename = "Full Representation")]
        full_representation: String,
        #[serde(rename = "None")]
        none: String,
        #[serde(rename = "Counties Appearance", skip_serializing_if = "Option::is_none")]
        appearance_counties: Option<String>,
        #[serde(
            rename = "Counties Representation",
            skip_serializing_if = "Option::is_none"
        )]
        representation_counties: Option<String>,
    },
    Litigation {
        #[serde(rename = "Does Litigation")]
        does_litigation: String,
    },
}

impl JurisdictionFlags {
    pub fn for_service(
        field_set: FieldSet,
        jurisdiction: &JurisdictionPayload,
        service: &ServiceEntry,
    ) -> Option<Self> {
        match field_set {
            FieldSet::Representation => Some(Self::Representation {
                appearance: yes_no(service.court_appearances.unwrap_or(false)),
                full_representation: yes_no(service.full_representation.unwrap_or(false)),
                none: yes_no(service.none.unwrap_or(false)),
                appearance_counties: non_empty(&service.court_counties),
                representation_counties: non_empty(&service.representation_counties),
            }),
            FieldSet::Litigation => Some(Self::Litigation {
                does_litigation: yes_no(jurisdiction.does_litigation.unwrap_or(false)),
            }),
            // 串接格式不帶服務層級的旗標
            FieldSet::Joined => None,
        }
    }
}

/// 建立一筆管轄區記錄所需的上下文
pub struct JurisdictionRecordInput<'a> {
    pub jurisdiction: &'a JurisdictionPayload,
    pub service: &'a ServiceEntry,
    pub category: ResolvedCategory,
    pub user_id: &'a str,
    pub user_name: &'a str,
    pub field_set: FieldSet,
}

impl JurisdictionRecordFields {
    pub fn build(input: JurisdictionRecordInput<'_>) -> Self {
        let JurisdictionRecordInput {
            jurisdiction,
            service,
            category,
            user_id,
            user_name,
            field_set,
        } = input;

        Self {
            jurisdiction: jurisdiction.jurisdiction.clone(),
            bar_number: jurisdiction.bar_number.clone(),
            patent_license: non_empty(&jurisdiction.patent_license),
            parent_category: category.parent,
            subcategory: category.subcategory,
            service: service.product.clone(),
            linked_user: vec![user_id.to_string()],
            user_name: user_name.to_string(),
            flags: JurisdictionFlags::for_service(field_set, jurisdiction, service),
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// 串接格式：每個管轄區一筆記錄
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedJurisdictionFields {
    #[serde(rename = "Jurisdiction", skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(rename = "Bar Number", skip_serializing_if = "Option::is_none")]
    pub bar_number: Option<String>,
    #[serde(rename = "Patent License Number", skip_serializing_if = "Option::is_none")]
    pub patent_license: Option<String>,
    #[serde(rename = "Parent Categories")]
    pub parent_categories: String,
    #[serde(rename = "Services")]
    pub services: String,
    #[serde(rename = "Linked User")]
    pub linked_user: Vec<String>,
}

impl JoinedJurisdictionFields {
    /// 表單有帶 parentCategories 時直接串接，否則由各服務解析出的分類去重後串接
    pub fn build(jurisdiction: &JurisdictionPayload, source: &CategorySource, user_id: &str) -> Self {
        let parent_categories = match &jurisdiction.parent_categories {
            Some(categories) => categories.join(", "),
            None => {
                let mut parents: Vec<String> = Vec::new();
                for service in jurisdiction.services() {
                    let parent = resolve_category(service, source).parent;
                    if !parents.contains(&parent) {
                        parents.push(parent);
                    }
                }
                parents.join(", ")
            }
        };

        Self {
            jurisdiction: jurisdiction.jurisdiction.clone(),
            bar_number: jurisdiction.bar_number.clone(),
            patent_license: non_empty(&jurisdiction.patent_license),
            parent_categories,
            services: joined_services(jurisdiction),
            linked_user: vec![user_id.to_string()],
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

pub fn joined_services(jurisdiction: &JurisdictionPayload) -> String {
    jurisdiction
        .services()
        .iter()
        .filter_map(|s| s.product.as_deref())
        .collect::<Vec<_>>()
        .join(", ")
}
