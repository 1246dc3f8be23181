use crate::config::{CategoryStrategy, SubmissionSettings};
use crate::domain::model::TableRecord;
use crate::domain::ports::RecordStore;
use crate::utils::error::{IntakeError, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const CATEGORY_FIELD: &str = "Category";
pub const SUBCATEGORY_FIELD: &str = "Sub Category";
pub const PRODUCT_FIELD: &str = "Product Name";
pub const UNCATEGORIZED: &str = "Uncategorized";

/// 產品在分類樹中的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPlacement {
    pub category: String,
    pub subcategory: String,
}

/// 分類 → 子分類 → 產品（已去重、已排序）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTree {
    categories: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    products: HashMap<String, ProductPlacement>,
}

impl CategoryTree {
    pub fn from_records(records: &[TableRecord]) -> Self {
        let mut tree = Self::default();

        for record in records {
            let category = text_field(record, CATEGORY_FIELD);
            let product = text_field(record, PRODUCT_FIELD);
            let (Some(category), Some(product)) = (category, product) else {
                continue;
            };
            let subcategory = text_field(record, SUBCATEGORY_FIELD)
                .unwrap_or_else(|| UNCATEGORIZED.to_string());

            let products = tree
                .categories
                .entry(category.clone())
                .or_default()
                .entry(subcategory.clone())
                .or_default();
            if !products.contains(&product) {
                products.push(product.clone());
            }

            // 同一產品出現在多個分類時，以資料表中第一次出現者為準
            tree.products
                .entry(product)
                .or_insert(ProductPlacement {
                    category,
                    subcategory,
                });
        }

        for subcategories in tree.categories.values_mut() {
            for products in subcategories.values_mut() {
                products.sort_by(|a, b| locale_compare(a, b));
            }
        }

        tree
    }

    pub fn category_of(&self, product: &str) -> Option<&str> {
        self.placement_of(product).map(|p| p.category.as_str())
    }

    pub fn placement_of(&self, product: &str) -> Option<&ProductPlacement> {
        self.products.get(product.trim())
    }

    pub fn categories(&self) -> &BTreeMap<String, BTreeMap<String, Vec<String>>> {
        &self.categories
    }

    /// 不重複的產品數
    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// 分類 → 產品，不分子分類、保持資料表順序
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlatCategoryMap {
    categories: BTreeMap<String, Vec<String>>,
    #[serde(skip)]
    products: HashMap<String, String>,
}

impl FlatCategoryMap {
    pub fn from_records(records: &[TableRecord]) -> Self {
        let mut map = Self::default();
        for record in records {
            let (Some(category), Some(product)) = (
                text_field(record, CATEGORY_FIELD),
                text_field(record, PRODUCT_FIELD),
            ) else {
                continue;
            };
            map.products
                .entry(product.clone())
                .or_insert_with(|| category.clone());
            let products = map.categories.entry(category).or_default();
            if !products.contains(&product) {
                products.push(product);
            }
        }
        map
    }

    pub fn products(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// 產品第一次出現時所在的分類
    pub fn category_of(&self, product: &str) -> Option<&str> {
        self.products.get(product.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// 依分類策略準備好的分類資料
#[derive(Debug, Clone, PartialEq)]
pub enum CategorySource {
    /// 直接採用表單內的 category / subcategory，不讀取產品資料表
    Embedded,
    Tree(CategoryTree),
    Flat(FlatCategoryMap),
}

/// 逐頁讀取產品資料表並建立分類對照
pub struct CategoryResolver<'a, S: RecordStore> {
    store: &'a S,
    table: &'a str,
    page_size: usize,
}

impl<'a, S: RecordStore> CategoryResolver<'a, S> {
    pub fn new(store: &'a S, settings: &'a SubmissionSettings) -> Self {
        Self {
            store,
            table: &settings.products_table,
            page_size: settings.page_size,
        }
    }

    /// 依 offset 游標讀完所有頁面；任何非成功回應都會中止
    pub async fn fetch_all(&self) -> Result<Vec<TableRecord>> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .store
                .list_page(self.table, self.page_size, offset.as_deref())
                .await
                .map_err(|e| {
                    if e.is_upstream_rejection() {
                        tracing::error!("❌ Category table fetch rejected: {}", e);
                        IntakeError::CategoryFetchFailed
                    } else {
                        e
                    }
                })?;
            pages += 1;
            records.extend(page.records);

            match page.offset {
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => break,
            }
        }

        tracing::debug!(
            "📂 Fetched {} product records from '{}' in {} page(s)",
            records.len(),
            self.table,
            pages
        );
        Ok(records)
    }

    pub async fn resolve(&self) -> Result<CategoryTree> {
        let records = self.fetch_all().await?;
        let tree = CategoryTree::from_records(&records);
        tracing::info!(
            "📂 Category map built: {} categories, {} products",
            tree.categories().len(),
            tree.product_count()
        );
        Ok(tree)
    }

    pub async fn resolve_flat(&self) -> Result<FlatCategoryMap> {
        let records = self.fetch_all().await?;
        let map = FlatCategoryMap::from_records(&records);
        tracing::info!("📂 Flat category map built: {} categories", map.len());
        Ok(map)
    }

    pub async fn load(&self, strategy: CategoryStrategy) -> Result<CategorySource> {
        match strategy {
            CategoryStrategy::Embedded => Ok(CategorySource::Embedded),
            CategoryStrategy::Lookup => self.resolve().await.map(CategorySource::Tree),
            CategoryStrategy::Flat => self.resolve_flat().await.map(CategorySource::Flat),
        }
    }
}

fn text_field(record: &TableRecord, name: &str) -> Option<String> {
    record
        .fields
        .get(name)
        .and_then(|value| value.as_str())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// 三層比較：去掉重音並忽略大小寫、再比重音、最後小寫排前
fn locale_compare(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| with_accents(a).cmp(&with_accents(b)))
        .then_with(|| b.cmp(a))
}

fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn with_accents(s: &str) -> String {
    s.nfd().flat_map(char::to_lowercase).collect()
}
