//! XML shapes of the catalog's `ItemLookup` responses.
//!
//! Only the elements the record needs are declared; everything else in the
//! document is skipped. Every declared element is optional so a sparse item
//! decodes instead of failing.

use serde::Deserialize;

use super::UpstreamError;

/// Root of a successful `ItemLookup` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemLookupResponse {
    #[serde(rename = "Items", default)]
    pub items: Items,
}

impl ItemLookupResponse {
    /// Decodes a response document.
    pub fn from_xml(xml: &str) -> Result<Self, UpstreamError> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    /// Builds a response around already-decoded items.
    pub fn with_items(item: Vec<Item>) -> Self {
        Self {
            items: Items {
                request: None,
                item,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Items {
    #[serde(rename = "Request", default)]
    pub request: Option<RequestInfo>,
    #[serde(rename = "Item", default)]
    pub item: Vec<Item>,
}

impl Items {
    /// Request-level error messages the catalog attached to this result set.
    pub fn error_messages(&self) -> Vec<String> {
        self.request
            .as_ref()
            .and_then(|r| r.errors.as_ref())
            .map(|errors| {
                errors
                    .error
                    .iter()
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestInfo {
    #[serde(rename = "Errors", default)]
    pub errors: Option<Errors>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Errors {
    #[serde(rename = "Error", default)]
    pub error: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// Root of a rejected request (bad signature, throttling, unknown key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Error", default)]
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Item {
    #[serde(rename = "ASIN", default)]
    pub asin: String,
    #[serde(rename = "DetailPageURL", default)]
    pub detail_page_url: String,
    #[serde(rename = "SmallImage", default)]
    pub small_image: Option<Image>,
    #[serde(rename = "MediumImage", default)]
    pub medium_image: Option<Image>,
    #[serde(rename = "LargeImage", default)]
    pub large_image: Option<Image>,
    #[serde(rename = "ItemAttributes", default)]
    pub item_attributes: Option<ItemAttributes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Image {
    #[serde(rename = "URL", default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemAttributes {
    #[serde(rename = "Brand", default)]
    pub brand: String,
    #[serde(rename = "Creator", default)]
    pub creator: Vec<Creator>,
    #[serde(rename = "Manufacturer", default)]
    pub manufacturer: String,
    #[serde(rename = "Publisher", default)]
    pub publisher: String,
    #[serde(rename = "ReleaseDate", default)]
    pub release_date: String,
    #[serde(rename = "Studio", default)]
    pub studio: String,
    #[serde(rename = "Title", default)]
    pub title: String,
}

/// A `<Creator Role="...">name</Creator>` element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Creator {
    #[serde(rename = "@Role", default)]
    pub role: String,
    #[serde(rename = "$text", default)]
    pub name: String,
}
