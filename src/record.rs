//! The normalized product record and its mapping from catalog responses.

use serde::Serialize;
use thiserror::Error;

use crate::upstream::{Image, Item, ItemLookupResponse};

/// Why a catalog response could not be turned into a [`Record`].
#[derive(Debug, Error)]
pub enum MapError {
    #[error("no item found{}", detail_suffix(.0))]
    NoItems(Vec<String>),
}

fn detail_suffix(messages: &[String]) -> String {
    if messages.is_empty() {
        String::new()
    } else {
        format!(": {}", messages.join("; "))
    }
}

/// One product, flattened. Absent values are empty strings.
///
/// Fields serialize in declaration order under their catalog names
/// (`ASIN`, `Brand`, …, `LargeImage`), which is also the cache format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    #[serde(rename = "ASIN")]
    asin: String,
    brand: String,
    creator: String,
    manufacturer: String,
    publisher: String,
    release_date: String,
    studio: String,
    title: String,
    #[serde(rename = "URL")]
    url: String,
    small_image: String,
    medium_image: String,
    large_image: String,
}

impl Record {
    /// Maps the first item of `response`.
    ///
    /// # Errors
    ///
    /// [`MapError::NoItems`] when the response holds no item; any request
    /// errors the catalog reported are carried along.
    pub fn from_response(response: &ItemLookupResponse) -> Result<Self, MapError> {
        response
            .items
            .item
            .first()
            .map(Self::from_item)
            .ok_or_else(|| MapError::NoItems(response.items.error_messages()))
    }

    /// Maps one item. A missing attribute group or image leaves its fields empty.
    pub fn from_item(item: &Item) -> Self {
        let attrs = item.item_attributes.clone().unwrap_or_default();
        let image_url = |image: &Option<Image>| {
            image
                .as_ref()
                .map(|i| i.url.clone())
                .unwrap_or_default()
        };

        Self {
            asin: item.asin.clone(),
            brand: attrs.brand,
            creator: attrs
                .creator
                .into_iter()
                .next()
                .map(|c| c.name)
                .unwrap_or_default(),
            manufacturer: attrs.manufacturer,
            publisher: attrs.publisher,
            release_date: attrs.release_date,
            studio: attrs.studio,
            title: attrs.title,
            url: item.detail_page_url.clone(),
            small_image: image_url(&item.small_image),
            medium_image: image_url(&item.medium_image),
            large_image: image_url(&item.large_image),
        }
    }

    /// Serializes the record to its JSON wire and cache form.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn asin(&self) -> &str {
        &self.asin
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn release_date(&self) -> &str {
        &self.release_date
    }

    pub fn studio(&self) -> &str {
        &self.studio
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn small_image(&self) -> &str {
        &self.small_image
    }

    pub fn medium_image(&self) -> &str {
        &self.medium_image
    }

    pub fn large_image(&self) -> &str {
        &self.large_image
    }
}
