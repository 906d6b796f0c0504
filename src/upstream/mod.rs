//! Upstream product-catalog lookups.
//!
//! The handler only sees the [`ItemLookup`] trait. [`CatalogClient`] is the
//! production implementation that talks to the regional catalog endpoint;
//! tests substitute their own.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

pub mod client;
pub mod response;
mod signing;

pub use client::CatalogClient;
pub use response::{Image, Item, ItemAttributes, ItemLookupResponse, Items};

/// Failures surfaced from the upstream catalog, passed to clients verbatim.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{code}: {message}")]
    Api { code: String, message: String },

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] quick_xml::de::DeError),

    #[error("cannot sign request: {0}")]
    Signing(String),
}

/// The fixed parameter set of an item lookup.
///
/// Every lookup asks for one item by ASIN with the `Large` response group;
/// only the identifier varies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    item_id: String,
}

impl LookupRequest {
    pub const ID_TYPE: &'static str = "ASIN";
    pub const OPERATION: &'static str = "ItemLookup";
    pub const RESPONSE_GROUP: &'static str = "Large";

    pub fn by_asin(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// The operation parameters as query pairs, unsorted and unencoded.
    pub fn params(&self) -> [(&'static str, &str); 4] {
        [
            ("IdType", Self::ID_TYPE),
            ("ItemId", self.item_id.as_str()),
            ("Operation", Self::OPERATION),
            ("ResponseGroup", Self::RESPONSE_GROUP),
        ]
    }
}

/// Anything that can resolve a [`LookupRequest`].
#[async_trait]
pub trait ItemLookup: Send + Sync {
    async fn item_lookup(&self, request: &LookupRequest)
    -> Result<ItemLookupResponse, UpstreamError>;
}

/// Regional catalog endpoints, keyed by their domain code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Br,
    Ca,
    Cn,
    De,
    Es,
    Fr,
    In,
    It,
    Jp,
    Mx,
    Uk,
    Us,
}

/// Returned when a domain code names no known region.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown region {0:?}")]
pub struct UnknownRegion(pub String);

impl Region {
    /// Host serving the catalog API for this region.
    pub fn host(self) -> &'static str {
        match self {
            Self::Br => "webservices.amazon.com.br",
            Self::Ca => "webservices.amazon.ca",
            Self::Cn => "webservices.amazon.cn",
            Self::De => "webservices.amazon.de",
            Self::Es => "webservices.amazon.es",
            Self::Fr => "webservices.amazon.fr",
            Self::In => "webservices.amazon.in",
            Self::It => "webservices.amazon.it",
            Self::Jp => "webservices.amazon.co.jp",
            Self::Mx => "webservices.amazon.com.mx",
            Self::Uk => "webservices.amazon.co.uk",
            Self::Us => "webservices.amazon.com",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Br => "BR",
            Self::Ca => "CA",
            Self::Cn => "CN",
            Self::De => "DE",
            Self::Es => "ES",
            Self::Fr => "FR",
            Self::In => "IN",
            Self::It => "IT",
            Self::Jp => "JP",
            Self::Mx => "MX",
            Self::Uk => "UK",
            Self::Us => "US",
        }
    }
}

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "BR" => Self::Br,
            "CA" => Self::Ca,
            "CN" => Self::Cn,
            "DE" => Self::De,
            "ES" => Self::Es,
            "FR" => Self::Fr,
            "IN" => Self::In,
            "IT" => Self::It,
            "JP" => Self::Jp,
            "MX" => Self::Mx,
            "UK" | "GB" => Self::Uk,
            "US" => Self::Us,
            _ => return Err(UnknownRegion(s.to_owned())),
        })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_params_are_fixed() {
        let request = LookupRequest::by_asin("B000X");
        assert_eq!(request.item_id(), "B000X");
        assert_eq!(
            request.params(),
            [
                ("IdType", "ASIN"),
                ("ItemId", "B000X"),
                ("Operation", "ItemLookup"),
                ("ResponseGroup", "Large"),
            ]
        );
    }

    #[test]
    fn region_codes_round_trip() {
        for code in ["BR", "CA", "CN", "DE", "ES", "FR", "IN", "IT", "JP", "MX", "UK", "US"] {
            let region: Region = code.parse().unwrap();
            assert_eq!(region.code(), code);
            assert!(region.host().starts_with("webservices.amazon."));
        }
    }

    #[test]
    fn region_parse_is_case_insensitive() {
        assert_eq!("jp".parse::<Region>(), Ok(Region::Jp));
        assert_eq!("gb".parse::<Region>(), Ok(Region::Uk));
        assert_eq!(
            "XX".parse::<Region>(),
            Err(UnknownRegion("XX".to_owned()))
        );
    }
}
