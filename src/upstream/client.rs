//! HTTP client for the regional catalog endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::response::{ErrorResponse, ItemLookupResponse};
use super::signing::{self, PATH};
use super::{ItemLookup, LookupRequest, Region, UpstreamError};
use crate::config::UpstreamSettings;

const SERVICE: &str = "AWSECommerceService";
const API_VERSION: &str = "2013-08-01";

/// Signs and sends `ItemLookup` requests over HTTPS.
pub struct CatalogClient {
    http: reqwest::Client,
    access_key: String,
    secret_key: String,
    partner_tag: String,
    region: Region,
}

impl CatalogClient {
    /// Create a client for the configured region and credentials.
    pub fn new(settings: &UpstreamSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_key: settings.access_key.clone(),
            secret_key: settings.secret_key.clone(),
            partner_tag: settings.partner_tag.clone(),
            region: settings.region,
        }
    }

    /// The signed URL for `request` stamped with `timestamp`.
    pub fn signed_url(
        &self,
        request: &LookupRequest,
        timestamp: DateTime<Utc>,
    ) -> Result<String, UpstreamError> {
        let timestamp = timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("Service", SERVICE),
            ("Version", API_VERSION),
            ("AWSAccessKeyId", self.access_key.as_str()),
            ("AssociateTag", self.partner_tag.as_str()),
            ("Timestamp", timestamp.as_str()),
        ];
        params.extend(request.params());

        let host = self.region.host();
        let query = signing::signed_query(host, &self.secret_key, &params)?;
        Ok(format!("https://{host}{PATH}?{query}"))
    }
}

#[async_trait]
impl ItemLookup for CatalogClient {
    async fn item_lookup(
        &self,
        request: &LookupRequest,
    ) -> Result<ItemLookupResponse, UpstreamError> {
        let url = self.signed_url(request, Utc::now())?;
        tracing::debug!(item_id = request.item_id(), region = %self.region, "calling catalog");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(match quick_xml::de::from_str::<ErrorResponse>(&body) {
                Ok(ErrorResponse { error }) if !error.code.is_empty() => UpstreamError::Api {
                    code: error.code,
                    message: error.message,
                },
                _ => UpstreamError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        ItemLookupResponse::from_xml(&body)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn client(region: Region) -> CatalogClient {
        CatalogClient::new(&UpstreamSettings {
            access_key: "AKID".into(),
            secret_key: "secret".into(),
            partner_tag: "tag-22".into(),
            region,
        })
    }

    #[test]
    fn signed_url_carries_every_parameter() {
        let at = Utc.with_ymd_and_hms(2016, 4, 1, 9, 30, 0).unwrap();
        let url = client(Region::Jp)
            .signed_url(&LookupRequest::by_asin("B000X"), at)
            .unwrap();

        assert!(url.starts_with("https://webservices.amazon.co.jp/onca/xml?AWSAccessKeyId=AKID&"));
        for expected in [
            "AssociateTag=tag-22",
            "IdType=ASIN",
            "ItemId=B000X",
            "Operation=ItemLookup",
            "ResponseGroup=Large",
            "Service=AWSECommerceService",
            "Timestamp=2016-04-01T09%3A30%3A00Z",
            "Version=2013-08-01",
            "&Signature=",
        ] {
            assert!(url.contains(expected), "{url} lacks {expected}");
        }
    }

    #[test]
    fn signature_depends_on_region() {
        let at = Utc.with_ymd_and_hms(2016, 4, 1, 9, 30, 0).unwrap();
        let request = LookupRequest::by_asin("B000X");
        let jp = client(Region::Jp).signed_url(&request, at).unwrap();
        let us = client(Region::Us).signed_url(&request, at).unwrap();
        let sig = |url: &str| url.rsplit("Signature=").next().unwrap().to_owned();
        assert_ne!(sig(&jp), sig(&us));
        assert!(us.starts_with("https://webservices.amazon.com/onca/xml?"));
    }
}
