use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;

use crate::config::ProbeConfig;
use crate::country::Country;
use crate::models::Listing;
use crate::utils::error::ProbeError;

/// Availability of a single SKU as reported by the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuAvailability {
    pub sku_id: String,
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub in_stock: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub sku_availability: Vec<SkuAvailability>,
}

/// Anything able to answer "is this listing in stock right now?".
#[async_trait]
pub trait AvailabilityCheck: Send + Sync {
    async fn check(&self, listing: &Listing) -> Result<bool, ProbeError>;
}

/// Picks the stock status for `variant_id` out of the SKUs the API returned.
///
/// With a single SKU, or no requested variant, the first record wins. With
/// several SKUs and no matching variant the listing is treated as out of stock.
pub fn select_in_stock(skus: &[SkuAvailability], variant_id: &str) -> Result<bool, ProbeError> {
    match skus {
        [] => Err(ProbeError::NoAvailabilityData),
        [only] => Ok(only.in_stock),
        [first, ..] if variant_id.is_empty() => Ok(first.in_stock),
        _ => Ok(skus
            .iter()
            .find(|sku| sku.sku_id == variant_id)
            .is_some_and(|sku| sku.in_stock)),
    }
}

/// HTTP client for the catalog availability endpoint.
pub struct AvailabilityClient {
    client: Client,
    base_url: String,
    locale: String,
}

impl AvailabilityClient {
    pub fn new(config: &ProbeConfig, country: &Country) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(common_headers())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            locale: country.locale().to_string(),
        })
    }

    pub fn endpoint(&self, product_id: &str) -> String {
        format!(
            "{}/api/{}/catalog/availability/{}",
            self.base_url, self.locale, product_id
        )
    }
}

#[async_trait]
impl AvailabilityCheck for AvailabilityClient {
    async fn check(&self, listing: &Listing) -> Result<bool, ProbeError> {
        let product_id = listing.product_id();
        if product_id.is_empty() {
            return Err(ProbeError::InvalidListing);
        }

        let mut request = self.client.get(self.endpoint(&product_id));
        let origin = listing.origin_domain();
        if !origin.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&origin) {
                request = request.header(ORIGIN, value.clone()).header(REFERER, value);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: AvailabilityResponse = serde_json::from_str(&body)?;

        select_in_stock(&parsed.sku_availability, &listing.variant_id())
    }
}

/// Browser-like headers the catalog API expects on every request.
fn common_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9,da;q=0.8"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.45 Safari/537.36 OPR/82.0.4227.23",
        ),
    );

    let extra: [(&'static str, &'static str); 8] = [
        ("sec-ch-ua", r#""Chromium";v="96", "Opera";v="82", ";Not A Brand";v="99""#),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "Linux"),
        ("sec-fetch-site", "same-site"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-dest", "empty"),
        ("dnt", "1"),
        ("authority", "api.louisvuitton.com"),
    ];
    for (name, value) in extra {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    headers
}
