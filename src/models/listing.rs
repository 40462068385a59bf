use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static PRODUCT_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"nvprod[0-9a-z]*").expect("product id pattern is valid"));

const VENDOR_MARKER: &str = "louisvuitton";
const PRODUCT_PATH_MARKER: &str = "/products/";
const PRODUCT_ID_MARKER: &str = "nvprod";

/// A single product page to monitor, identified by its raw URL.
///
/// Every derived facet is computed on demand and never fails: an empty string
/// means "not present" (or "listing invalid").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Listing {
    pub reference: String,
}

impl Listing {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    /// True if the reference points at the vendor over https and looks like a
    /// product page: either a non-empty segment after `/products/`, or an
    /// `nvprod` identifier anywhere in the URL.
    pub fn is_valid(&self) -> bool {
        let r = self.reference.as_str();
        if r.is_empty() || !r.starts_with("https://") || !r.contains(VENDOR_MARKER) {
            return false;
        }
        has_product_segment(r) || r.contains(PRODUCT_ID_MARKER)
    }

    /// Scheme and host of the listing, e.g. `https://en.louisvuitton.com`.
    pub fn origin_domain(&self) -> String {
        if !self.is_valid() {
            return String::new();
        }
        match Url::parse(&self.reference) {
            Ok(url) => match url.host_str() {
                Some(host) => format!("{}://{}", url.scheme(), host),
                None => String::new(),
            },
            Err(_) => String::new(),
        }
    }

    /// Stable catalog key of the listing.
    ///
    /// Example: `.../products/ecorce-rousse-perfumed-candle-nvprod1910068v` yields
    /// `nvprod1910068v`, and `.../products/pochette-accessoires-monogram-005656`
    /// falls back to the last hyphen-delimited field, `005656`.
    pub fn product_id(&self) -> String {
        if !self.is_valid() {
            return String::new();
        }
        if let Some(found) = PRODUCT_ID_REGEX.find(&self.reference) {
            return found.as_str().to_string();
        }

        let Ok(url) = Url::parse(&self.reference) else {
            return String::new();
        };
        let Some(segments) = url.path_segments() else {
            return String::new();
        };
        let segments: Vec<&str> = segments.collect();
        segments
            .windows(2)
            .find(|pair| pair[0] == "products" && pair[1].contains('-'))
            .and_then(|pair| pair[1].rsplit('-').next())
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Variant ("SKU") selector taken from the URL fragment, e.g. `#1A9JN8`.
    pub fn variant_id(&self) -> String {
        if !self.is_valid() {
            return String::new();
        }
        let mut parts = self.reference.split('#');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(fragment), None) => fragment.trim().to_string(),
            _ => String::new(),
        }
    }
}

fn has_product_segment(reference: &str) -> bool {
    reference
        .split_once(PRODUCT_PATH_MARKER)
        .map(|(_, rest)| {
            rest.split(['/', '?', '#'])
                .next()
                .is_some_and(|segment| !segment.trim().is_empty())
        })
        .unwrap_or(false)
}
