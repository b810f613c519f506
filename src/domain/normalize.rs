//! Domain normalization: page URL → canonical domain → registrable root.
//!
//! Root-domain collapsing is table driven. It knows the common two-label
//! public suffixes of major country-code domains and nothing else, so a
//! suffix missing from [`MULTI_PART_SUFFIXES`] yields the last two labels
//! (`a.b.gov.example` → `gov.example`). This is an approximation of the
//! public suffix list, not an implementation of it.

use url::Url;

/// Base of the public review-profile URL for a domain.
pub const DEFAULT_PROFILE_BASE: &str = "https://www.trustpilot.com/review";

/// Two-label public suffixes recognised by [`extract_root_domain`].
pub const MULTI_PART_SUFFIXES: &[&str] = &[
    // United Kingdom
    "co.uk", "org.uk", "me.uk", "ac.uk", "gov.uk", "net.uk", "ltd.uk", "plc.uk", "sch.uk",
    // Australia / New Zealand
    "com.au", "net.au", "org.au", "edu.au", "gov.au", "id.au", "co.nz", "net.nz", "org.nz",
    "govt.nz", "ac.nz",
    // Asia
    "co.jp", "ne.jp", "or.jp", "ac.jp", "go.jp", "co.kr", "or.kr", "ne.kr", "co.in", "net.in",
    "org.in", "firm.in", "gen.in", "ind.in", "com.cn", "net.cn", "org.cn", "gov.cn", "com.hk",
    "org.hk", "com.tw", "org.tw", "com.sg", "edu.sg", "com.my", "co.id", "co.th", "com.ph",
    "com.vn", "com.pk",
    // Americas
    "com.br", "net.br", "org.br", "com.mx", "org.mx", "com.ar", "com.co", "com.pe", "com.ve",
    "com.uy",
    // Europe / Middle East / Africa
    "com.tr", "org.tr", "com.ua", "co.il", "org.il", "co.za", "org.za", "com.eg", "com.sa",
    "com.pl", "co.hu", "com.gr", "co.at", "or.at",
];

/// Extract the canonical domain of a page URL.
///
/// Returns `None` for missing input, unparseable URLs and URLs without a
/// host. A single leading `www.` label and the trailing root dot of a
/// fully-qualified host are removed.
pub fn extract_domain(url: Option<&str>) -> Option<String> {
    let url = url?.trim();
    if url.is_empty() {
        return None;
    }

    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_suffix('.').unwrap_or(host);

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Normalize a bare hostname typed by a user or returned by a remote service.
pub fn normalize_domain(input: &str) -> Option<String> {
    let lowered = input.trim().to_ascii_lowercase();
    let domain = lowered.strip_prefix("www.").unwrap_or(&lowered);
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
        return None;
    }

    let valid = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if !valid || domain.contains("..") {
        return None;
    }

    Some(domain.to_string())
}

/// Collapse a hostname to its registrable root domain.
///
/// `blog.example.com` → `example.com`, `shop.example.co.uk` → `example.co.uk`.
/// Idempotent; output is always lowercase.
pub fn extract_root_domain(domain: &str) -> String {
    let lowered = domain.to_ascii_lowercase();
    let lowered = lowered.strip_suffix('.').unwrap_or(&lowered);
    let labels: Vec<&str> = lowered.split('.').collect();

    if labels.len() <= 2 {
        return lowered.to_string();
    }

    let last_two = labels[labels.len() - 2..].join(".");
    if MULTI_PART_SUFFIXES.contains(&last_two.as_str()) {
        return labels[labels.len() - 3..].join(".");
    }

    last_two
}

/// Domain to look up for a page URL, honouring the root-domain preference.
pub fn effective_domain(url: &str, use_root_domain: bool) -> Option<String> {
    let domain = extract_domain(Some(url))?;
    if use_root_domain {
        Some(extract_root_domain(&domain))
    } else {
        Some(domain)
    }
}

/// Review-profile URL for a domain under the public profile base.
pub fn build_canonical_url(domain: &str) -> String {
    build_profile_url(DEFAULT_PROFILE_BASE, domain)
}

pub fn build_profile_url(profile_base: &str, domain: &str) -> String {
    format!("{}/{}", profile_base.trim_end_matches('/'), domain)
}
