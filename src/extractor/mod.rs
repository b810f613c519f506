//! Rating extraction from review-profile HTML.
//!
//! Sources are tried in priority order, first match wins per field:
//!
//! ```text
//! JSON-LD aggregateRating (top level) → JSON-LD @graph entity → <meta ... ratingValue ... content="x">
//! ```
//!
//! The review count only comes from JSON-LD and defaults to `0`. The trust
//! label is scraped independently from inline markup. Extraction is pure
//! and never fails; the worst case is [`ExtractedRating::default`].

use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

static META_RATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*ratingValue[^>]*content="([\d.]+)""#).expect("valid regex")
});

static TRUST_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"trustScore"[^>]*>([^<]+)<|data-rating-qualifier[^>]*>([^<]+)<"#)
        .expect("valid regex")
});

static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))").expect("valid regex")
});

static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\+?(\d[\d,]*)").expect("valid regex"));

/// Fields recovered from a profile page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRating {
    pub rating: Option<f64>,
    pub review_count: u64,
    pub trust_score: Option<String>,
}

impl ExtractedRating {
    pub fn has_rating(&self) -> bool {
        self.rating.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RatingExtractor;

impl RatingExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, html: &str) -> ExtractedRating {
        let blocks = json_ld_blocks(html);

        let rating = blocks
            .iter()
            .find_map(|block| find_aggregate(block, "ratingValue", parse_float))
            .or_else(|| meta_rating(html));

        let review_count = blocks
            .iter()
            .find_map(|block| find_aggregate(block, "reviewCount", parse_count))
            .unwrap_or(0);

        ExtractedRating {
            rating,
            review_count,
            trust_score: trust_label(html),
        }
    }
}

/// Parse every `application/ld+json` script in document order, skipping
/// blocks that are not valid JSON.
fn json_ld_blocks(html: &str) -> Vec<Value> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|script| {
            let text = script.text().collect::<String>();
            match serde_json::from_str::<Value>(text.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("Skipping malformed JSON-LD block: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Look up `aggregateRating.<field>` on the block itself, then on the
/// entities of its `@graph` (or of the block when it is a bare array).
fn find_aggregate<T>(block: &Value, field: &str, parse: fn(&Value) -> Option<T>) -> Option<T> {
    let from_entity = |entity: &Value| {
        entity
            .get("aggregateRating")
            .and_then(|aggregate| aggregate.get(field))
            .filter(|value| is_present(value))
            .and_then(parse)
    };

    if let Some(found) = from_entity(block) {
        return Some(found);
    }

    let entities = block
        .get("@graph")
        .and_then(Value::as_array)
        .or_else(|| block.as_array())?;

    entities.iter().find_map(|entity| from_entity(entity))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_float(s),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.is_finite()).map(|f| f as u64)),
        Value::String(s) => {
            let digits = LEADING_INT.captures(s)?.get(1)?.as_str().replace(',', "");
            digits.parse().ok()
        }
        _ => None,
    }
}

fn parse_leading_float(s: &str) -> Option<f64> {
    LEADING_FLOAT.captures(s)?.get(1)?.as_str().parse().ok()
}

fn meta_rating(html: &str) -> Option<f64> {
    META_RATING
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| parse_leading_float(m.as_str()))
        .filter(|f| f.is_finite())
}

fn trust_label(html: &str) -> Option<String> {
    TRUST_LABEL.captures_iter(html).find_map(|caps| {
        let text = caps.get(1).or_else(|| caps.get(2))?.as_str();
        let label = decode_html_entities(text.trim()).trim().to_string();
        (!label.is_empty()).then_some(label)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> ExtractedRating {
        RatingExtractor::new().extract(html)
    }

    #[test]
    fn test_top_level_aggregate_rating() {
        let html = r#"
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "Organization",
                "name": "Example",
                "aggregateRating": {
                    "@type": "AggregateRating",
                    "ratingValue": "4.5",
                    "reviewCount": "1234"
                }
            }
            </script>
        "#;

        let result = extract(html);
        assert_eq!(result.rating, Some(4.5));
        assert_eq!(result.review_count, 1234);
        assert_eq!(result.trust_score, None);
    }

    #[test]
    fn test_graph_second_entity() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@graph": [
                    {"@type": "Organization", "name": "Parent"},
                    {
                        "@type": "LocalBusiness",
                        "name": "Trustpilot",
                        "aggregateRating": {
                            "@type": "AggregateRating",
                            "ratingValue": "4.4",
                            "reviewCount": "460242"
                        }
                    }
                ]
            }
            </script>
            </head><body></body></html>
        "#;

        let result = extract(html);
        assert_eq!(result.rating, Some(4.4));
        assert_eq!(result.review_count, 460242);
    }

    #[test]
    fn test_no_markers() {
        let result = extract("<html><body>No reviews</body></html>");
        assert_eq!(result, ExtractedRating::default());
        assert!(!result.has_rating());
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert_eq!(extract(""), ExtractedRating::default());
        assert_eq!(extract("<<<>>>\u{0}"), ExtractedRating::default());
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let html = r#"
            <script type="application/ld+json">{ "aggregateRating": { oops </script>
            <script type="application/ld+json">
                {"aggregateRating": {"ratingValue": "3.9", "reviewCount": "12"}}
            </script>
        "#;

        let result = extract(html);
        assert_eq!(result.rating, Some(3.9));
        assert_eq!(result.review_count, 12);
    }

    #[test]
    fn test_first_block_in_document_order_wins() {
        let html = r#"
            <script type="application/ld+json">{"aggregateRating": {"ratingValue": 2.1, "reviewCount": 7}}</script>
            <script type="application/ld+json">{"aggregateRating": {"ratingValue": 4.9, "reviewCount": 900}}</script>
        "#;

        let result = extract(html);
        assert_eq!(result.rating, Some(2.1));
        assert_eq!(result.review_count, 7);
    }

    #[test]
    fn test_top_level_beats_graph_within_block() {
        let html = r#"
            <script type="application/ld+json">
            {
                "aggregateRating": {"ratingValue": "3.0"},
                "@graph": [{"aggregateRating": {"ratingValue": "5.0"}}]
            }
            </script>
        "#;

        assert_eq!(extract(html).rating, Some(3.0));
    }

    #[test]
    fn test_fields_resolve_independently() {
        // Rating from the first block, review count only present in the second.
        let html = r#"
            <script type="application/ld+json">{"aggregateRating": {"ratingValue": "4.0"}}</script>
            <script type="application/ld+json">{"@graph": [{"aggregateRating": {"reviewCount": "55"}}]}</script>
        "#;

        let result = extract(html);
        assert_eq!(result.rating, Some(4.0));
        assert_eq!(result.review_count, 55);
    }

    #[test]
    fn test_top_level_array_block() {
        let html = r#"
            <script type="application/ld+json">
            [{"@type": "WebPage"}, {"aggregateRating": {"ratingValue": "4.2", "reviewCount": 10}}]
            </script>
        "#;

        let result = extract(html);
        assert_eq!(result.rating, Some(4.2));
        assert_eq!(result.review_count, 10);
    }

    #[test]
    fn test_meta_tag_fallback() {
        let html = r#"
            <html><head>
            <meta itemprop="ratingValue" content="3.7">
            </head></html>
        "#;

        let result = extract(html);
        assert_eq!(result.rating, Some(3.7));
        assert_eq!(result.review_count, 0);
    }

    #[test]
    fn test_meta_tag_ignored_when_json_ld_present() {
        let html = r#"
            <meta itemprop="ratingValue" content="1.5">
            <script type="application/ld+json">{"aggregateRating": {"ratingValue": "4.8"}}</script>
        "#;

        assert_eq!(extract(html).rating, Some(4.8));
    }

    #[test]
    fn test_empty_rating_value_falls_through() {
        let html = r#"
            <script type="application/ld+json">{"aggregateRating": {"ratingValue": ""}}</script>
            <meta property="ratingValue" content="2.5">
        "#;

        assert_eq!(extract(html).rating, Some(2.5));
    }

    #[test]
    fn test_review_count_with_separators() {
        let html = r#"
            <script type="application/ld+json">{"aggregateRating": {"ratingValue": "4.1", "reviewCount": "12,345"}}</script>
        "#;

        assert_eq!(extract(html).review_count, 12345);
    }

    #[test]
    fn test_trust_label_from_qualifier() {
        let html = r#"<p data-rating-qualifier="true" class="x"> Excellent </p>"#;
        assert_eq!(extract(html).trust_score.as_deref(), Some("Excellent"));
    }

    #[test]
    fn test_trust_label_from_trust_score_marker() {
        let html = r#"<span data-testid="trustScore" class="label">Great</span>"#;
        assert_eq!(extract(html).trust_score.as_deref(), Some("Great"));
    }

    #[test]
    fn test_trust_label_skips_blank_matches() {
        let html = r#"
            <span data-rating-qualifier>   </span>
            <span data-rating-qualifier>Average</span>
        "#;
        assert_eq!(extract(html).trust_score.as_deref(), Some("Average"));
    }

    #[test]
    fn test_trust_label_decodes_entities() {
        let html = r#"<span data-rating-qualifier>Bad &amp; Worse</span>"#;
        assert_eq!(extract(html).trust_score.as_deref(), Some("Bad & Worse"));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_leading_float("4.5 stars"), Some(4.5));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_count(&Value::from("460242")), Some(460242));
        assert_eq!(parse_count(&Value::from(-3)), None);
        assert_eq!(parse_count(&Value::from(12.9)), Some(12));
    }
}
