//! Flat records exchanged at every pipeline boundary.
//!
//! Each record serializes to a JSON object whose fields are all strings. The
//! same shape is used for the product catalog, the trend feed, the prompts
//! sent to the model, and the arrays the model sends back.

use serde::{Deserialize, Serialize};

/// Upper bound on matches produced by one pipeline run unless configured otherwise.
pub const DEFAULT_MAX_MATCHES: usize = 10;

/// A catalog product, read once per pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    pub product_description: String,
    pub product_category: String,
}

/// A trending news or social item supplied by trend discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub trend_id: String,
    pub trend_title: String,
    pub trend_description: String,
    pub trend_category: String,
    /// Present only when the discovery source reports volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_volume: Option<String>,
}

/// A model-proposed pairing of one product with one trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub product_name: String,
    pub trend_title: String,
    pub trend_description: String,
    pub similarity_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_without_search_volume_omits_the_field() {
        let trend = TrendRecord {
            trend_id: "7".to_string(),
            trend_title: "World's Largest Pancake Flipped".to_string(),
            trend_description: "Chefs in Amsterdam flip the world's largest pancake.".to_string(),
            trend_category: "Fun".to_string(),
            search_volume: None,
        };
        let json = serde_json::to_string(&trend).expect("serialize");
        assert!(!json.contains("search_volume"));
    }

    #[test]
    fn trend_accepts_search_volume_when_present() {
        let json = r#"{"trend_id":"1","trend_title":"t","trend_description":"d","trend_category":"c","search_volume":"50K+"}"#;
        let trend: TrendRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(trend.search_volume.as_deref(), Some("50K+"));
    }

    #[test]
    fn product_missing_required_field_is_rejected() {
        let json = r#"{"product_id":"1","product_name":"Bananas","product_category":"Produce"}"#;
        let result = serde_json::from_str::<Product>(json);
        assert!(result.is_err(), "missing product_description must not decode");
    }

    #[test]
    fn product_ignores_extra_catalog_columns() {
        let json = r#"{"product_id":"1","product_name":"Bananas","product_description":"Fresh","product_category":"Produce","created_at":"2025-01-01"}"#;
        let product: Product = serde_json::from_str(json).expect("deserialize");
        assert_eq!(product.product_name, "Bananas");
    }

    #[test]
    fn match_requires_similarity_description() {
        let json = r#"{"product_name":"Bananas","trend_title":"t","trend_description":"d"}"#;
        assert!(serde_json::from_str::<Match>(json).is_err());
    }
}
