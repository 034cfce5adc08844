//! The pipeline's output shape.

use serde::{Deserialize, Serialize};

use crate::image::ImageRef;

/// Summary returned when neither source produced anything.
pub const NO_RESULTS_SUMMARY: &str = "No results found.";

/// A rendered chart as PNG bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartImage {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
    /// Tick labels, left to right, when the x values were categorical
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(with = "png_base64")]
    pub png: Vec<u8>,
}

/// Everything one pipeline invocation produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub summary: String,
    pub posts: Vec<String>,
    pub images: Vec<ImageRef>,
    pub graphs: Vec<ChartImage>,
}

impl ResearchResult {
    pub fn no_results() -> Self {
        Self {
            summary: NO_RESULTS_SUMMARY.to_string(),
            ..Default::default()
        }
    }

    pub fn is_no_results(&self) -> bool {
        self.summary == NO_RESULTS_SUMMARY
            && self.posts.is_empty()
            && self.images.is_empty()
            && self.graphs.is_empty()
    }
}

mod png_base64 {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_results() {
        let result = ResearchResult::no_results();
        assert_eq!(result.summary, "No results found.");
        assert!(result.is_no_results());
    }

    #[test]
    fn test_chart_bytes_serialize_as_base64() {
        let chart = ChartImage {
            title: "t".into(),
            x_label: "x".into(),
            y_label: "y".into(),
            width: 1,
            height: 1,
            categories: None,
            png: vec![1, 2, 3],
        };
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["png"], "AQID");
        assert!(json.get("categories").is_none());
        let back: ChartImage = serde_json::from_value(json).unwrap();
        assert_eq!(back.png, vec![1, 2, 3]);
    }
}
