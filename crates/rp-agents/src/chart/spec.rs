//! Chart descriptions returned by the LLM, and their validation.

use std::str::FromStr;

use serde::Deserialize;

use rp_core::StageError;

const DEFAULT_TITLE: &str = "Generated Graph";
const DEFAULT_X_LABEL: &str = "X-axis";
const DEFAULT_Y_LABEL: &str = "Y-axis";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Scatter,
}

impl FromStr for ChartKind {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(Self::Line),
            "bar" => Ok(Self::Bar),
            "scatter" => Ok(Self::Scatter),
            other => Err(StageError::validation(format!(
                "Unsupported graph type: {}",
                other
            ))),
        }
    }
}

/// A data point as the model wrote it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum ChartValue {
    Number(f64),
    Text(String),
}

impl ChartValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            ChartValue::Number(n) => Some(*n),
            ChartValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawChartSpec {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    x_label: Option<String>,
    #[serde(default)]
    y_label: Option<String>,
    #[serde(default)]
    x_data: Vec<ChartValue>,
    #[serde(default)]
    y_data: Vec<ChartValue>,
    #[serde(default, alias = "type")]
    kind: Option<String>,
}

/// A validated chart ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
    /// Numeric x positions; categorical x values map to their index
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Tick labels when x was categorical
    pub categories: Option<Vec<String>>,
}

impl ChartSpec {
    /// Parse and validate a chart description from an LLM answer.
    ///
    /// The answer may wrap the JSON object in prose or a code fence.
    pub fn parse(text: &str) -> Result<Self, StageError> {
        let json = extract_json_object(text)
            .ok_or_else(|| StageError::parse("No JSON object in chart description"))?;
        let raw: RawChartSpec = serde_json::from_str(json)
            .map_err(|e| StageError::parse(format!("Invalid chart description: {}", e)))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawChartSpec) -> Result<Self, StageError> {
        let kind = match non_blank(raw.kind) {
            Some(kind) => kind.parse()?,
            None => ChartKind::default(),
        };

        if raw.x_data.is_empty() || raw.y_data.is_empty() {
            return Err(StageError::validation("Chart data is empty"));
        }
        if raw.x_data.len() != raw.y_data.len() {
            return Err(StageError::validation(format!(
                "x_data has {} values but y_data has {}",
                raw.x_data.len(),
                raw.y_data.len()
            )));
        }

        let y = raw
            .y_data
            .iter()
            .map(|v| {
                v.as_number()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| StageError::validation("y_data must be numeric"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let numeric_x: Option<Vec<f64>> = raw
            .x_data
            .iter()
            .map(|v| v.as_number().filter(|n| n.is_finite()))
            .collect();
        let (x, categories) = match numeric_x {
            Some(x) if kind != ChartKind::Bar || all_numbers(&raw.x_data) => (x, None),
            _ => {
                let labels = raw
                    .x_data
                    .iter()
                    .map(|v| match v {
                        ChartValue::Number(n) => n.to_string(),
                        ChartValue::Text(s) => s.clone(),
                    })
                    .collect::<Vec<_>>();
                ((0..labels.len()).map(|i| i as f64).collect(), Some(labels))
            }
        };

        Ok(Self {
            title: non_blank(raw.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            x_label: non_blank(raw.x_label).unwrap_or_else(|| DEFAULT_X_LABEL.to_string()),
            y_label: non_blank(raw.y_label).unwrap_or_else(|| DEFAULT_Y_LABEL.to_string()),
            kind,
            x,
            y,
            categories,
        })
    }
}

fn all_numbers(values: &[ChartValue]) -> bool {
    values.iter().all(|v| matches!(v, ChartValue::Number(_)))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The slice from the first `{` to the last `}`.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
