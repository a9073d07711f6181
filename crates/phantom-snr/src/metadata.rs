//! Acquisition metadata passed through to the rendered annotations.

use serde::{Deserialize, Serialize};

/// Placeholder shown for any value that is missing or not computable.
pub const PLACEHOLDER: &str = "n/a";

/// A metadata value as supplied by the acquisition side: numeric or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Number(f64),
    Text(String),
}

impl MetadataValue {
    /// Parse numbers as numbers and keep anything else verbatim.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Number(v),
            _ => Self::Text(raw.to_string()),
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Integral angles print without a trailing ".0".
            Self::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Self::Number(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Sequence name and flip angle of the analyzed acquisition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_angle: Option<MetadataValue>,
}

impl Metadata {
    pub fn new(sequence_name: impl Into<String>, flip_angle: impl Into<MetadataValue>) -> Self {
        Self {
            sequence_name: Some(sequence_name.into()),
            flip_angle: Some(flip_angle.into()),
        }
    }

    /// Sequence name, or [`PLACEHOLDER`].
    pub fn sequence_label(&self) -> String {
        self.sequence_name
            .clone()
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    /// Flip angle, or [`PLACEHOLDER`] when missing or not a finite number.
    pub fn flip_angle_label(&self) -> String {
        match &self.flip_angle {
            Some(MetadataValue::Number(v)) if !v.is_finite() => PLACEHOLDER.to_string(),
            Some(value) => value.to_string(),
            None => PLACEHOLDER.to_string(),
        }
    }

    /// Names of the fields the acquisition side did not supply.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.sequence_name.is_none() {
            missing.push("sequence_name");
        }
        if self.flip_angle.is_none() {
            missing.push("flip_angle");
        }
        missing
    }
}
