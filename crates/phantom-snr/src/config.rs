//! JSON-loadable analysis configuration.

use std::path::Path;

use crate::error::AnalysisError;
use crate::morphology::MorphologyConfig;
use crate::render::RenderConfig;
use crate::segment::SegmentConfig;

/// Top-level configuration for one analysis run.
///
/// Every section falls back to its defaults when omitted from JSON, so a file
/// containing `{"segment": {"threshold": 60}}` only changes the threshold.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Global threshold used to find the phantom.
    pub segment: SegmentConfig,
    /// Structuring element for the signal and noise masks.
    pub morphology: MorphologyConfig,
    /// Overlay colors and text layout.
    pub render: RenderConfig,
}

impl AnalysisConfig {
    /// Load a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.morphology.radius()?;
        if self.render.line_spacing <= 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "line spacing must be positive, got {}",
                self.render.line_spacing
            )));
        }
        if self.render.font_scale == 0 {
            return Err(AnalysisError::InvalidConfig(
                "font scale must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::SnrAnchor;

    #[test]
    fn defaults_match_reference_parameters() {
        let c = AnalysisConfig::default();
        assert_eq!(c.segment.threshold, 80);
        assert_eq!(c.morphology.kernel_size, 3);
        assert_eq!(c.morphology.iterations, 5);
        assert_eq!(c.render.snr_anchor, SnrAnchor::OwnWidth);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let c: AnalysisConfig = serde_json::from_str(
            r#"{"segment":{"threshold":60},"render":{"snr_anchor":"last_noise_line"}}"#,
        )
        .unwrap();
        assert_eq!(c.segment.threshold, 60);
        assert_eq!(c.morphology.iterations, 5);
        assert_eq!(c.render.snr_anchor, SnrAnchor::LastNoiseLine);
        assert_eq!(c.render.margin, 10);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut c = AnalysisConfig::default();
        c.morphology.kernel_size = 4;
        assert!(c.validate().is_err());

        let mut c = AnalysisConfig::default();
        c.render.line_spacing = 0;
        assert!(c.validate().is_err());

        let mut c = AnalysisConfig::default();
        c.render.font_scale = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut c = AnalysisConfig::default();
        c.morphology.iterations = 3;
        std::fs::write(&path, serde_json::to_string_pretty(&c).unwrap()).unwrap();

        let loaded = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded.morphology.iterations, 3);
    }
}
