//! The uniform result shape returned for every run.
//!
//! ```json
//! {"status": "success", "equations": {...}, "time_domain": {...}, "plots": [...]}
//! {"status": "error", "message": "..."}
//! ```

use indexmap::IndexMap;
use serde::Serialize;

use kirchhoff_core::Artifact;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Report {
    Success {
        /// Transform-domain solution per unknown, as text in `s`.
        equations: IndexMap<String, String>,
        /// Time-domain expression per unknown, or the reason it could not be found.
        time_domain: IndexMap<String, String>,
        plots: Vec<Plot>,
    },
    Error {
        message: String,
    },
}

impl Report {
    pub fn error(message: impl Into<String>) -> Self {
        Report::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Report::Success { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Report::Error { message } => Some(message),
            Report::Success { .. } => None,
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// One entry of the `plots` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Plot {
    Image {
        name: String,
        format: String,
        /// Rendered document; SVG is text, so it is embedded as is.
        image: String,
    },
    Failed {
        name: String,
        error: String,
    },
}

impl Plot {
    pub fn name(&self) -> &str {
        match self {
            Plot::Image { name, .. } | Plot::Failed { name, .. } => name,
        }
    }
}

impl From<Artifact> for Plot {
    fn from(artifact: Artifact) -> Self {
        Plot::Image {
            name: artifact.name,
            format: artifact.format,
            image: String::from_utf8_lossy(&artifact.bytes).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_shape() {
        let json = Report::error("circuit is not connected").to_json(false).unwrap();
        assert_eq!(
            json,
            r#"{"status":"error","message":"circuit is not connected"}"#
        );
    }

    #[test]
    fn test_success_shape_keeps_key_order() {
        let mut equations = IndexMap::new();
        equations.insert("V_V1".to_string(), "10/s".to_string());
        equations.insert("I_V1".to_string(), "-2/(s + 2)".to_string());
        let report = Report::Success {
            time_domain: equations.clone(),
            equations,
            plots: vec![
                Plot::Image {
                    name: "V_V1".to_string(),
                    format: "svg".to_string(),
                    image: "<svg/>".to_string(),
                },
                Plot::Failed {
                    name: "I_V1".to_string(),
                    error: "no samples".to_string(),
                },
            ],
        };
        let text = report.to_json(false).unwrap();
        // Insertion order, not alphabetical.
        assert!(text.find("\"V_V1\"").unwrap() < text.find("\"I_V1\"").unwrap());

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["plots"][0]["format"], "svg");
        assert_eq!(value["plots"][1]["error"], "no samples");
    }
}
