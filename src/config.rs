use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Knobs for the pattern extractor, usually loaded from a YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Variables that stand for the input size.
    pub size_symbols: Vec<String>,
    /// Treat every procedure parameter as a size symbol too.
    pub params_are_size: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            size_symbols: vec!["n".to_string()],
            params_are_size: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = AnalyzerConfig::from_yaml_str("params_are_size: false\n").expect("valid yaml");
        assert_eq!(config.size_symbols, vec!["n".to_string()]);
        assert!(!config.params_are_size);
    }

    #[test]
    fn reads_size_symbols() {
        let config = AnalyzerConfig::from_yaml_str(indoc! {"
            size_symbols: [n, m, len]
        "})
        .expect("valid yaml");
        assert_eq!(config.size_symbols.len(), 3);
        assert!(config.params_are_size);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = AnalyzerConfig::from_yaml_str("size_symbol: [n]\n").expect_err("unknown key");
        assert!(err.to_string().contains("size_symbol"));
    }
}
