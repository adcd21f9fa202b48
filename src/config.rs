//! Pipeline invocation settings and the per-language configuration file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::ExtractError;
use crate::types::{LanguageCode, Title};

/// Everything one pipeline invocation needs. Validation fails fast, before
/// any stage runs.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// The raw dump the external extraction consumed (checked for existence
    /// so operator mistakes surface here rather than mid-pipeline).
    pub dump_path: PathBuf,
    /// JSON map of language code → per-language settings.
    pub language_file: PathBuf,
    pub language_code: LanguageCode,
    /// Sentence-detection model used by the external extraction.
    pub sentence_model: PathBuf,
    /// Directory holding per-stage outputs and checkpoints.
    pub working_dir: PathBuf,
    /// Directory the finished relations are published into.
    pub final_dir: PathBuf,
}

impl PipelineConfig {
    /// Check paths and create the working directory.
    pub fn validate(&self) -> Result<(), ExtractError> {
        require_readable_file(&self.dump_path, "dump")?;
        require_readable_file(&self.language_file, "language file")?;
        require_readable_file(&self.sentence_model, "sentence model")?;
        if self.language_code.is_empty() {
            return Err(ExtractError::Configuration("language code must not be empty".to_string()));
        }
        fs::create_dir_all(&self.working_dir)?;
        Ok(())
    }
}

fn require_readable_file(path: &Path, what: &str) -> Result<(), ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::Configuration(format!(
            "{what} '{}' is not readable or does not exist",
            path.display()
        )));
    }
    Ok(())
}

/// Per-language settings from the language configuration file.
#[derive(Clone, Debug, Deserialize)]
pub struct LanguageInfo {
    /// Human-readable language name.
    pub name: String,
    /// Title of the category from which page depth is measured (depth 0).
    pub root_category: Title,
}

/// All configured languages, keyed by language code.
#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct LanguageConfig {
    languages: HashMap<LanguageCode, LanguageInfo>,
}

impl LanguageConfig {
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let body = fs::read_to_string(path)?;
        let config: LanguageConfig = serde_json::from_str(&body)?;
        Ok(config)
    }

    pub fn language(&self, code: &str) -> Result<&LanguageInfo, ExtractError> {
        self.languages
            .get(code)
            .ok_or_else(|| ExtractError::UnknownLanguage(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_config_loads_and_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("languages.json");
        fs::write(
            &path,
            r#"{ "en": { "name": "English", "root_category": "Fundamental categories" } }"#,
        )
        .unwrap();

        let config = LanguageConfig::load(&path).unwrap();
        let info = config.language("en").unwrap();
        assert_eq!(info.root_category, "Fundamental categories");
        assert!(matches!(config.language("xx"), Err(ExtractError::UnknownLanguage(_))));
    }

    #[test]
    fn validate_rejects_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("dump.xml");
        fs::write(&existing, "<dump/>").unwrap();

        let config = PipelineConfig {
            dump_path: existing.clone(),
            language_file: dir.path().join("missing.json"),
            language_code: "en".to_string(),
            sentence_model: existing.clone(),
            working_dir: dir.path().join("work"),
            final_dir: dir.path().join("final"),
        };
        assert!(matches!(config.validate(), Err(ExtractError::Configuration(_))));
    }

    #[test]
    fn validate_creates_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("dump.xml");
        fs::write(&existing, "<dump/>").unwrap();
        let lang = dir.path().join("languages.json");
        fs::write(&lang, "{}").unwrap();

        let config = PipelineConfig {
            dump_path: existing.clone(),
            language_file: lang,
            language_code: "en".to_string(),
            sentence_model: existing,
            working_dir: dir.path().join("work"),
            final_dir: dir.path().join("final"),
        };
        config.validate().unwrap();
        assert!(dir.path().join("work").is_dir());
    }
}
