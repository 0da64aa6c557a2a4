//! Knowledge file loader
//!
//! Extends a [`KnowledgeStore`] from a single YAML/JSON file or from every
//! such file in a directory. Each file is a mapping of categories, the same
//! shape as the built-in document.

use std::path::Path;

use serde_json::{Map, Value};

use crate::{KnowledgeError, KnowledgeStore};

pub struct KnowledgeLoader;

impl KnowledgeLoader {
    /// Load a file or directory into `store`, returning the entries merged
    pub fn load_path(store: &KnowledgeStore, path: &Path) -> Result<usize, KnowledgeError> {
        if path.is_dir() {
            Self::load_directory(store, path)
        } else {
            let count = store.merge(Self::read_file(path)?);
            tracing::info!(file = %path.display(), entries = count, "Loaded knowledge file");
            Ok(count)
        }
    }

    /// Load every YAML/JSON file in `dir`. Unreadable files are logged and skipped.
    pub fn load_directory(store: &KnowledgeStore, dir: &Path) -> Result<usize, KnowledgeError> {
        if !dir.exists() {
            tracing::warn!(path = %dir.display(), "Knowledge directory does not exist");
            return Ok(0);
        }

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| matches!(extension(path), "yaml" | "yml" | "json"))
            .collect();
        paths.sort();

        let mut total = 0;
        for path in paths {
            match Self::read_file(&path) {
                Ok(categories) => {
                    let count = store.merge(categories);
                    tracing::info!(file = %path.display(), entries = count, "Loaded knowledge file");
                    total += count;
                },
                Err(e) => {
                    tracing::error!(
                        file = %path.display(),
                        error = %e,
                        "Failed to load knowledge file"
                    );
                },
            }
        }

        tracing::info!(
            directory = %dir.display(),
            total_entries = total,
            "Knowledge base loading complete"
        );
        Ok(total)
    }

    fn read_file(path: &Path) -> Result<Map<String, Value>, KnowledgeError> {
        let content = std::fs::read_to_string(path)?;

        let value: Value = match extension(path) {
            "json" => serde_json::from_str(&content)
                .map_err(|e| KnowledgeError::Parse(format!("JSON parse error: {}", e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| KnowledgeError::Parse(format!("YAML parse error: {}", e)))?,
            other => {
                return Err(KnowledgeError::InvalidFormat(format!(
                    "Unsupported file type: {}",
                    other
                )))
            },
        };

        match value {
            Value::Object(categories) => Ok(categories),
            _ => Err(KnowledgeError::InvalidFormat(format!(
                "{} is not a mapping of categories",
                path.display()
            ))),
        }
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_directory_merges_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("challenges.yaml"),
            "common_challenges:\n  Long sales cycles:\n    solutions:\n      - Map the buying committee\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("tips.json"),
            r#"{"field_tips": {"demo": "Open with the customer's own data"}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("broken.yaml"), "- just\n- a list\n").unwrap();

        let store = KnowledgeStore::builtin().unwrap();
        let count = KnowledgeLoader::load_directory(&store, dir.path()).unwrap();

        assert_eq!(count, 2);
        assert!(store.solution_for_challenge("Long sales cycles").is_some());
        assert_eq!(store.search("buying committee", None).len(), 1);
        assert!(store.categories().iter().any(|c| c == "field_tips"));
    }

    #[test]
    fn test_load_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extra.yml");
        fs::write(&path, "glossary:\n  - \"ROI: return on investment\"\n").unwrap();

        let store = KnowledgeStore::empty();
        assert_eq!(KnowledgeLoader::load_path(&store, &path).unwrap(), 1);
        assert_eq!(store.search("roi", Some("glossary")).len(), 1);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let store = KnowledgeStore::empty();
        let count =
            KnowledgeLoader::load_directory(&store, Path::new("/nonexistent/knowledge")).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_missing_file_is_error() {
        let store = KnowledgeStore::empty();
        let result = KnowledgeLoader::load_path(&store, Path::new("/nonexistent/extra.yaml"));
        assert!(matches!(result, Err(KnowledgeError::Io(_))));
    }
}
