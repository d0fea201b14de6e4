//! Label encoding tables

use crate::ArtifactError;
use std::collections::HashSet;
use std::path::Path;

/// Ordered class-name table bundled with a model.
///
/// Position `i` holds the name of class id `i`. The file format is a JSON
/// array of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Build a table, rejecting empty tables and duplicate names
    pub fn new(classes: Vec<String>) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::InvalidLabels("table has no classes".to_string()));
        }

        let mut seen = HashSet::with_capacity(classes.len());
        for class in &classes {
            if !seen.insert(class.as_str()) {
                return Err(ArtifactError::InvalidLabels(format!("duplicate class '{}'", class)));
            }
        }

        Ok(Self { classes })
    }

    /// Load a table from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ArtifactError::Load(format!("{}: {}", path.display(), e)))?;
        let classes: Vec<String> = serde_json::from_str(&raw)
            .map_err(|e| ArtifactError::InvalidLabels(format!("{}: {}", path.display(), e)))?;
        Self::new(classes)
    }

    /// Name of a class id
    pub fn decode(&self, class_id: usize) -> Option<&str> {
        self.classes.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_decode() {
        let labels = LabelEncoder::new(table(&["apple", "banana", "rice"])).unwrap();
        assert_eq!(labels.decode(0), Some("apple"));
        assert_eq!(labels.decode(2), Some("rice"));
        assert_eq!(labels.decode(3), None);
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert!(LabelEncoder::new(Vec::new()).is_err());
        assert!(LabelEncoder::new(table(&["rice", "maize", "rice"])).is_err());
    }

    #[test]
    fn test_load_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["Sunny", "Rainy", "Cloudy"]"#).unwrap();

        let labels = LabelEncoder::load(file.path()).unwrap();
        assert_eq!(labels.classes(), &table(&["Sunny", "Rainy", "Cloudy"])[..]);
    }

    #[test]
    fn test_load_rejects_non_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"0": "Sunny"}}"#).unwrap();

        assert!(matches!(
            LabelEncoder::load(file.path()),
            Err(ArtifactError::InvalidLabels(_))
        ));
    }
}
