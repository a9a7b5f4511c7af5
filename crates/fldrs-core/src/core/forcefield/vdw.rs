use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Van der Waals radii in Angstroms after Tsai et al. (1999), J. Mol. Biol. 290, 253.
static TSAI_1999_RADII: Map<&'static str, f64> = phf_map! {
    "C" => 1.75,
    "N" => 1.64,
    "O" => 1.46,
    "S" => 1.77,
    "H" => 1.10,
};

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },

    #[error("Invalid radius {radius} for element '{element}' in '{path}'")]
    InvalidRadius {
        path: String,
        element: String,
        radius: f64,
    },
}

#[derive(Debug, Deserialize, Clone)]
struct RadiusRecord {
    element: String,
    radius: f64,
}

/// Lookup table of van der Waals radii keyed by element symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct VdwRadii {
    radii: HashMap<String, f64>,
}

impl Default for VdwRadii {
    fn default() -> Self {
        Self::tsai_1999()
    }
}

impl VdwRadii {
    /// The built-in Tsai (1999) table covering C, N, O, S and H.
    pub fn tsai_1999() -> Self {
        let radii = TSAI_1999_RADII
            .entries()
            .map(|(element, radius)| (element.to_string(), *radius))
            .collect();
        Self { radii }
    }

    /// Loads radii from a CSV file with an `element,radius` header.
    pub fn from_csv(path: &Path) -> Result<Self, ParamLoadError> {
        let path_str = path.to_string_lossy().to_string();
        let mut reader = csv::Reader::from_path(path).map_err(|e| ParamLoadError::Csv {
            path: path_str.clone(),
            source: e,
        })?;

        let mut radii = HashMap::new();
        for result in reader.deserialize::<RadiusRecord>() {
            let record = result.map_err(|e| ParamLoadError::Csv {
                path: path_str.clone(),
                source: e,
            })?;
            if !(record.radius.is_finite() && record.radius > 0.0) {
                return Err(ParamLoadError::InvalidRadius {
                    path: path_str,
                    element: record.element,
                    radius: record.radius,
                });
            }
            radii.insert(normalize_element(&record.element), record.radius);
        }
        Ok(Self { radii })
    }

    /// Radius for `element`; symbols are matched after trimming and upper-casing.
    pub fn radius(&self, element: &str) -> Option<f64> {
        self.radii.get(&normalize_element(element)).copied()
    }

    pub fn insert(&mut self, element: &str, radius: f64) {
        self.radii.insert(normalize_element(element), radius);
    }

    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }
}

fn normalize_element(element: &str) -> String {
    element.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn tsai_table_covers_protein_elements() {
        let radii = VdwRadii::tsai_1999();
        assert_eq!(radii.len(), 5);
        assert_eq!(radii.radius("C"), Some(1.75));
        assert_eq!(radii.radius("N"), Some(1.64));
        assert_eq!(radii.radius("O"), Some(1.46));
        assert_eq!(radii.radius("S"), Some(1.77));
        assert_eq!(radii.radius("H"), Some(1.10));
    }

    #[test]
    fn lookup_normalizes_case_and_whitespace() {
        let radii = VdwRadii::default();
        assert_eq!(radii.radius(" c "), Some(1.75));
        assert_eq!(radii.radius("Se"), None);
    }

    #[test]
    fn insert_overrides_existing_entry() {
        let mut radii = VdwRadii::tsai_1999();
        radii.insert("se", 1.9);
        radii.insert("C", 1.7);
        assert_eq!(radii.radius("SE"), Some(1.9));
        assert_eq!(radii.radius("C"), Some(1.7));
    }

    #[test]
    fn from_csv_loads_custom_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("radii.csv");
        fs::write(&path, "element,radius\nC,1.7\nn,1.55\nFE,1.4\n").unwrap();

        let radii = VdwRadii::from_csv(&path).unwrap();

        assert_eq!(radii.len(), 3);
        assert_eq!(radii.radius("N"), Some(1.55));
        assert_eq!(radii.radius("Fe"), Some(1.4));
        assert_eq!(radii.radius("O"), None);
    }

    #[test]
    fn from_csv_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = VdwRadii::from_csv(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(ParamLoadError::Csv { .. })));
    }

    #[test]
    fn from_csv_fails_for_malformed_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "element,radius\nC,not-a-number\n").unwrap();

        assert!(matches!(
            VdwRadii::from_csv(&path),
            Err(ParamLoadError::Csv { .. })
        ));
    }

    #[test]
    fn from_csv_rejects_non_positive_radius() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("zero.csv");
        fs::write(&path, "element,radius\nC,0.0\n").unwrap();

        assert!(matches!(
            VdwRadii::from_csv(&path),
            Err(ParamLoadError::InvalidRadius { .. })
        ));
    }
}
