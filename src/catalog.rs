use std::{collections::HashSet, error, fs, io, path::Path};

use derive_more::Display;

/// An error that occurred while loading the country catalog
#[derive(Debug, Display)]
pub enum CatalogError {
    /// A catalog file could not be read
    #[display("unable to read {path}: {error}")]
    Missing { path: String, error: io::Error },
    /// The translation file is not paired line by line with the names file
    #[display("{names} country names but {translations} translations")]
    LengthMismatch { names: usize, translations: usize },
    /// The same identifier or label appears twice
    #[display("country {_0} is listed more than once")]
    Duplicate(String),
    /// A line that should hold a name is blank
    #[display("line {line} of {path} is empty")]
    EmptyEntry { path: String, line: usize },
}

impl error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            CatalogError::Missing { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// A single country the quiz can ask about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    id: String,
    translation: Option<String>,
}

impl Country {
    pub fn new<S: Into<String>>(id: S, translation: Option<String>) -> Self {
        Country {
            id: id.into(),
            translation,
        }
    }

    /// The canonical name, matching the `NAME` attribute of the geometry.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The name shown on the answer buttons.
    /// Falls back to the canonical name when no translation is known.
    pub fn label(&self) -> &str {
        self.translation.as_deref().unwrap_or(&self.id)
    }
}

/// Reads a catalog file into its lines, rejecting blank ones.
fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>, CatalogError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|error| CatalogError::Missing {
        path: path.to_string_lossy().into_owned(),
        error,
    })?;
    let mut lines = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            return Err(CatalogError::EmptyEntry {
                path: path.to_string_lossy().into_owned(),
                line: i + 1,
            });
        }
        lines.push(line.to_owned());
    }
    Ok(lines)
}

/// The ordered list of countries the game draws from.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    countries: Vec<Country>,
}

impl Catalog {
    /// Loads the catalog from a file of canonical names and, optionally, a
    /// file of translated names paired with it line by line.
    pub fn load<P: AsRef<Path>>(names: P, translations: Option<P>) -> Result<Self, CatalogError> {
        let ids = read_lines(names)?;
        let translations = match translations {
            Some(path) => {
                let t = read_lines(path)?;
                if t.len() != ids.len() {
                    return Err(CatalogError::LengthMismatch {
                        names: ids.len(),
                        translations: t.len(),
                    });
                }
                Some(t)
            }
            None => None,
        };
        let countries = match translations {
            Some(t) => ids
                .into_iter()
                .zip(t)
                .map(|(id, tr)| Country::new(id, Some(tr)))
                .collect(),
            None => ids.into_iter().map(|id| Country::new(id, None)).collect(),
        };
        let catalog = Catalog::from_countries(countries)?;
        log::info!("Loaded {} countries", catalog.len());
        Ok(catalog)
    }

    /// Builds a catalog from already constructed countries.
    /// Both the identifiers and the labels must be unique, since answers are
    /// told apart by their label.
    pub fn from_countries(countries: Vec<Country>) -> Result<Self, CatalogError> {
        let mut ids = HashSet::new();
        let mut labels = HashSet::new();
        for c in countries.iter() {
            if !ids.insert(c.id()) {
                return Err(CatalogError::Duplicate(c.id().to_owned()));
            }
            if !labels.insert(c.label()) {
                return Err(CatalogError::Duplicate(c.label().to_owned()));
            }
        }
        Ok(Catalog { countries })
    }

    /// Drops the translations, so that labels are the canonical names.
    pub fn untranslated(self) -> Self {
        Catalog {
            countries: self
                .countries
                .into_iter()
                .map(|c| Country::new(c.id, None))
                .collect(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.id() == id)
    }

    pub fn get(&self, index: usize) -> Option<&Country> {
        self.countries.get(index)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Country> {
        self.countries.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_names_only() {
        let names = file_with("France\nGermany\nJapan\n");
        let catalog = Catalog::load(names.path(), None).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(1).unwrap().id(), "Germany");
        assert_eq!(catalog.get(1).unwrap().label(), "Germany");
    }

    #[test]
    fn test_load_translations() {
        let names = file_with("France\r\nGermany\r\n");
        let translations = file_with("法国\n德国\n");
        let catalog = Catalog::load(names.path(), Some(translations.path())).unwrap();
        let germany = catalog.find("Germany").unwrap();
        assert_eq!(germany.label(), "德国");
        assert_eq!(catalog.clone().untranslated().find("Germany").unwrap().label(), "Germany");
    }

    #[test]
    fn test_length_mismatch() {
        let names = file_with("France\nGermany\n");
        let translations = file_with("法国\n");
        let err = Catalog::load(names.path(), Some(translations.path())).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::LengthMismatch {
                names: 2,
                translations: 1
            }
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(dir.path().join("nope.txt"), None).unwrap_err();
        assert!(matches!(err, CatalogError::Missing { .. }));
        assert!(error::Error::source(&err).is_some());
    }

    #[test]
    fn test_duplicate() {
        let names = file_with("France\nFrance\n");
        let err = Catalog::load(names.path(), None).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(ref id) if id == "France"));
    }

    #[test]
    fn test_duplicate_translation() {
        let names = file_with("Congo\nDem. Rep. Congo\n");
        let translations = file_with("刚果\n刚果\n");
        let err = Catalog::load(names.path(), Some(translations.path())).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(ref label) if label == "刚果"));
    }

    #[test]
    fn test_blank_line() {
        let names = file_with("France\n\nJapan\n");
        let err = Catalog::load(names.path(), None).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyEntry { line: 2, .. }));
    }
}
