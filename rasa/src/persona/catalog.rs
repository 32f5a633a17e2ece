//! Directory-backed persona lookup.

use super::Persona;
use crate::errors::PersonaError;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// File name of the descriptor inside each persona directory.
pub const PERSONA_FILE_NAME: &str = "persona.yaml";

/// Personas stored as `<apps_dir>/<name>/persona.yaml`.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    apps_dir: PathBuf,
}

impl PersonaCatalog {
    /// Creates a catalog rooted at `apps_dir`.
    #[must_use]
    pub fn new(apps_dir: impl Into<PathBuf>) -> Self {
        Self {
            apps_dir: apps_dir.into(),
        }
    }

    /// The root directory.
    #[must_use]
    pub fn apps_dir(&self) -> &Path {
        &self.apps_dir
    }

    /// Path of the descriptor for `name`.
    #[must_use]
    pub fn persona_path(&self, name: &str) -> PathBuf {
        self.apps_dir.join(name).join(PERSONA_FILE_NAME)
    }

    /// Names of all personas, sorted. A missing root lists nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PersonaError::Io`] when the root exists but cannot be read.
    pub fn list(&self) -> Result<Vec<String>, PersonaError> {
        if !self.apps_dir.is_dir() {
            debug!(apps_dir = %self.apps_dir.display(), "Apps directory does not exist");
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.apps_dir)? {
            let entry = entry?;
            if entry.path().join(PERSONA_FILE_NAME).is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Loads and validates the persona called `name`.
    ///
    /// # Errors
    ///
    /// [`PersonaError::Invalid`] when `name` is not a single directory
    /// name, [`PersonaError::NotFound`] for unknown personas, otherwise as
    /// [`Persona::from_yaml_file`].
    pub fn load(&self, name: &str) -> Result<Persona, PersonaError> {
        if !is_plain_dir_name(name) {
            return Err(PersonaError::invalid(
                name,
                "persona names must be a single directory name inside the apps directory",
            ));
        }
        Persona::from_yaml_file(self.persona_path(name))
    }
}

/// True when `name` is exactly one normal path component.
fn is_plain_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write_persona(root: &Path, dir: &str, name: &str) {
        fs::create_dir_all(root.join(dir)).unwrap();
        fs::write(
            root.join(dir).join(PERSONA_FILE_NAME),
            format!("name: {name}\nframes: [stateless_frame]\n"),
        )
        .unwrap();
    }

    #[test]
    fn test_list_sorted_and_filtered() {
        let root = tempfile::tempdir().unwrap();
        write_persona(root.path(), "zeta", "zeta");
        write_persona(root.path(), "alpha", "alpha");
        fs::create_dir_all(root.path().join("no_descriptor")).unwrap();
        fs::write(root.path().join("stray.txt"), "x").unwrap();

        let catalog = PersonaCatalog::new(root.path());
        assert_eq!(catalog.list().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        let root = tempfile::tempdir().unwrap();
        let catalog = PersonaCatalog::new(root.path().join("absent"));
        assert!(catalog.list().unwrap().is_empty());
    }

    #[test]
    fn test_load() {
        let root = tempfile::tempdir().unwrap();
        write_persona(root.path(), "alpha", "alpha");
        let catalog = PersonaCatalog::new(root.path());

        assert_eq!(catalog.load("alpha").unwrap().name(), "alpha");
        assert!(matches!(
            catalog.load("beta").unwrap_err(),
            PersonaError::NotFound(_)
        ));
    }

    #[test]
    fn test_load_stays_inside_apps_dir() {
        let outer = tempfile::tempdir().unwrap();
        write_persona(outer.path(), "outside", "outside");
        let apps = outer.path().join("apps");
        write_persona(&apps, "alpha", "alpha");
        let catalog = PersonaCatalog::new(&apps);

        for name in ["../outside", "alpha/../../outside", "/etc", "..", ".", "", "alpha/"] {
            assert!(
                matches!(catalog.load(name), Err(PersonaError::Invalid { .. })),
                "{name:?} should be rejected"
            );
        }
        assert_eq!(catalog.load("alpha").unwrap().name(), "alpha");
    }
}
