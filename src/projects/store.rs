//! Local project store backed by sled
//!
//! Projects are stored as JSON values keyed by slug. Covers travel as zip
//! archives holding a `cover.json` at their root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::model::{clean_slug, Project, PROJECT_FORMAT_VERSION};

/// Project data file inside a cover archive
pub const COVER_FILE: &str = "cover.json";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Invalid slug: '{0}'")]
    InvalidSlug(String),

    #[error("A project with the slug '{0}' already exists")]
    SlugTaken(String),

    #[error("Project was made with lpadder {found}, this build supports {supported}")]
    UnsupportedVersion { found: String, supported: String },

    #[error("Archive has no cover.json at its root")]
    MissingCoverFile,

    #[error("Project '{0}' not found")]
    NotFound(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A project as persisted, with its slug and last save time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProject {
    pub slug: String,
    pub data: Project,
    pub saved_at: DateTime<Utc>,
}

pub struct ProjectStore {
    db: sled::Db,
}

impl ProjectStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let db = sled::open(path.as_ref())?;
        info!("Project store opened at: {}", path.as_ref().display());
        Ok(Self { db })
    }

    /// All projects, ordered by slug
    pub fn get_projects(&self) -> Result<BTreeMap<String, StoredProject>, ProjectError> {
        let mut projects = BTreeMap::new();

        for entry in self.db.iter() {
            let (key, value) = entry?;
            match serde_json::from_slice::<StoredProject>(&value) {
                Ok(project) => {
                    projects.insert(project.slug.clone(), project);
                }
                Err(e) => {
                    warn!("Skipping unreadable project '{}': {}", String::from_utf8_lossy(&key), e);
                }
            }
        }

        Ok(projects)
    }

    pub fn get_project(&self, slug: &str) -> Result<Option<StoredProject>, ProjectError> {
        match self.db.get(slug.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Insert or overwrite the project stored under `slug`
    pub fn set_project(&self, slug: &str, project: Project) -> Result<StoredProject, ProjectError> {
        let stored = StoredProject {
            slug: slug.to_string(),
            data: project,
            saved_at: Utc::now(),
        };

        let json = serde_json::to_vec(&stored)?;
        self.db.insert(slug.as_bytes(), json)?;
        self.db.flush()?;

        debug!("Project '{}' saved", slug);
        Ok(stored)
    }

    pub fn delete_project(&self, slug: &str) -> Result<bool, ProjectError> {
        let removed = self.db.remove(slug.as_bytes())?.is_some();
        self.db.flush()?;
        Ok(removed)
    }

    /// Store an imported project under a fresh slug.
    ///
    /// The slug is normalized first. Importing never overwrites an existing
    /// project and refuses covers made with another lpadder version.
    pub fn import_project(&self, slug: &str, project: Project) -> Result<StoredProject, ProjectError> {
        let slug = clean_slug(slug);
        if slug.trim_matches('-').is_empty() {
            return Err(ProjectError::InvalidSlug(slug));
        }

        if project.metadata.version != PROJECT_FORMAT_VERSION {
            return Err(ProjectError::UnsupportedVersion {
                found: project.metadata.version,
                supported: PROJECT_FORMAT_VERSION.to_string(),
            });
        }

        if self.db.contains_key(slug.as_bytes())? {
            return Err(ProjectError::SlugTaken(slug));
        }

        info!("Importing project '{}' as '{}'", project.metadata.name, slug);
        self.set_project(&slug, project)
    }

    /// Import a cover archive (zip bytes) under `slug`
    pub fn import_zip(&self, slug: &str, bytes: &[u8]) -> Result<StoredProject, ProjectError> {
        let project = read_cover(bytes)?;
        self.import_project(slug, project)
    }

    /// Export a stored project as a cover archive
    pub fn export_zip(&self, slug: &str) -> Result<Vec<u8>, ProjectError> {
        let stored = self
            .get_project(slug)?
            .ok_or_else(|| ProjectError::NotFound(slug.to_string()))?;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(COVER_FILE, zip::write::SimpleFileOptions::default())?;
        writer.write_all(&serde_json::to_vec_pretty(&stored.data)?)?;
        let bytes = writer.finish()?.into_inner();

        debug!("Project '{}' exported ({} bytes)", slug, bytes.len());
        Ok(bytes)
    }
}

/// Parse the `cover.json` of a cover archive
fn read_cover(bytes: &[u8]) -> Result<Project, ProjectError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    let mut file = match archive.by_name(COVER_FILE) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Err(ProjectError::MissingCoverFile),
        Err(e) => return Err(e.into()),
    };

    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_store() -> (tempfile::TempDir, ProjectStore) {
        let temp = tempdir().unwrap();
        let store = ProjectStore::open(temp.path().join("projects")).unwrap();
        (temp, store)
    }

    #[test]
    fn test_set_and_get_project() {
        let (_temp, store) = open_store();

        let mut project = Project::new("My cover");
        project.add_launchpad();
        store.set_project("my-cover", project.clone()).unwrap();

        let loaded = store.get_project("my-cover").unwrap().unwrap();
        assert_eq!(loaded.data, project);
        assert!(store.get_project("missing").unwrap().is_none());
    }

    #[test]
    fn test_get_projects_ordered_by_slug() {
        let (_temp, store) = open_store();
        store.set_project("zeta", Project::new("Z")).unwrap();
        store.set_project("alpha", Project::new("A")).unwrap();

        let slugs: Vec<String> = store.get_projects().unwrap().into_keys().collect();
        assert_eq!(slugs, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_import_cleans_slug_and_refuses_duplicates() {
        let (_temp, store) = open_store();

        let stored = store.import_project("Some Amazing Cover", Project::new("Cover")).unwrap();
        assert_eq!(stored.slug, "some-amazing-cover");

        let err = store.import_project("some amazing cover", Project::new("Other")).unwrap_err();
        assert!(matches!(err, ProjectError::SlugTaken(slug) if slug == "some-amazing-cover"));
    }

    #[test]
    fn test_import_rejects_bad_slug_and_newer_versions() {
        let (_temp, store) = open_store();

        assert!(matches!(
            store.import_project("  !! ", Project::new("Cover")),
            Err(ProjectError::InvalidSlug(_))
        ));

        let mut other = Project::new("Other");
        other.metadata.version = "0.0.0-other".to_string();
        assert!(matches!(
            store.import_project("other", other),
            Err(ProjectError::UnsupportedVersion { .. })
        ));
        assert!(store.get_projects().unwrap().is_empty());
    }

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, zip::write::SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_export_then_import_zip() {
        let (_temp, store) = open_store();

        let mut project = Project::new("Cover");
        project.add_launchpad();
        store.set_project("cover", project.clone()).unwrap();

        let bytes = store.export_zip("cover").unwrap();
        let imported = store.import_zip("Cover Copy", &bytes).unwrap();

        assert_eq!(imported.slug, "cover-copy");
        assert_eq!(imported.data, project);
    }

    #[test]
    fn test_import_zip_without_cover_file() {
        let (_temp, store) = open_store();
        let bytes = zip_with(&[("samples/kick.wav", &b"RIFF"[..])]);

        assert!(matches!(
            store.import_zip("cover", &bytes),
            Err(ProjectError::MissingCoverFile)
        ));
        assert!(store.get_projects().unwrap().is_empty());
    }

    #[test]
    fn test_import_zip_with_other_version() {
        let (_temp, store) = open_store();
        let cover = br#"{"metadata":{"name":"Old","authors":[],"launchpadders":[],"version":"0.0.1"},"launchpads":[]}"#;
        let bytes = zip_with(&[(COVER_FILE, &cover[..])]);

        match store.import_zip("old", &bytes) {
            Err(ProjectError::UnsupportedVersion { found, supported }) => {
                assert_eq!(found, "0.0.1");
                assert_eq!(supported, PROJECT_FORMAT_VERSION);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_import_zip_rejects_garbage() {
        let (_temp, store) = open_store();
        assert!(matches!(
            store.import_zip("cover", b"not a zip"),
            Err(ProjectError::Archive(_))
        ));
        assert!(matches!(store.export_zip("missing"), Err(ProjectError::NotFound(_))));
    }

    #[test]
    fn test_delete_project() {
        let (_temp, store) = open_store();
        store.set_project("cover", Project::new("Cover")).unwrap();

        assert!(store.delete_project("cover").unwrap());
        assert!(!store.delete_project("cover").unwrap());
    }
}
