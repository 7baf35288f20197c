//! Cover project data model

use serde::{Deserialize, Serialize};

/// Project format written by this build; imports must carry the same one
pub const PROJECT_FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A cover: launchpads, their pages and the samples those pages trigger.
///
/// Serializes to the `cover.json` layout found at the root of cover archives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub launchpads: Vec<Launchpad>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    #[serde(default)]
    pub authors: Vec<String>,
    /// People who made the launchpad layout (may differ from the song authors)
    #[serde(default)]
    pub launchpadders: Vec<String>,
    /// lpadder version the cover was made with
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Launchpad {
    pub name: String,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

/// Audio file bound to a pad
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
    /// Path of the audio file inside the project archive
    pub file: String,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ProjectMetadata {
                name: name.into(),
                authors: Vec::new(),
                launchpadders: Vec::new(),
                version: PROJECT_FORMAT_VERSION.to_string(),
            },
            launchpads: Vec::new(),
        }
    }

    /// Append a launchpad named "Launchpad N"; returns its index
    pub fn add_launchpad(&mut self) -> usize {
        let index = self.launchpads.len();
        self.launchpads.push(Launchpad {
            name: format!("Launchpad {}", index + 1),
            pages: Vec::new(),
        });
        index
    }

    /// Remove a launchpad with all of its pages
    pub fn remove_launchpad(&mut self, index: usize) -> Option<Launchpad> {
        (index < self.launchpads.len()).then(|| self.launchpads.remove(index))
    }

    /// Append a page named "Page N" to a launchpad; returns its index
    pub fn add_page(&mut self, launchpad: usize) -> Option<usize> {
        let launchpad = self.launchpads.get_mut(launchpad)?;
        let index = launchpad.pages.len();
        launchpad.pages.push(Page {
            name: format!("Page {}", index + 1),
            samples: Vec::new(),
        });
        Some(index)
    }
}

/// Normalize user input into a slug: lowercase, every run of characters
/// outside `[a-z0-9-]` collapsed into one `-`.
pub fn clean_slug(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut in_run = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            slug.push(c);
            in_run = false;
        } else if !in_run {
            slug.push('-');
            in_run = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launchpad_and_page_naming() {
        let mut project = Project::new("Cover");

        assert_eq!(project.add_launchpad(), 0);
        assert_eq!(project.add_launchpad(), 1);
        assert_eq!(project.launchpads[1].name, "Launchpad 2");

        assert_eq!(project.add_page(0), Some(0));
        assert_eq!(project.add_page(0), Some(1));
        assert_eq!(project.launchpads[0].pages[1].name, "Page 2");
        assert_eq!(project.add_page(5), None);
    }

    #[test]
    fn test_remove_launchpad() {
        let mut project = Project::new("Cover");
        project.add_launchpad();
        project.add_launchpad();

        let removed = project.remove_launchpad(0).unwrap();
        assert_eq!(removed.name, "Launchpad 1");
        assert_eq!(project.launchpads.len(), 1);
        assert!(project.remove_launchpad(3).is_none());
    }

    #[test]
    fn test_clean_slug() {
        assert_eq!(clean_slug("Some Amazing Cover"), "some-amazing-cover");
        assert_eq!(clean_slug("a  &  b"), "a-b");
        assert_eq!(clean_slug("already-clean-42"), "already-clean-42");
        assert_eq!(clean_slug("Ünïcode"), "-n-code");
    }

    #[test]
    fn test_parses_cover_json_layout() {
        let json = r#"{
            "metadata": {
                "name": "Old cover",
                "authors": ["Artist"],
                "launchpadders": ["Me"],
                "version": "0.0.1"
            },
            "launchpads": [{"name": "Launchpad 1", "pages": []}]
        }"#;

        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.metadata.name, "Old cover");
        assert_eq!(project.metadata.version, "0.0.1");
        assert_eq!(project.metadata.launchpadders, vec!["Me"]);
        assert_eq!(project.launchpads.len(), 1);
    }

    #[test]
    fn test_metadata_version_is_required() {
        assert!(serde_json::from_str::<Project>(r#"{"metadata":{"name":"No version"}}"#).is_err());
    }
}
