//! Cover projects and their local store

mod model;
mod store;

pub use model::{clean_slug, Launchpad, Page, Project, ProjectMetadata, Sample, PROJECT_FORMAT_VERSION};
pub use store::{ProjectError, ProjectStore, StoredProject, COVER_FILE};
