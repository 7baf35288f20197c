//! Device profiles: user-authored name and type overrides
//!
//! Profiles are keyed by raw name and persisted as a JSON array
//! (`[{"raw_name": "...", "name": "...", "type": "..."}]`). The reconciler
//! only ever reads them; writes come from the CLI.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::types::DeviceType;

/// Override record for one controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub raw_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
}

impl DeviceProfile {
    pub fn new(raw_name: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            name: None,
            device_type: None,
        }
    }
}

/// Display name and effective type of a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub device_type: DeviceType,
}

/// Merge a profile over computed defaults.
///
/// Each field takes the override when present, the default otherwise.
pub fn merge_profile(profile: Option<&DeviceProfile>, defaults: Identity) -> Identity {
    let Some(profile) = profile else {
        return defaults;
    };

    Identity {
        name: profile.name.clone().unwrap_or(defaults.name),
        device_type: profile.device_type.unwrap_or(defaults.device_type),
    }
}

/// Read access to persisted profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load all profiles
    async fn load(&self) -> Result<Vec<DeviceProfile>>;
}

/// Profiles stored in a JSON file
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    path: PathBuf,
}

impl JsonProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the whole file with the given profiles
    pub async fn save(&self, profiles: &[DeviceProfile]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create profile directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(profiles).context("Failed to serialize device profiles")?;

        fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write device profiles: {}", self.path.display()))?;

        Ok(())
    }

    /// Insert or update the profile for `profile.raw_name`.
    ///
    /// Fields left `None` keep their stored value.
    pub async fn upsert(&self, profile: DeviceProfile) -> Result<()> {
        let mut profiles = self.load().await?;

        match profiles.iter_mut().find(|p| p.raw_name == profile.raw_name) {
            Some(existing) => {
                if profile.name.is_some() {
                    existing.name = profile.name;
                }
                if profile.device_type.is_some() {
                    existing.device_type = profile.device_type;
                }
            }
            None => profiles.push(profile),
        }

        self.save(&profiles).await
    }
}

#[async_trait]
impl ProfileStore for JsonProfileStore {
    async fn load(&self) -> Result<Vec<DeviceProfile>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!("No profile file at {}, using none", self.path.display());
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read device profiles: {}", self.path.display()))?;

        if json.trim().is_empty() {
            return Ok(Vec::new());
        }

        let profiles: Vec<DeviceProfile> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse device profiles: {}", self.path.display()))?;

        debug!("Loaded {} device profiles", profiles.len());
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> Identity {
        Identity {
            name: "Launchpad Mini".to_string(),
            device_type: DeviceType::LaunchpadMiniMk3,
        }
    }

    #[test]
    fn test_merge_without_profile() {
        assert_eq!(merge_profile(None, defaults()), defaults());
    }

    #[test]
    fn test_merge_name_only() {
        let profile = DeviceProfile {
            name: Some("My Pad".to_string()),
            ..DeviceProfile::new("Launchpad Mini")
        };

        let merged = merge_profile(Some(&profile), defaults());
        assert_eq!(merged.name, "My Pad");
        assert_eq!(merged.device_type, DeviceType::LaunchpadMiniMk3);
    }

    #[test]
    fn test_merge_type_only() {
        let profile = DeviceProfile {
            device_type: Some(DeviceType::LaunchpadX),
            ..DeviceProfile::new("Launchpad Mini")
        };

        let merged = merge_profile(Some(&profile), defaults());
        assert_eq!(merged.name, "Launchpad Mini");
        assert_eq!(merged.device_type, DeviceType::LaunchpadX);
    }

    #[test]
    fn test_profile_json_format() {
        let json = r#"[{"raw_name":"Pad","name":"My Pad"},{"raw_name":"Other","type":"launchpad_pro_mk3"}]"#;
        let profiles: Vec<DeviceProfile> = serde_json::from_str(json).unwrap();

        assert_eq!(profiles[0].name.as_deref(), Some("My Pad"));
        assert_eq!(profiles[0].device_type, None);
        assert_eq!(profiles[1].device_type, Some(DeviceType::LaunchpadProMk3));
    }

    #[tokio::test]
    async fn test_load_missing_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = JsonProfileStore::new(temp_dir.path().join("devices.json"));

        assert!(store.load().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_merges_fields() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = JsonProfileStore::new(temp_dir.path().join("nested").join("devices.json"));

        store
            .upsert(DeviceProfile {
                name: Some("My Pad".to_string()),
                ..DeviceProfile::new("Pad")
            })
            .await?;
        store
            .upsert(DeviceProfile {
                device_type: Some(DeviceType::LaunchpadX),
                ..DeviceProfile::new("Pad")
            })
            .await?;

        let profiles = store.load().await?;
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name.as_deref(), Some("My Pad"));
        assert_eq!(profiles[0].device_type, Some(DeviceType::LaunchpadX));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_invalid_json() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("devices.json");
        std::fs::write(&path, "{not json")?;

        let store = JsonProfileStore::new(path);
        assert!(store.load().await.is_err());
        Ok(())
    }
}
