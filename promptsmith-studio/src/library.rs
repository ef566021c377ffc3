//! Saved configs: named snapshots of a theme
//!
//! The whole list lives under one store key. Every change is written to the
//! store first and only then applied in memory, so a failed write leaves the
//! library exactly as it was.

use crate::error::LibraryError;
use crate::store::KvStore;
use chrono::{DateTime, Utc};
use promptsmith_config::Config;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Store key holding the saved config list
pub const SAVED_CONFIGS_KEY: &str = "saved-configs";

/// Maximum number of saved configs
pub const MAX_SAVED_CONFIGS: usize = 50;

/// Maximum number of tags per saved config
pub const MAX_TAGS: usize = 5;

/// Current bundle format version
pub const BUNDLE_VERSION: u32 = 1;

type Result<T> = std::result::Result<T, LibraryError>;

/// A named snapshot of a theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedConfig {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub config: Config,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Portable export of the whole library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub configs: Vec<SavedConfig>,
}

/// What to do when an imported name is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStrategy {
    /// Keep the existing config and count the incoming one as skipped
    #[default]
    Skip,
    /// Import under "<name> (N)" with the first free N
    Rename,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

pub struct SnapshotLibrary {
    store: Arc<dyn KvStore>,
    entries: Vec<SavedConfig>,
}

impl SnapshotLibrary {
    /// Load the library from the store (empty when nothing is stored yet)
    pub async fn open(store: Arc<dyn KvStore>) -> Result<Self> {
        let entries = match store.get(SAVED_CONFIGS_KEY).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(LibraryError::Decode)?,
            None => Vec::new(),
        };
        Ok(Self { store, entries })
    }

    pub fn list(&self) -> &[SavedConfig] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SavedConfig> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Case-insensitive lookup by name
    pub fn find_by_name(&self, name: &str) -> Option<&SavedConfig> {
        let wanted = name.trim().to_lowercase();
        self.entries.iter().find(|e| e.name.to_lowercase() == wanted)
    }

    /// Save a copy of `config` under a new name
    pub async fn create(
        &mut self,
        name: &str,
        description: Option<String>,
        tags: Vec<String>,
        config: &Config,
    ) -> Result<SavedConfig> {
        if self.entries.len() >= MAX_SAVED_CONFIGS {
            return Err(LibraryError::Capacity(MAX_SAVED_CONFIGS));
        }
        let name = self.available_name(name, None)?;
        let tags = check_tags(tags)?;

        let now = Utc::now();
        let saved = SavedConfig {
            id: Uuid::new_v4().to_string(),
            name,
            description: description.filter(|d| !d.trim().is_empty()),
            tags,
            config: detached(config),
            created_at: now,
            updated_at: now,
        };

        let mut entries = self.entries.clone();
        entries.push(saved.clone());
        self.commit(entries).await?;
        info!("Saved config '{}' ({})", saved.name, saved.id);
        Ok(saved)
    }

    /// Replace the theme stored in a saved config
    pub async fn update(&mut self, id: &str, config: &Config) -> Result<SavedConfig> {
        self.modify(id, |entry| {
            entry.config = detached(config);
            Ok(())
        })
        .await
    }

    /// Replace description and tags
    pub async fn set_details(
        &mut self,
        id: &str,
        description: Option<String>,
        tags: Vec<String>,
    ) -> Result<SavedConfig> {
        let tags = check_tags(tags)?;
        self.modify(id, |entry| {
            entry.description = description.filter(|d| !d.trim().is_empty());
            entry.tags = tags;
            Ok(())
        })
        .await
    }

    pub async fn rename(&mut self, id: &str, new_name: &str) -> Result<SavedConfig> {
        let name = self.available_name(new_name, Some(id))?;
        self.modify(id, |entry| {
            entry.name = name;
            Ok(())
        })
        .await
    }

    /// Copy a saved config under the next free "(Copy)" / "(Copy N)" name
    pub async fn duplicate(&mut self, id: &str) -> Result<SavedConfig> {
        let original = self
            .get(id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        if self.entries.len() >= MAX_SAVED_CONFIGS {
            return Err(LibraryError::Capacity(MAX_SAVED_CONFIGS));
        }

        let base = copy_base(&original.name);
        let name = std::iter::once(format!("{} (Copy)", base))
            .chain((2..).map(|n| format!("{} (Copy {})", base, n)))
            .find(|candidate| self.find_by_name(candidate).is_none())
            .unwrap_or_default();

        let now = Utc::now();
        let copy = SavedConfig {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: now,
            updated_at: now,
            ..original.clone()
        };

        let mut entries = self.entries.clone();
        entries.push(copy.clone());
        self.commit(entries).await?;
        info!("Duplicated saved config '{}' as '{}'", id, copy.name);
        Ok(copy)
    }

    pub async fn delete(&mut self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            return Err(LibraryError::NotFound(id.to_string()));
        }
        let entries = self.entries.iter().filter(|e| e.id != id).cloned().collect();
        self.commit(entries).await?;
        info!("Deleted saved config {}", id);
        Ok(())
    }

    /// Serialize every saved config into a bundle document
    pub fn export_bundle(&self) -> Result<String> {
        let bundle = Bundle {
            version: BUNDLE_VERSION,
            exported_at: Utc::now(),
            configs: self.entries.clone(),
        };
        serde_json::to_string_pretty(&bundle).map_err(LibraryError::Encode)
    }

    /// Merge a bundle into the library
    ///
    /// Entries beyond capacity, entries without a name or blocks and (with
    /// [`ConflictStrategy::Skip`]) entries whose name is taken are counted
    /// as skipped. Tags beyond the limit are dropped.
    pub async fn import_bundle(
        &mut self,
        text: &str,
        strategy: ConflictStrategy,
    ) -> Result<ImportReport> {
        let bundle: Bundle = serde_json::from_str(text).map_err(LibraryError::Decode)?;
        debug!(
            "Importing bundle v{} with {} config(s)",
            bundle.version,
            bundle.configs.len()
        );

        let mut staged = Self {
            store: Arc::clone(&self.store),
            entries: self.entries.clone(),
        };
        let mut report = ImportReport::default();

        for mut incoming in bundle.configs {
            if staged.entries.len() >= MAX_SAVED_CONFIGS {
                report.skipped += 1;
                continue;
            }
            let name = incoming.name.trim().to_string();
            if name.is_empty() || incoming.config.blocks.is_empty() {
                report.skipped += 1;
                continue;
            }

            incoming.name = if staged.find_by_name(&name).is_none() {
                name
            } else {
                match strategy {
                    ConflictStrategy::Skip => {
                        report.skipped += 1;
                        continue;
                    }
                    ConflictStrategy::Rename => (1..)
                        .map(|n| format!("{} ({})", name, n))
                        .find(|candidate| staged.find_by_name(candidate).is_none())
                        .unwrap_or_default(),
                }
            };
            if incoming.id.is_empty() || staged.get(&incoming.id).is_some() {
                incoming.id = Uuid::new_v4().to_string();
            }
            incoming.tags.truncate(MAX_TAGS);
            incoming.config.clear_ids();

            staged.entries.push(incoming);
            report.imported += 1;
        }

        if report.imported > 0 {
            self.commit(staged.entries).await?;
        }
        info!(
            "Imported {} saved config(s), skipped {}",
            report.imported, report.skipped
        );
        Ok(report)
    }

    async fn modify(
        &mut self,
        id: &str,
        change: impl FnOnce(&mut SavedConfig) -> Result<()>,
    ) -> Result<SavedConfig> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;

        let mut entries = self.entries.clone();
        change(&mut entries[index])?;
        entries[index].updated_at = Utc::now();
        let updated = entries[index].clone();
        self.commit(entries).await?;
        debug!("Updated saved config {}", id);
        Ok(updated)
    }

    /// Persist a new list, then adopt it
    async fn commit(&mut self, entries: Vec<SavedConfig>) -> Result<()> {
        let bytes = serde_json::to_vec(&entries).map_err(LibraryError::Encode)?;
        self.store.set(SAVED_CONFIGS_KEY, bytes).await?;
        self.entries = entries;
        Ok(())
    }

    /// Validate a name and check it is free (ignoring `except_id`)
    fn available_name(&self, name: &str, except_id: Option<&str>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::InvalidName("name cannot be empty".to_string()));
        }
        match self.find_by_name(name) {
            Some(existing) if Some(existing.id.as_str()) != except_id => {
                Err(LibraryError::DuplicateName(name.to_string()))
            }
            _ => Ok(name.to_string()),
        }
    }
}

/// Copy of the document for storage: no live identifiers
fn detached(config: &Config) -> Config {
    let mut config = config.clone();
    config.clear_ids();
    config
}

fn check_tags(tags: Vec<String>) -> Result<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    if cleaned.len() > MAX_TAGS {
        return Err(LibraryError::TagLimit {
            count: cleaned.len(),
            max: MAX_TAGS,
        });
    }
    Ok(cleaned)
}

/// Name without a trailing " (Copy)" or " (Copy N)"
fn copy_base(name: &str) -> &str {
    if let Some(base) = name.strip_suffix(" (Copy)") {
        return base;
    }
    if let Some(rest) = name.strip_suffix(')') {
        if let Some((base, n)) = rest.rsplit_once(" (Copy ") {
            if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) {
                return base;
            }
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use promptsmith_config::defaults::default_config;
    use promptsmith_config::SequentialIds;

    /// Reads from memory, refuses every write
    #[derive(Default)]
    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl KvStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StoreError> {
            self.inner.get(key).await
        }

        async fn set(&self, _key: &str, _value: Vec<u8>) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }

        async fn delete(&self, _key: &str) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }
    }

    async fn library() -> SnapshotLibrary {
        SnapshotLibrary::open(Arc::new(MemoryStore::new())).await.unwrap()
    }

    async fn save(library: &mut SnapshotLibrary, name: &str) -> SavedConfig {
        library
            .create(name, None, Vec::new(), &default_config())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_reopen() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let mut library = SnapshotLibrary::open(Arc::clone(&store)).await.unwrap();
        let saved = library
            .create(
                "  Night Owl ",
                Some("dark".to_string()),
                vec!["dark".into(), " ".into(), "dark".into()],
                &default_config(),
            )
            .await
            .unwrap();
        assert_eq!(saved.name, "Night Owl");
        assert_eq!(saved.tags, ["dark"]);

        let reopened = SnapshotLibrary::open(store).await.unwrap();
        assert_eq!(reopened.list(), library.list());
    }

    #[tokio::test]
    async fn test_stored_config_is_detached() {
        let mut library = library().await;
        let mut live = default_config();
        live.assign_missing_ids(&SequentialIds::new());
        let saved = library.create("Mine", None, Vec::new(), &live).await.unwrap();

        live.blocks[0].segments.clear();
        let stored = &library.get(&saved.id).unwrap().config;
        assert_eq!(stored.blocks[0].segments.len(), 4);
        assert!(stored.blocks[0].id.is_empty());
    }

    #[tokio::test]
    async fn test_names_are_unique_case_insensitively() {
        let mut library = library().await;
        let first = save(&mut library, "Agnoster").await;
        let err = library
            .create("agnoster", None, Vec::new(), &default_config())
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateName(_)));

        // Renaming to itself with different case is fine
        let renamed = library.rename(&first.id, "AGNOSTER").await.unwrap();
        assert_eq!(renamed.name, "AGNOSTER");

        let second = save(&mut library, "Paradox").await;
        assert!(matches!(
            library.rename(&second.id, "agnoster").await,
            Err(LibraryError::DuplicateName(_))
        ));
        assert!(matches!(
            library.rename(&second.id, "   ").await,
            Err(LibraryError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_capacity_enforced() {
        let mut library = library().await;
        for n in 0..MAX_SAVED_CONFIGS {
            save(&mut library, &format!("Theme {}", n)).await;
        }
        let err = library
            .create("One too many", None, Vec::new(), &default_config())
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Capacity(50)));
        assert_eq!(library.len(), 50);

        let first = library.list()[0].id.clone();
        assert!(matches!(
            library.duplicate(&first).await,
            Err(LibraryError::Capacity(_))
        ));
        assert_eq!(library.len(), 50);
    }

    #[tokio::test]
    async fn test_tag_limit() {
        let mut library = library().await;
        let tags = (0..6).map(|n| format!("tag{}", n)).collect();
        let err = library
            .create("Tagged", None, tags, &default_config())
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::TagLimit { count: 6, max: 5 }));
        assert!(library.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_names() {
        let mut library = library().await;
        let original = save(&mut library, "Pure").await;

        let copy = library.duplicate(&original.id).await.unwrap();
        assert_eq!(copy.name, "Pure (Copy)");
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.config, original.config);

        let second = library.duplicate(&original.id).await.unwrap();
        assert_eq!(second.name, "Pure (Copy 2)");

        // Copying a copy keeps counting from the base name
        let third = library.duplicate(&copy.id).await.unwrap();
        assert_eq!(third.name, "Pure (Copy 3)");
    }

    #[tokio::test]
    async fn test_update_and_details() {
        let mut library = library().await;
        let saved = save(&mut library, "Work").await;

        let mut changed = default_config();
        changed.blocks[0].segments.truncate(1);
        let updated = library.update(&saved.id, &changed).await.unwrap();
        assert_eq!(updated.config.blocks[0].segments.len(), 1);
        assert!(updated.updated_at >= saved.updated_at);
        assert_eq!(updated.created_at, saved.created_at);

        let detailed = library
            .set_details(&saved.id, Some("office".to_string()), vec!["work".to_string()])
            .await
            .unwrap();
        assert_eq!(detailed.description.as_deref(), Some("office"));
        assert_eq!(detailed.tags, ["work"]);
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let mut library = library().await;
        assert!(matches!(library.delete("nope").await, Err(LibraryError::NotFound(_))));
        assert!(matches!(library.duplicate("nope").await, Err(LibraryError::NotFound(_))));
        assert!(matches!(
            library.update("nope", &default_config()).await,
            Err(LibraryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_library_unchanged() {
        let store = Arc::new(ReadOnlyStore::default());
        let existing = vec![SavedConfig {
            id: "a".to_string(),
            name: "Existing".to_string(),
            description: None,
            tags: Vec::new(),
            config: default_config(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }];
        store
            .inner
            .set(SAVED_CONFIGS_KEY, serde_json::to_vec(&existing).unwrap())
            .await
            .unwrap();

        let mut library = SnapshotLibrary::open(store).await.unwrap();
        assert!(matches!(
            library.create("New", None, Vec::new(), &default_config()).await,
            Err(LibraryError::Store(_))
        ));
        assert!(library.rename("a", "Renamed").await.is_err());
        assert!(library.delete("a").await.is_err());
        assert_eq!(library.list(), existing.as_slice());
    }

    #[tokio::test]
    async fn test_corrupt_store_is_decode_error() {
        let store = MemoryStore::new();
        store.set(SAVED_CONFIGS_KEY, b"{".to_vec()).await.unwrap();
        assert!(matches!(
            SnapshotLibrary::open(Arc::new(store)).await,
            Err(LibraryError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_bundle_round_trip_with_conflicts() {
        let mut source = library().await;
        save(&mut source, "Alpha").await;
        save(&mut source, "Beta").await;
        let bundle = source.export_bundle().unwrap();

        let mut target = library().await;
        save(&mut target, "alpha").await;

        let mut skipping = library().await;
        save(&mut skipping, "alpha").await;
        let report = skipping
            .import_bundle(&bundle, ConflictStrategy::Skip)
            .await
            .unwrap();
        assert_eq!(report, ImportReport { imported: 1, skipped: 1 });

        let report = target
            .import_bundle(&bundle, ConflictStrategy::Rename)
            .await
            .unwrap();
        assert_eq!(report, ImportReport { imported: 2, skipped: 0 });
        let names: Vec<&str> = target.list().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha", "Alpha (1)", "Beta"]);

        // Importing again renames past the first suffix
        target
            .import_bundle(&bundle, ConflictStrategy::Rename)
            .await
            .unwrap();
        assert!(target.find_by_name("Alpha (2)").is_some());
        assert!(target.find_by_name("Beta (1)").is_some());
    }

    #[tokio::test]
    async fn test_bundle_import_stops_at_capacity() {
        let mut source = library().await;
        for n in 0..3 {
            save(&mut source, &format!("Extra {}", n)).await;
        }
        let bundle = source.export_bundle().unwrap();

        let mut target = library().await;
        for n in 0..MAX_SAVED_CONFIGS - 1 {
            save(&mut target, &format!("Theme {}", n)).await;
        }
        let report = target
            .import_bundle(&bundle, ConflictStrategy::Rename)
            .await
            .unwrap();
        assert_eq!(report, ImportReport { imported: 1, skipped: 2 });
        assert_eq!(target.len(), MAX_SAVED_CONFIGS);
    }

    #[tokio::test]
    async fn test_bundle_import_truncates_tags_and_rejects_garbage() {
        let mut source = library().await;
        let mut entry = save(&mut source, "Tagged").await;
        entry.tags = (0..8).map(|n| format!("t{}", n)).collect();
        let bundle = serde_json::to_string(&Bundle {
            version: BUNDLE_VERSION,
            exported_at: Utc::now(),
            configs: vec![entry],
        })
        .unwrap();

        let mut target = library().await;
        target
            .import_bundle(&bundle, ConflictStrategy::Skip)
            .await
            .unwrap();
        assert_eq!(target.list()[0].tags.len(), MAX_TAGS);

        assert!(matches!(
            target.import_bundle("[]", ConflictStrategy::Skip).await,
            Err(LibraryError::Decode(_))
        ));
    }

    #[test]
    fn test_copy_base() {
        assert_eq!(copy_base("Pure"), "Pure");
        assert_eq!(copy_base("Pure (Copy)"), "Pure");
        assert_eq!(copy_base("Pure (Copy 12)"), "Pure");
        assert_eq!(copy_base("Pure (Copy x)"), "Pure (Copy x)");
    }
}
