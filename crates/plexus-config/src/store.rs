use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use sha2::{Digest, Sha256};

use crate::error::ConfigError;
use crate::events::{ConfigChangeEvent, EventHub};
use crate::snapshot::ConfigSnapshot;
use crate::types::ConfigDocument;
use crate::validate;

pub struct ReplaceOptions {
    pub validate: bool,
    pub reload: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self { validate: true, reload: true }
    }
}

pub struct ReplaceOutcome {
    pub checksum: String,
    pub swapped: bool,
}

/// Holds the current `ConfigSnapshot` behind a read-mostly `ArcSwap` and
/// serializes writers through an internal mutex so at most one `replace` runs
/// at a time; readers never block and never observe a torn snapshot.
pub struct ConfigStore {
    path: PathBuf,
    current: ArcSwap<ConfigSnapshot>,
    last_document: tokio::sync::Mutex<ConfigDocument>,
    write_lock: tokio::sync::Mutex<()>,
    hub: EventHub,
}

impl ConfigStore {
    pub fn new(path: PathBuf, doc: ConfigDocument) -> Result<Self, ConfigError> {
        validate::validate(&doc)?;
        let checksum = checksum_of(&doc)?;
        let snapshot = ConfigSnapshot::from_document(doc.clone(), 1, checksum);
        Ok(Self {
            path,
            current: ArcSwap::from_pointee(snapshot),
            last_document: tokio::sync::Mutex::new(doc),
            write_lock: tokio::sync::Mutex::new(()),
            hub: EventHub::default(),
        })
    }

    /// A read-mostly handle to the current snapshot. Holding this handle
    /// across a whole request guarantees no torn reads even if `replace`
    /// runs concurrently.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    pub fn events(&self) -> &EventHub {
        &self.hub
    }

    /// Re-serializes the currently loaded document back to YAML, for the
    /// admin config-read endpoint. Locks the same mutex `replace` writes
    /// under, so a concurrent reload can't be observed half-applied.
    pub async fn current_yaml(&self) -> Result<String, ConfigError> {
        let doc = self.last_document.lock().await;
        serde_yaml::to_string(&*doc).map_err(ConfigError::from)
    }

    /// Parses, validates, (optionally) writes `new_yaml` atomically to disk,
    /// and (optionally) swaps it in as the live snapshot.
    pub async fn replace(
        &self,
        new_yaml: &str,
        opts: ReplaceOptions,
    ) -> Result<ReplaceOutcome, ConfigError> {
        let _write_guard = self.write_lock.lock().await;

        let new_doc: ConfigDocument = serde_yaml::from_str(new_yaml)?;
        if opts.validate {
            validate::validate(&new_doc)?;
        }

        let new_checksum = checksum_of(&new_doc)?;

        let tmp_path = self.path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp_path, new_yaml.as_bytes()).await?;
        {
            let file = tokio::fs::File::open(&tmp_path).await?;
            file.sync_all().await?;
        }
        tokio::fs::rename(&tmp_path, &self.path).await?;

        if !opts.reload {
            return Ok(ReplaceOutcome { checksum: new_checksum, swapped: false });
        }

        let mut last_document = self.last_document.lock().await;
        let changed_sections = diff_sections(&last_document, &new_doc);
        let previous_checksum = self.current.load().checksum.clone();
        let next_version = self.current.load().version + 1;

        let snapshot = ConfigSnapshot::from_document(new_doc.clone(), next_version, new_checksum.clone());
        self.current.store(Arc::new(snapshot));
        *last_document = new_doc;
        drop(last_document);

        self.hub
            .emit(ConfigChangeEvent {
                previous_checksum,
                new_checksum: new_checksum.clone(),
                changed_sections,
                version: next_version,
            })
            .await;

        Ok(ReplaceOutcome { checksum: new_checksum, swapped: true })
    }
}

fn checksum_of(doc: &ConfigDocument) -> Result<String, ConfigError> {
    let canonical = serde_json::to_vec(doc).map_err(|e| ConfigError::Validation(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(format!("{:x}", hasher.finalize()))
}

fn diff_sections(old: &ConfigDocument, new: &ConfigDocument) -> std::collections::BTreeSet<String> {
    let old_value = serde_json::to_value(old).unwrap_or_default();
    let new_value = serde_json::to_value(new).unwrap_or_default();
    let mut changed = std::collections::BTreeSet::new();

    let (Some(old_obj), Some(new_obj)) = (old_value.as_object(), new_value.as_object()) else {
        return changed;
    };

    let mut keys: std::collections::BTreeSet<&String> = old_obj.keys().collect();
    keys.extend(new_obj.keys());
    for key in keys {
        if old_obj.get(key) != new_obj.get(key) {
            changed.insert(key.clone());
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdminConfig, ModelAlias};
    use plexus_common::Secret;
    use std::collections::HashMap;

    fn doc_with_alias(alias: Option<ModelAlias>) -> ConfigDocument {
        let mut models = HashMap::new();
        if let Some(alias) = alias {
            models.insert(alias.alias_id.clone(), alias);
        }
        ConfigDocument {
            providers: HashMap::new(),
            models,
            keys: HashMap::new(),
            admin: AdminConfig { api_key: Secret::new("admin") },
            quotas: HashMap::new(),
            port: 8080,
            log_level: "info".into(),
        }
    }

    #[tokio::test]
    async fn replace_bumps_version_and_emits_models_change() {
        let dir = std::env::temp_dir().join(format!("plexus-config-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.yaml");
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let store = ConfigStore::new(path, doc_with_alias(None)).unwrap();
        assert_eq!(store.current().version, 1);

        let mut rx = store.events().subscribe();

        let new_doc = doc_with_alias(Some(ModelAlias {
            alias_id: "fast".into(),
            targets: vec![],
            selector: crate::types::SelectorKind::Random,
            pricing: Default::default(),
        }));
        let yaml = serde_yaml::to_string(&new_doc).unwrap();
        store
            .replace(&yaml, ReplaceOptions { validate: false, reload: true })
            .await
            .unwrap();

        assert_eq!(store.current().version, 2);
        let event = rx.recv().await.unwrap();
        assert!(event.changed_sections.contains("models"));
    }
}
