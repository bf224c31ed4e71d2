use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::error::StoreError;
use crate::store::kv::KeyValueStore;
use crate::store::schema::{EXPORT_VERSION, ExportData, STORAGE_KEY};

/// Suffix appended to a target's file name while it is being written.
const TEMP_SUFFIX: &str = ".alquenos-tmp";

/// File-backed slot store: each key lives in `<base_dir>/<key>.json`.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_dir).map_err(|e| StoreError::io(&base_dir, e))?;
        let store = Self { base_dir };
        let removed = store.clean_stale_temp_files();
        if removed > 0 {
            log::warn!("removed {removed} leftover temp file(s) from an interrupted write");
        }
        Ok(store)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    /// Delete the progress slot's temp file if a write never reached its
    /// rename. Other files in the directory are never touched. Returns how
    /// many were removed.
    pub fn clean_stale_temp_files(&self) -> usize {
        let stale = temp_path(&self.file_path(STORAGE_KEY));
        usize::from(stale.is_file() && fs::remove_file(&stale).is_ok())
    }
}

impl KeyValueStore for JsonStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.file_path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StoreError::io(path, e))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        write_atomic(&self.file_path(key), value.as_bytes())
    }

}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("alquenos")
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

/// Write to a sibling `<name>.alquenos-tmp` file, fsync, then rename over the
/// target, so a reader sees either the old contents or the new ones.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp_path = temp_path(path);
    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    };
    write().map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::io(path, e)
    })
}

pub fn write_export(path: &Path, data: &ExportData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    write_atomic(path, json.as_bytes())?;
    Ok(())
}

pub fn read_export(path: &Path) -> Result<ExportData> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read export file {}", path.display()))?;
    let data: ExportData = serde_json::from_str(&content)
        .with_context(|| format!("{} is not an alquenos export", path.display()))?;
    if data.alquenos_export_version != EXPORT_VERSION {
        bail!(
            "Unsupported export version: {} (expected {})",
            data.alquenos_export_version,
            EXPORT_VERSION
        );
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::PersistedState;
    use chrono::Utc;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn make_test_export() -> ExportData {
        ExportData {
            alquenos_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            state: PersistedState {
                progress: 17,
                completed_sections: vec!["fundamentos".to_string()],
                bookmarked_cards: vec!["1.3".to_string()],
                reviewed_cards: 2,
            },
        }
    }

    #[test]
    fn test_missing_slot_reads_none() {
        let (_dir, store) = make_test_store();
        assert_eq!(store.get("organicChemistryMindmap").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, mut store) = make_test_store();
        store.set("slot", "{\"a\":1}").unwrap();
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(store.base_dir().join("slot.json").exists());
    }

    #[test]
    fn test_set_leaves_no_temp_file() {
        let (dir, mut store) = make_test_store();
        store.set("slot", "first").unwrap();
        store.set("slot", "second").unwrap();
        let tmp_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(TEMP_SUFFIX))
            .collect();
        assert!(tmp_files.is_empty(), "no residual temp files");
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_opening_cleans_stale_temp_file() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("organicChemistryMindmap.json.alquenos-tmp");
        fs::write(&stale, "{").unwrap();
        JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn test_opening_keeps_unrelated_tmp_files() {
        let dir = TempDir::new().unwrap();
        let foreign = dir.path().join("thesis-draft.tmp");
        fs::write(&foreign, "chapter 1").unwrap();
        fs::write(dir.path().join("organicChemistryMindmap.tmp"), "mine").unwrap();

        JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();

        assert_eq!(fs::read_to_string(&foreign).unwrap(), "chapter 1");
        assert!(dir.path().join("organicChemistryMindmap.tmp").exists());
    }

    #[test]
    fn test_export_keeps_sibling_tmp_file() {
        let (dir, _store) = make_test_store();
        let sibling = dir.path().join("notes.tmp");
        fs::write(&sibling, "keep me").unwrap();

        write_export(&dir.path().join("notes.json"), &make_test_export()).unwrap();

        assert_eq!(fs::read_to_string(&sibling).unwrap(), "keep me");
        assert!(!dir.path().join("notes.json.alquenos-tmp").exists());
    }

    #[test]
    fn test_write_into_missing_dir_fails_with_path() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore {
            base_dir: dir.path().join("nonexistent_subdir"),
        };
        let err = store.set("slot", "x").unwrap_err();
        assert!(err.to_string().contains("nonexistent_subdir"));
    }

    #[test]
    fn test_export_round_trip() {
        let (dir, _store) = make_test_store();
        let path = dir.path().join("backup.json");
        let export = make_test_export();
        write_export(&path, &export).unwrap();
        let read = read_export(&path).unwrap();
        assert_eq!(read.state, export.state);
    }

    #[test]
    fn test_export_version_rejection() {
        let (dir, _store) = make_test_store();
        let path = dir.path().join("backup.json");
        let mut export = make_test_export();
        export.alquenos_export_version = 99;
        write_export(&path, &export).unwrap();

        let err_msg = read_export(&path).unwrap_err().to_string();
        assert!(err_msg.contains("Unsupported export version"));
        assert!(err_msg.contains("99"));
    }

    #[test]
    fn test_read_export_rejects_garbage() {
        let (dir, _store) = make_test_store();
        let path = dir.path().join("backup.json");
        fs::write(&path, "not json").unwrap();
        let err_msg = read_export(&path).unwrap_err().to_string();
        assert!(err_msg.contains("is not an alquenos export"));
    }
}
