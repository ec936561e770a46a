use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::PathBuf;

/// `{月份键: 预约列表}` 整体存在这个键下。
pub const RESERVATION_MONTHS_KEY: &str = "reservation_months";
/// 上次选的日历展示模式。
pub const DISPLAY_MODE_KEY: &str = "calendar_display_mode";

/// 控制台本地的持久化键值存储，一个键一个 JSON 文件。
///
/// 这里存的都是建议性缓存：读坏了当没有，写失败只记日志，
/// 任何情况下都不能因为缓存问题把界面挡住。
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// 文件缺失或内容解析失败都按缓存未命中处理。
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = fs::read_to_string(self.key_path(key)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Discarding corrupt cache entry {key}: {e}");
                None
            }
        }
    }

    /// 尽力写入。
    pub fn write_json<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            log::warn!("Failed to create cache dir {}: {e}", self.dir.display());
            return;
        }
        match serde_json::to_string(value) {
            Ok(raw) => {
                if let Err(e) = fs::write(self.key_path(key), raw) {
                    log::warn!("Failed to persist cache entry {key}: {e}");
                }
            }
            Err(e) => {
                log::warn!("Failed to serialize cache entry {key}: {e}");
            }
        }
    }

    pub fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.key_path(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let mut value = HashMap::new();
        value.insert("2025-06".to_string(), vec![1, 2, 3]);
        store.write_json("months", &value);

        let loaded: HashMap<String, Vec<i32>> = store.read_json("months").unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.read_json::<Vec<i32>>("nothing").is_none());
    }

    #[test]
    fn test_corrupt_content_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        std::fs::write(dir.path().join("months.json"), "{not json").unwrap();

        assert!(store.read_json::<HashMap<String, Vec<i32>>>("months").is_none());
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.write_json("mode", &"month");
        store.remove("mode");
        assert!(store.read_json::<String>("mode").is_none());
    }
}
