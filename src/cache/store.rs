//! Disk-backed key-value store with per-entry expiry
//!
//! Each entry lives in its own JSON file named after the SHA-256 digest of its
//! key. Files are written to a temporary name and renamed into place, so a
//! reader sees either the previous entry or the new one, never a partial write.
//! Expired entries are invisible to reads but stay on disk until `expire`,
//! `delete`, `clear` or size-bound eviction removes them.
//!
//! Several processes may share one directory. Renames keep individual entries
//! intact, but eviction decisions are made per process without coordination,
//! so the size limit is only approximate in that setup.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::error::{CacheError, Result};
use super::key::CacheKey;

/// Default disk budget: 1 GB
pub const DEFAULT_SIZE_LIMIT: u64 = 1_000_000_000;

const ENTRY_EXTENSION: &str = "json";

const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

/// How the store makes room when the size limit would be exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Drop expired entries, then the oldest writes, until the new entry fits
    #[default]
    LeastRecentlyStored,
    /// Never evict; the size limit is not enforced
    None,
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "least-recently-stored" | "lrs" => Ok(EvictionPolicy::LeastRecentlyStored),
            "none" => Ok(EvictionPolicy::None),
            other => Err(format!(
                "unknown eviction policy '{}' (expected least-recently-stored or none)",
                other
            )),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::LeastRecentlyStored => f.write_str("least-recently-stored"),
            EvictionPolicy::None => f.write_str("none"),
        }
    }
}

/// Settings for opening a [`DiskStore`]
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the entry files
    pub directory: PathBuf,
    /// Total bytes the entry files may occupy
    pub size_limit: u64,
    /// What to do when a write would exceed `size_limit`
    pub eviction_policy: EvictionPolicy,
}

impl StoreConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            size_limit: DEFAULT_SIZE_LIMIT,
            eviction_policy: EvictionPolicy::default(),
        }
    }

    pub fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }

    pub fn with_eviction_policy(mut self, eviction_policy: EvictionPolicy) -> Self {
        self.eviction_policy = eviction_policy;
        self
    }
}

/// Entry as stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// Full key, checked on read to rule out digest collisions
    key: CacheKey,
    /// The cached data
    data: T,
    /// When the entry was written
    stored_at: DateTime<Utc>,
    /// When the entry stops being visible
    expires_at: DateTime<Utc>,
}

/// Timestamps of an entry, read without keeping the payload
#[derive(Debug, Deserialize)]
struct EntryHeader {
    stored_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Snapshot of what the store holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Entry files on disk, expired or not
    pub entries: usize,
    /// Entries still visible to reads
    pub live: usize,
    /// Entries past their expiry but not yet removed
    pub expired: usize,
    /// Entry files that could not be parsed
    pub unreadable: usize,
    /// Bytes used by entry files
    pub volume: u64,
    /// Configured size limit in bytes
    pub size_limit: u64,
}

/// An entry file found while scanning the directory
struct EntryFile {
    path: PathBuf,
    len: u64,
    header: Option<EntryHeader>,
}

/// Durable key-value storage rooted at one directory
#[derive(Debug)]
pub struct DiskStore {
    config: StoreConfig,
}

impl DiskStore {
    /// Opens (and creates if needed) the store directory
    ///
    /// Fails with [`CacheError::Init`] if the directory cannot be created or
    /// a file cannot be written inside it.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let dir = &config.directory;
        fs::create_dir_all(dir).map_err(|source| CacheError::Init {
            path: dir.clone(),
            source,
        })?;
        NamedTempFile::new_in(dir).map_err(|source| CacheError::Init {
            path: dir.clone(),
            source,
        })?;

        debug!(
            directory = %dir.display(),
            size_limit = config.size_limit,
            eviction = %config.eviction_policy,
            "opened cache store"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    /// Returns the path to the entry file for the given key
    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.config
            .directory
            .join(format!("{}.{}", key.digest(), ENTRY_EXTENSION))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.config.directory)
            .map_err(|e| CacheError::io(&self.config.directory, e))
    }

    /// Writes `value` under `key`, replacing any previous entry
    ///
    /// The entry expires `ttl_seconds` after now; a TTL of zero stores an
    /// entry that is already expired.
    pub fn put(&self, key: &CacheKey, value: &Value, ttl_seconds: u64) -> Result<()> {
        self.ensure_dir()?;

        let now = Utc::now();
        let entry = CacheEntry {
            key: key.clone(),
            data: value,
            stored_at: now,
            expires_at: expiry_after(now, ttl_seconds),
        };
        let json = serde_json::to_vec(&entry)?;
        let path = self.entry_path(key);

        if self.config.eviction_policy == EvictionPolicy::LeastRecentlyStored {
            self.make_room(json.len() as u64, &path)?;
        }

        let dir = &self.config.directory;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CacheError::io(dir, e))?;
        tmp.write_all(&json)
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| CacheError::io(&path, e.error))?;

        debug!(key = %key, ttl_seconds, bytes = json.len(), "stored cache entry");
        Ok(())
    }

    /// Reads the value for `key` if present and not expired
    ///
    /// Missing, expired and corrupt entries all read as `None`. Only I/O
    /// failures other than "not found" are errors.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Value>> {
        let path = self.entry_path(key);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let entry: CacheEntry<Value> = match serde_json::from_slice(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt cache entry");
                return Ok(None);
            }
        };

        if entry.key != *key {
            warn!(path = %path.display(), "cache entry key mismatch, treating as absent");
            return Ok(None);
        }

        if Utc::now() >= entry.expires_at {
            return Ok(None);
        }

        Ok(Some(entry.data))
    }

    /// Removes the entry for `key`; absent keys are not an error
    pub fn delete(&self, key: &CacheKey) -> Result<()> {
        remove_if_present(&self.entry_path(key))?;
        Ok(())
    }

    /// Removes every entry, returning how many files were deleted
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_paths()? {
            if remove_if_present(&path)? {
                removed += 1;
            }
        }
        debug!(removed, "cleared cache store");
        Ok(removed)
    }

    /// Whether a live entry exists for `key`
    pub fn contains(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Number of entry files on disk, including expired ones not yet removed
    pub fn size(&self) -> Result<usize> {
        Ok(self.entry_paths()?.len())
    }

    /// Total bytes used by entry files
    pub fn volume(&self) -> Result<u64> {
        let mut total = 0;
        for path in self.entry_paths()? {
            total += file_len(&path)?;
        }
        Ok(total)
    }

    /// Physically removes expired entries, returning how many were removed
    pub fn expire(&self) -> Result<usize> {
        let now = Utc::now();
        let mut removed = 0;
        for file in self.scan()? {
            let expired = matches!(&file.header, Some(h) if now >= h.expires_at);
            if expired && remove_if_present(&file.path)? {
                removed += 1;
            }
        }
        debug!(removed, "removed expired cache entries");
        Ok(removed)
    }

    /// Counts entries by state along with disk usage
    pub fn stats(&self) -> Result<CacheStats> {
        let now = Utc::now();
        let mut stats = CacheStats {
            size_limit: self.config.size_limit,
            ..CacheStats::default()
        };
        for file in self.scan()? {
            stats.entries += 1;
            stats.volume += file.len;
            match file.header {
                Some(h) if now < h.expires_at => stats.live += 1,
                Some(_) => stats.expired += 1,
                None => stats.unreadable += 1,
            }
        }
        Ok(stats)
    }

    /// Evicts entries until `incoming` more bytes fit under the size limit
    ///
    /// The file at `replacing` is about to be overwritten, so its current size
    /// is not counted and it is never chosen for eviction. Unreadable and
    /// expired entries go first, then the rest in order of write time.
    fn make_room(&self, incoming: u64, replacing: &Path) -> Result<()> {
        let limit = self.config.size_limit;
        if incoming > limit {
            return Err(CacheError::TooLarge {
                size: incoming,
                limit,
            });
        }

        // Sizes come from metadata; entry contents are only read once
        // eviction is actually needed.
        let mut volume = 0;
        for path in self.entry_paths()? {
            if path != replacing {
                volume += file_len(&path)?;
            }
        }
        if volume + incoming <= limit {
            return Ok(());
        }

        let mut files: Vec<EntryFile> = self
            .scan()?
            .into_iter()
            .filter(|f| f.path != replacing)
            .collect();
        let now = Utc::now();
        files.sort_by_key(|f| match &f.header {
            None => (0, None),
            Some(h) if now >= h.expires_at => (1, Some(h.stored_at)),
            Some(h) => (2, Some(h.stored_at)),
        });

        for file in files {
            if volume + incoming <= limit {
                break;
            }
            match remove_if_present(&file.path) {
                Ok(true) => {
                    debug!(path = %file.path.display(), bytes = file.len, "evicted cache entry")
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "could not evict cache entry, skipping it");
                    continue;
                }
            }
            volume = volume.saturating_sub(file.len);
        }

        if volume + incoming > limit {
            warn!(volume, incoming, limit, "cache is over its size limit after eviction");
        }
        Ok(())
    }

    /// Lists entry files, ignoring temporary files and anything else
    fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.config.directory;
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io(dir, e)),
        };

        let mut paths = Vec::new();
        for dir_entry in read_dir {
            let path = dir_entry.map_err(|e| CacheError::io(dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Lists entry files with their sizes and timestamps
    ///
    /// Files that cannot be read or parsed are listed without a header.
    fn scan(&self) -> Result<Vec<EntryFile>> {
        let mut files = Vec::new();
        for path in self.entry_paths()? {
            let content = match fs::read(&path) {
                Ok(content) => content,
                // Removed by another writer since the directory listing
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable cache entry");
                    let len = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
                    files.push(EntryFile {
                        path,
                        len,
                        header: None,
                    });
                    continue;
                }
            };
            let header = serde_json::from_slice::<EntryHeader>(&content).ok();
            files.push(EntryFile {
                path,
                len: content.len() as u64,
                header,
            });
        }
        Ok(files)
    }
}

/// Expiry timestamp `ttl_seconds` after `now`; TTLs are capped at a century
fn expiry_after(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
    let ttl = ttl_seconds.min(MAX_TTL_SECONDS) as i64;
    now + Duration::seconds(ttl)
}

/// Removes a file, returning whether it existed
fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

fn file_len(path: &Path) -> Result<u64> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;
    use std::time::Duration as StdDuration;
    use tempfile::TempDir;

    fn create_test_store() -> (DiskStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = DiskStore::open(StoreConfig::new(temp_dir.path())).expect("Store should open");
        (store, temp_dir)
    }

    fn store_with_limit(dir: &Path, limit: u64, policy: EvictionPolicy) -> DiskStore {
        DiskStore::open(
            StoreConfig::new(dir)
                .with_size_limit(limit)
                .with_eviction_policy(policy),
        )
        .expect("Store should open")
    }

    #[test]
    fn test_put_creates_entry_file() {
        let (store, temp_dir) = create_test_store();
        let key = CacheKey::named("btc_usd");

        store.put(&key, &json!({"usd": 50000}), 60).expect("Put should succeed");

        let expected_path = temp_dir.path().join(format!("{}.json", key.digest()));
        assert!(expected_path.exists(), "Entry file should exist");

        let content = fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"usd\""));
        assert!(content.contains("50000"));
        assert!(content.contains("btc_usd"));
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (store, _temp_dir) = create_test_store();
        let result = store.get(&CacheKey::named("nonexistent")).expect("Get should not fail");
        assert!(result.is_none());
    }

    #[test]
    fn test_get_returns_live_value() {
        let (store, _temp_dir) = create_test_store();
        let key = CacheKey::named("fresh");

        store.put(&key, &json!([1, 2, 3]), 60).expect("Put should succeed");

        assert_eq!(store.get(&key).unwrap(), Some(json!([1, 2, 3])));
        assert!(store.contains(&key).unwrap());
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let (store, _temp_dir) = create_test_store();
        let key = CacheKey::named("expired");

        store.put(&key, &json!("gone"), 0).expect("Put should succeed");

        assert!(store.get(&key).unwrap().is_none());
        assert!(!store.contains(&key).unwrap());
        // Lazy invalidation: the file is still counted
        assert_eq!(store.size().unwrap(), 1);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (store, _temp_dir) = create_test_store();
        let key = CacheKey::named("short");

        store.put(&key, &json!(1), 1).expect("Put should succeed");
        assert!(store.get(&key).unwrap().is_some());

        thread::sleep(StdDuration::from_millis(1100));

        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let (store, _temp_dir) = create_test_store();
        let key = CacheKey::named("k");

        store.put(&key, &json!("first"), 60).unwrap();
        store.put(&key, &json!("second"), 60).unwrap();

        assert_eq!(store.get(&key).unwrap(), Some(json!("second")));
        assert_eq!(store.size().unwrap(), 1);
    }

    #[test]
    fn test_delete_missing_key_is_ok() {
        let (store, _temp_dir) = create_test_store();
        let key = CacheKey::named("never_set");

        store.delete(&key).expect("Delete of missing key should succeed");
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_everything() {
        let (store, _temp_dir) = create_test_store();
        for i in 0..5 {
            store.put(&CacheKey::named(format!("k{}", i)), &json!(i), 60).unwrap();
        }

        assert_eq!(store.clear().unwrap(), 5);
        assert_eq!(store.size().unwrap(), 0);
        assert_eq!(store.volume().unwrap(), 0);
        assert!(store.get(&CacheKey::named("k0")).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_entry_reads_as_absent() {
        let (store, temp_dir) = create_test_store();
        let key = CacheKey::named("corrupt");
        fs::write(
            temp_dir.path().join(format!("{}.json", key.digest())),
            "{not valid json",
        )
        .unwrap();

        assert!(store.get(&key).unwrap().is_none());
        assert_eq!(store.stats().unwrap().unreadable, 1);
    }

    #[test]
    fn test_put_succeeds_beside_unreadable_entries() {
        let (store, temp_dir) = create_test_store();
        fs::write(temp_dir.path().join("corrupt.json"), "{not valid json").unwrap();
        // Reading a directory fails with an I/O error rather than a parse error
        fs::create_dir(temp_dir.path().join("deadbeef.json")).unwrap();

        store
            .put(&CacheKey::named("fresh"), &json!(1), 60)
            .expect("Put should not be blocked by unreadable files");

        let stats = store.stats().expect("Stats should tolerate unreadable files");
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.live, 1);
        assert_eq!(stats.unreadable, 2);
        assert_eq!(store.expire().expect("Expire should tolerate unreadable files"), 0);
        assert!(store.contains(&CacheKey::named("fresh")).unwrap());
    }

    #[test]
    fn test_eviction_skips_entries_it_cannot_remove() {
        let temp_dir = TempDir::new().unwrap();
        let payload = json!("w".repeat(1000));

        let measuring = store_with_limit(temp_dir.path(), DEFAULT_SIZE_LIMIT, EvictionPolicy::None);
        measuring.put(&CacheKey::named("k1"), &payload, 60).unwrap();
        let one = measuring.volume().unwrap();
        measuring.clear().unwrap();

        let blocker = temp_dir.path().join("deadbeef.json");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("inner"), "x").unwrap();
        let blocker_len = fs::metadata(&blocker).unwrap().len();

        let store = store_with_limit(
            temp_dir.path(),
            blocker_len + one + one / 2,
            EvictionPolicy::LeastRecentlyStored,
        );
        store.put(&CacheKey::named("k1"), &payload, 60).unwrap();
        store
            .put(&CacheKey::named("k2"), &payload, 60)
            .expect("Put should evict around an entry it cannot remove");

        assert!(blocker.exists());
        assert!(store.get(&CacheKey::named("k1")).unwrap().is_none());
        assert!(store.get(&CacheKey::named("k2")).unwrap().is_some());
    }

    #[test]
    fn test_delete_and_clear_propagate_io_errors() {
        let (store, temp_dir) = create_test_store();
        let key = CacheKey::named("stuck");
        let path = temp_dir.path().join(format!("{}.json", key.digest()));
        fs::create_dir(&path).unwrap();
        fs::write(path.join("inner"), "x").unwrap();

        assert!(matches!(store.delete(&key), Err(CacheError::Io { .. })));
        assert!(matches!(store.clear(), Err(CacheError::Io { .. })));
    }

    #[test]
    fn test_entries_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let key = CacheKey::new("https://api.example.com/coins/markets", [("page", "1")]);

        {
            let store = DiskStore::open(StoreConfig::new(temp_dir.path())).unwrap();
            store.put(&key, &json!({"ok": true}), 60).unwrap();
        }

        let reopened = DiskStore::open(StoreConfig::new(temp_dir.path())).unwrap();
        assert_eq!(reopened.get(&key).unwrap(), Some(json!({"ok": true})));
    }

    #[test]
    fn test_open_creates_directory_if_missing() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("cache").join("dir");

        let store = DiskStore::open(StoreConfig::new(&nested)).expect("Store should open");
        store.put(&CacheKey::named("k"), &json!(1), 60).unwrap();

        assert!(nested.exists(), "Nested directory should be created");
    }

    #[test]
    fn test_open_fails_when_path_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("not_a_dir");
        fs::write(&file_path, "x").unwrap();

        let result = DiskStore::open(StoreConfig::new(&file_path));
        assert!(matches!(result, Err(CacheError::Init { .. })));
    }

    #[test]
    fn test_expire_removes_only_expired_entries() {
        let (store, _temp_dir) = create_test_store();
        store.put(&CacheKey::named("live"), &json!(1), 60).unwrap();
        store.put(&CacheKey::named("dead"), &json!(2), 0).unwrap();

        assert_eq!(store.expire().unwrap(), 1);
        assert_eq!(store.size().unwrap(), 1);
        assert!(store.contains(&CacheKey::named("live")).unwrap());
    }

    #[test]
    fn test_stats_counts_entries_by_state() {
        let (store, _temp_dir) = create_test_store();
        store.put(&CacheKey::named("a"), &json!(1), 60).unwrap();
        store.put(&CacheKey::named("b"), &json!(2), 60).unwrap();
        store.put(&CacheKey::named("c"), &json!(3), 0).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.live, 2);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.volume, store.volume().unwrap());
        assert_eq!(stats.size_limit, DEFAULT_SIZE_LIMIT);
    }

    #[test]
    fn test_eviction_drops_least_recently_stored() {
        let temp_dir = TempDir::new().unwrap();
        let payload = json!("x".repeat(1000));

        // Measure one entry, then allow room for two and a half
        let measuring = store_with_limit(temp_dir.path(), DEFAULT_SIZE_LIMIT, EvictionPolicy::None);
        measuring.put(&CacheKey::named("k1"), &payload, 60).unwrap();
        let one = measuring.volume().unwrap();
        measuring.clear().unwrap();

        let store = store_with_limit(
            temp_dir.path(),
            one * 2 + one / 2,
            EvictionPolicy::LeastRecentlyStored,
        );
        store.put(&CacheKey::named("k1"), &payload, 60).unwrap();
        thread::sleep(StdDuration::from_millis(10));
        store.put(&CacheKey::named("k2"), &payload, 60).unwrap();
        thread::sleep(StdDuration::from_millis(10));

        // Reading k1 must not refresh its recency
        assert!(store.get(&CacheKey::named("k1")).unwrap().is_some());

        store.put(&CacheKey::named("k3"), &payload, 60).unwrap();

        assert!(store.get(&CacheKey::named("k1")).unwrap().is_none());
        assert!(store.get(&CacheKey::named("k2")).unwrap().is_some());
        assert!(store.get(&CacheKey::named("k3")).unwrap().is_some());
        assert!(store.volume().unwrap() <= one * 2 + one / 2);
    }

    #[test]
    fn test_eviction_prefers_expired_entries() {
        let temp_dir = TempDir::new().unwrap();
        let payload = json!("y".repeat(1000));

        let measuring = store_with_limit(temp_dir.path(), DEFAULT_SIZE_LIMIT, EvictionPolicy::None);
        measuring.put(&CacheKey::named("k1"), &payload, 60).unwrap();
        let one = measuring.volume().unwrap();
        measuring.clear().unwrap();

        let store = store_with_limit(
            temp_dir.path(),
            one * 2 + one / 2,
            EvictionPolicy::LeastRecentlyStored,
        );
        store.put(&CacheKey::named("old_live"), &payload, 60).unwrap();
        thread::sleep(StdDuration::from_millis(10));
        store.put(&CacheKey::named("new_dead"), &payload, 0).unwrap();
        thread::sleep(StdDuration::from_millis(10));
        store.put(&CacheKey::named("newest"), &payload, 60).unwrap();

        assert!(store.get(&CacheKey::named("old_live")).unwrap().is_some());
        assert!(store.get(&CacheKey::named("newest")).unwrap().is_some());
        assert_eq!(store.size().unwrap(), 2);
    }

    #[test]
    fn test_overwrite_at_limit_does_not_evict_others() {
        let temp_dir = TempDir::new().unwrap();
        let payload = json!("z".repeat(1000));

        let measuring = store_with_limit(temp_dir.path(), DEFAULT_SIZE_LIMIT, EvictionPolicy::None);
        measuring.put(&CacheKey::named("a"), &payload, 60).unwrap();
        let one = measuring.volume().unwrap();
        measuring.clear().unwrap();

        let store = store_with_limit(
            temp_dir.path(),
            one * 2 + one / 2,
            EvictionPolicy::LeastRecentlyStored,
        );
        store.put(&CacheKey::named("a"), &payload, 60).unwrap();
        store.put(&CacheKey::named("b"), &payload, 60).unwrap();
        store.put(&CacheKey::named("b"), &payload, 60).unwrap();

        assert!(store.contains(&CacheKey::named("a")).unwrap());
        assert!(store.contains(&CacheKey::named("b")).unwrap());
    }

    #[test]
    fn test_no_eviction_policy_ignores_limit() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_limit(temp_dir.path(), 10, EvictionPolicy::None);

        store.put(&CacheKey::named("a"), &json!("aaaaaaaaaa"), 60).unwrap();
        store.put(&CacheKey::named("b"), &json!("bbbbbbbbbb"), 60).unwrap();

        assert_eq!(store.size().unwrap(), 2);
    }

    #[test]
    fn test_entry_larger_than_limit_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_limit(temp_dir.path(), 10, EvictionPolicy::LeastRecentlyStored);

        let result = store.put(&CacheKey::named("big"), &json!("far too large"), 60);
        assert!(matches!(result, Err(CacheError::TooLarge { .. })));
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn test_eviction_policy_parsing() {
        assert_eq!(
            "least-recently-stored".parse::<EvictionPolicy>().unwrap(),
            EvictionPolicy::LeastRecentlyStored
        );
        assert_eq!("NONE".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::None);
        assert!("lru".parse::<EvictionPolicy>().is_err());
        assert_eq!(EvictionPolicy::default().to_string(), "least-recently-stored");
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let (store, _temp_dir) = create_test_store();
        let key = CacheKey::named("forever");

        store.put(&key, &json!(1), u64::MAX).unwrap();
        assert!(store.contains(&key).unwrap());
    }
}
