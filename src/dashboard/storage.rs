//! Durable key-value backends behind the layout persistence adapter.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed for {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The layout could not be encoded.
    #[error("failed to encode layout: {0}")]
    Encode(#[from] serde_json::Error),

    /// The backend refused or could not reach its store.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// Every retry attempt failed; carries the last error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<StorageError>,
    },
}

/// A string blob store keyed by logical name.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Failures that happened after `put` already returned. Only queued
    /// backends report anything here.
    fn take_failures(&self) -> Vec<StorageError> {
        Vec::new()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).put(key, value)
    }

    fn take_failures(&self) -> Vec<StorageError> {
        (**self).take_failures()
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let io = |source| StorageError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io)?;
        // tmp file then rename; readers only ever see a complete record
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(io)?;
        std::fs::rename(&tmp, &path).map_err(io)?;
        Ok(())
    }
}

/// In-process store, used for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".into()))?;
        Ok(guard.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".into()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Retries a fallible backend a fixed number of times.
pub struct RetryingStore<S> {
    inner: S,
    attempts: u32,
    backoff: Duration,
}

impl<S: KeyValueStore> RetryingStore<S> {
    pub fn new(inner: S, attempts: u32) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            backoff: Duration::from_millis(50),
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn retry<T>(
        &self,
        op: &str,
        key: &str,
        mut f: impl FnMut() -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut attempt = 1;
        loop {
            match f() {
                Ok(v) => return Ok(v),
                Err(e) if attempt >= self.attempts => {
                    return Err(StorageError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    })
                }
                Err(e) => {
                    tracing::debug!(%key, attempt, "storage {op} failed, retrying: {e}");
                    attempt += 1;
                    if !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff);
                    }
                }
            }
        }
    }
}

impl<S: KeyValueStore> KeyValueStore for RetryingStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.retry("read", key, || self.inner.get(key))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.retry("write", key, || self.inner.put(key, value))
    }

    fn take_failures(&self) -> Vec<StorageError> {
        self.inner.take_failures()
    }
}

enum WriteJob {
    Put { key: String, value: String },
    Flush(Sender<()>),
}

/// Queues writes on a worker thread so a slow backend never blocks the UI.
/// Reads go straight to the backend; failed writes are reported through
/// [`KeyValueStore::take_failures`].
pub struct BackgroundStore<S: KeyValueStore + 'static> {
    inner: Arc<S>,
    tx: Option<Sender<WriteJob>>,
    failures: Mutex<Receiver<StorageError>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: KeyValueStore + 'static> BackgroundStore<S> {
    pub fn new(inner: S) -> Self {
        let inner = Arc::new(inner);
        let (tx, rx) = mpsc::channel::<WriteJob>();
        let (fail_tx, fail_rx) = mpsc::channel();
        let backend = inner.clone();
        let worker = std::thread::Builder::new()
            .name("layout-writer".into())
            .spawn(move || {
                for job in rx {
                    match job {
                        WriteJob::Put { key, value } => {
                            if let Err(e) = backend.put(&key, &value) {
                                tracing::warn!(%key, "queued layout write failed: {e}");
                                let _ = fail_tx.send(e);
                            }
                        }
                        WriteJob::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            });
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!("failed to start layout writer thread: {e}");
                None
            }
        };
        Self {
            inner,
            tx: worker.as_ref().map(|_| tx),
            failures: Mutex::new(fail_rx),
            worker,
        }
    }

    /// Blocks until every write queued so far has been attempted.
    pub fn flush(&self) {
        if let Some(tx) = &self.tx {
            let (done_tx, done_rx) = mpsc::channel();
            if tx.send(WriteJob::Flush(done_tx)).is_ok() {
                let _ = done_rx.recv();
            }
        }
    }
}

impl<S: KeyValueStore + 'static> KeyValueStore for BackgroundStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let job = WriteJob::Put {
            key: key.to_string(),
            value: value.to_string(),
        };
        match &self.tx {
            Some(tx) => tx
                .send(job)
                .map_err(|_| StorageError::Unavailable("layout writer stopped".into())),
            // no worker thread: fall back to writing inline
            None => self.inner.put(key, value),
        }
    }

    fn take_failures(&self) -> Vec<StorageError> {
        let mut out = self.inner.take_failures();
        if let Ok(rx) = self.failures.lock() {
            out.extend(rx.try_iter());
        }
        out
    }
}

impl<S: KeyValueStore + 'static> Drop for BackgroundStore<S> {
    fn drop(&mut self) {
        // closing the channel lets the worker drain and exit
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then delegates to memory.
    #[derive(Default)]
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        inner: MemoryStore,
    }

    impl KeyValueStore for Flaky {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(StorageError::Unavailable(format!("flaky #{n}")));
            }
            self.inner.put(key, value)
        }
    }

    #[test]
    fn file_store_round_trip_and_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert!(store.get("dashboard").unwrap().is_none());
        store.put("dashboard", "{\"a\":1}").unwrap();
        assert_eq!(store.get("dashboard").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(store.path_for("dashboard").exists());
        assert!(!store.path_for("dashboard").with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let store = FileStore::new("/tmp/x");
        assert_eq!(
            store.path_for("user/../42"),
            PathBuf::from("/tmp/x/user____42.json")
        );
    }

    #[test]
    fn retry_recovers_within_budget() {
        let flaky = Flaky {
            failures: 2,
            ..Default::default()
        };
        let store = RetryingStore::new(flaky, 3).with_backoff(Duration::ZERO);
        store.put("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn retry_gives_up_after_budget() {
        let flaky = Flaky {
            failures: 5,
            ..Default::default()
        };
        let store = RetryingStore::new(flaky, 3).with_backoff(Duration::ZERO);
        match store.put("k", "v") {
            Err(StorageError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn background_store_reports_failures_later() {
        let store = BackgroundStore::new(Flaky {
            failures: 1,
            ..Default::default()
        });
        store.put("k", "first").unwrap();
        store.put("k", "second").unwrap();
        store.flush();
        let failures = store.take_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(store.get("k").unwrap().as_deref(), Some("second"));
        assert!(store.take_failures().is_empty());
    }
}
