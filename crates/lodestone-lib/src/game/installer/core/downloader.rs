use crate::error::{LauncherError, LauncherResult};
use crate::game::installer::types::CancelToken;
use futures::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::fs::{create_dir_all, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Proof that a file with a verified hash sits at `path`.
///
/// Only the artifact store can produce one, so code that consumes it
/// (native extraction) cannot run on an unverified file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtifact {
    path: PathBuf,
    sha1: String,
    downloaded: bool,
}

impl FetchedArtifact {
    pub(crate) fn new(path: PathBuf, sha1: String, downloaded: bool) -> Self {
        Self {
            path,
            sha1,
            downloaded,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sha1(&self) -> &str {
        &self.sha1
    }

    /// False when an existing file already matched
    pub fn was_downloaded(&self) -> bool {
        self.downloaded
    }
}

/// Removes the temporary download file unless committed.
/// Covers early returns, cancellation and dropped futures.
struct TempFileGuard {
    path: Option<PathBuf>,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn commit(mut self) {
        self.path = None;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(ref path) = self.path {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove temp file {:?}: {}", path, e);
                }
            }
        }
    }
}

fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".new");
    PathBuf::from(name)
}

/// Stream a file through SHA-1 and return the lowercase hex digest
pub async fn file_sha1(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Whether `s` is a 40-digit hex SHA-1, in either case
pub fn is_sha1_hex(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Write `bytes` to `target` through a sibling temp file and a rename
pub async fn write_atomic(target: &Path, bytes: &[u8]) -> LauncherResult<()> {
    if let Some(parent) = target.parent() {
        create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::fs(parent, e))?;
    }

    let tmp_path = temp_path_for(target);
    let guard = TempFileGuard::new(tmp_path.clone());
    let mut file = File::create(&tmp_path)
        .await
        .map_err(|e| LauncherError::fs(&tmp_path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| LauncherError::fs(&tmp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| LauncherError::fs(&tmp_path, e))?;
    drop(file);

    tokio::fs::rename(&tmp_path, target)
        .await
        .map_err(|e| LauncherError::fs(target, e))?;
    guard.commit();
    Ok(())
}

type InFlightTable = Arc<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>>;

/// Exclusive claim on one target path. Dropping it releases the path and
/// removes the table entry once nobody else waits on it.
struct PathClaim {
    guard: Option<OwnedMutexGuard<()>>,
    lock: Arc<AsyncMutex<()>>,
    path: PathBuf,
    table: InFlightTable,
}

impl Drop for PathClaim {
    fn drop(&mut self) {
        self.guard.take();
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        // Table entry plus our own handle
        if Arc::strong_count(&self.lock) == 2 {
            table.remove(&self.path);
        }
    }
}

/// Content-addressed fetcher: skip on hash match, stream-and-verify otherwise.
///
/// Clones share one in-flight table, so concurrent fetches of the same
/// target are serialized and the later ones find the verified file.
#[derive(Clone)]
pub struct ArtifactStore {
    client: Client,
    cancel: CancelToken,
    in_flight: InFlightTable,
}

impl ArtifactStore {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cancel: CancelToken::never(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Attach a cancellation token checked between chunks
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    async fn claim(&self, target: &Path) -> PathClaim {
        let lock = {
            let mut table = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            table.entry(target.to_path_buf()).or_default().clone()
        };
        if lock.try_lock().is_err() {
            log::debug!("Waiting for in-flight download of {:?}", target);
        }
        let guard = lock.clone().lock_owned().await;
        PathClaim {
            guard: Some(guard),
            lock,
            path: target.to_path_buf(),
            table: self.in_flight.clone(),
        }
    }

    /// Ensure `target` holds the bytes of `url` hashing to `sha1`.
    pub async fn fetch_verified(
        &self,
        target: &Path,
        url: &str,
        sha1: &str,
    ) -> LauncherResult<FetchedArtifact> {
        let _claim = self.claim(target).await;
        self.fetch_claimed(target, url, sha1).await
    }

    async fn fetch_claimed(
        &self,
        target: &Path,
        url: &str,
        sha1: &str,
    ) -> LauncherResult<FetchedArtifact> {
        let expected = sha1.to_lowercase();

        if target.exists() {
            match file_sha1(target).await {
                Ok(computed) if computed == expected => {
                    log::debug!("File exists and hash matches, skipping: {:?}", target);
                    return Ok(FetchedArtifact::new(target.to_path_buf(), computed, false));
                }
                Ok(computed) => {
                    log::info!(
                        "File exists but hash mismatches ({} != {}), re-downloading: {:?}",
                        computed,
                        expected,
                        target
                    );
                }
                Err(e) => {
                    log::warn!(
                        "Failed to read existing file for validation: {} - {}",
                        e,
                        target.display()
                    );
                }
            }
        }

        if self.cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        log::debug!("Downloading: {} -> {:?}", url, target);
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| LauncherError::Network {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(LauncherError::HttpRejection {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        if let Some(parent) = target.parent() {
            create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::fs(parent, e))?;
        }

        let tmp_path = temp_path_for(target);
        let mut file = File::create(&tmp_path)
            .await
            .map_err(|e| LauncherError::fs(&tmp_path, e))?;
        let guard = TempFileGuard::new(tmp_path.clone());

        let mut hasher = Sha1::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|source| LauncherError::Network {
                url: url.to_string(),
                source,
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| LauncherError::fs(&tmp_path, e))?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;

            if self.cancel.is_cancelled() {
                log::warn!("Download cancelled: {:?}", target);
                return Err(LauncherError::Cancelled);
            }
        }

        file.flush()
            .await
            .map_err(|e| LauncherError::fs(&tmp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| LauncherError::fs(&tmp_path, e))?;
        drop(file);

        let computed = format!("{:x}", hasher.finalize());
        if computed != expected {
            return Err(LauncherError::HashMismatch {
                url: url.to_string(),
                expected,
                actual: computed,
            });
        }

        // Atomic move into place
        tokio::fs::rename(&tmp_path, target)
            .await
            .map_err(|e| LauncherError::fs(target, e))?;
        guard.commit();

        let secs = start.elapsed().as_secs_f64();
        log::debug!(
            "Download stats: url={}, size={} bytes, time={:.2}s",
            url,
            downloaded,
            secs
        );

        Ok(FetchedArtifact::new(target.to_path_buf(), computed, true))
    }

    /// Download a small document into memory, verifying it when a hash is known
    pub async fn fetch_bytes(&self, url: &str, expected_sha1: Option<&str>) -> LauncherResult<Vec<u8>> {
        log::debug!("Downloading to memory: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| LauncherError::Network {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(LauncherError::HttpRejection {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| LauncherError::Network {
                url: url.to_string(),
                source,
            })?;

        if let Some(expected) = expected_sha1 {
            let mut hasher = Sha1::new();
            hasher.update(&bytes);
            let computed = format!("{:x}", hasher.finalize());
            if computed != expected.to_lowercase() {
                return Err(LauncherError::HashMismatch {
                    url: url.to_string(),
                    expected: expected.to_lowercase(),
                    actual: computed,
                });
            }
        }

        Ok(bytes.to_vec())
    }

    /// Download JSON and deserialize
    pub async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> LauncherResult<T> {
        let bytes = self.fetch_bytes(url, None).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sha1_hex(data: &[u8]) -> String {
        let mut hasher = Sha1::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    #[test]
    fn temp_path_appends_suffix() {
        let p = temp_path_for(Path::new("/a/b/lib.jar"));
        assert_eq!(p, PathBuf::from("/a/b/lib.jar.new"));
    }

    #[test]
    fn temp_guard_removes_uncommitted_file() {
        let tmp = tempdir().unwrap();
        let kept = tmp.path().join("kept.new");
        let dropped = tmp.path().join("dropped.new");
        std::fs::write(&kept, b"x").unwrap();
        std::fs::write(&dropped, b"x").unwrap();

        TempFileGuard::new(kept.clone()).commit();
        drop(TempFileGuard::new(dropped.clone()));

        assert!(kept.exists());
        assert!(!dropped.exists());
    }

    #[tokio::test]
    async fn file_sha1_streams_whole_file() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("blob");
        let data = vec![7u8; 200 * 1024];
        std::fs::write(&file, &data).unwrap();
        assert_eq!(file_sha1(&file).await.unwrap(), sha1_hex(&data));
    }

    #[tokio::test]
    async fn existing_matching_file_skips_network() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("a.jar");
        std::fs::write(&target, b"hello").unwrap();

        // Unroutable URL: any request would fail
        let store = ArtifactStore::new(Client::new());
        let fetched = store
            .fetch_verified(&target, "http://127.0.0.1:9/a.jar", &sha1_hex(b"hello").to_uppercase())
            .await
            .unwrap();
        assert!(!fetched.was_downloaded());
        assert_eq!(fetched.path(), target.as_path());
    }

    #[tokio::test]
    async fn stale_file_is_replaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let target = tmp.path().join("nested").join("a.jar");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"stale").unwrap();

        let store = ArtifactStore::new(Client::new());
        let fetched = store
            .fetch_verified(&target, &format!("{}/a.jar", server.uri()), &sha1_hex(b"fresh"))
            .await
            .unwrap();
        assert!(fetched.was_downloaded());
        assert_eq!(std::fs::read(&target).unwrap(), b"fresh");
        assert!(!temp_path_for(&target).exists());
    }

    #[tokio::test]
    async fn rejected_status_is_http_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let target = tmp.path().join("missing.jar");
        let store = ArtifactStore::new(Client::new());
        let err = store
            .fetch_verified(&target, &format!("{}/missing.jar", server.uri()), "00")
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::HttpRejection { status: 404, .. }));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_request() {
        let (tx, token) = CancelToken::pair();
        tx.send(true).unwrap();

        let tmp = tempdir().unwrap();
        let target = tmp.path().join("c.jar");
        let store = ArtifactStore::new(Client::new()).with_cancel(token);
        let err = store
            .fetch_verified(&target, "http://127.0.0.1:9/c.jar", "00")
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Cancelled));
        assert!(!temp_path_for(&target).exists());
    }

    #[tokio::test]
    async fn fetch_bytes_checks_hash() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let store = ArtifactStore::new(Client::new());
        let url = format!("{}/v.json", server.uri());
        assert_eq!(
            store.fetch_bytes(&url, Some(&sha1_hex(b"{}"))).await.unwrap(),
            b"{}"
        );
        assert!(matches!(
            store.fetch_bytes(&url, Some("deadbeef")).await,
            Err(LauncherError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_is_sha1_hex() {
        assert!(is_sha1_hex("bdf48ef6b5d0d23bbb02e17d04865216179f510a"));
        assert!(is_sha1_hex("BDF48EF6B5D0D23BBB02E17D04865216179F510A"));
        assert!(!is_sha1_hex("bdf48ef6"));
        assert!(!is_sha1_hex("../../outside/evil/00000000000000000000000"));
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_and_cleans_up() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("versions/1.20.1/1.20.1.json");
        write_atomic(&target, b"first").await.unwrap();
        write_atomic(&target, b"second").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"second");
        assert!(!temp_path_for(&target).exists());
    }
}
