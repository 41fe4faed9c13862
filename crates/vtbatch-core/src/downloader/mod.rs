//! Verified artifact downloads.
//!
//! Each identifier goes REQUESTED → FETCHED (HTTP 200) → VERIFIED (SHA-256
//! of the body equals the identifier, ignoring case) → STORED. Any failed
//! step is terminal for that identifier and nothing is written. Identifiers
//! run `workers` at a time and every round's reports are yielded before the
//! next round starts.

mod outcome;

pub use outcome::{DownloadOutcome, DownloadReport};

use std::sync::Arc;

use anyhow::Result;

use crate::checksum;
use crate::identifier;
use crate::scheduler::{Rounds, WorkerPool};
use crate::storage::ArtifactStore;
use crate::transport::{Request, Transport};

#[derive(Clone)]
pub struct Downloader {
    transport: Arc<dyn Transport>,
    pool: WorkerPool,
    url: String,
    api_key: String,
    store: ArtifactStore,
}

impl Downloader {
    pub fn new(
        transport: Arc<dyn Transport>,
        pool: WorkerPool,
        url: impl Into<String>,
        api_key: impl Into<String>,
        store: ArtifactStore,
    ) -> Self {
        Self {
            transport,
            pool,
            url: url.into(),
            api_key: api_key.into(),
            store,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Prepare the download directory, then return the lazy round sequence.
    /// Empty identifiers are skipped. Fails only if the directory cannot be
    /// created, before any request is made.
    pub fn download<I, S>(
        &self,
        identifiers: I,
    ) -> Result<Rounds<String, impl FnMut(usize, Vec<String>) -> Vec<DownloadReport> + Send>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.store.ensure_dir()?;
        let ids = identifier::clean(identifiers);
        tracing::debug!(
            identifiers = ids.len(),
            workers = self.pool.workers(),
            dir = %self.store.dir().display(),
            "planned download rounds"
        );
        let downloader = self.clone();
        Ok(Rounds::new(ids, self.pool.workers(), move |round, ids: Vec<String>| {
            downloader.run_round(round, ids)
        }))
    }

    fn run_round(&self, round: usize, ids: Vec<String>) -> Vec<DownloadReport> {
        let ops: Vec<_> = ids.iter().map(|id| move || self.fetch_one(id)).collect();
        let outcomes = self.pool.run(ops);
        let reports: Vec<DownloadReport> = ids
            .iter()
            .zip(outcomes)
            .map(|(id, res)| {
                res.unwrap_or_else(|panicked| {
                    tracing::warn!(hash = %id, "{}", panicked);
                    DownloadReport::failed(id, DownloadOutcome::TransportError { status: None })
                })
            })
            .collect();
        let ok = reports.iter().filter(|r| r.outcome.is_success()).count();
        tracing::info!(round, total = reports.len(), ok, "download round complete");
        reports
    }

    /// Run the full state machine for one identifier.
    pub fn fetch_one(&self, id: &str) -> DownloadReport {
        let req = Request::get(&self.url)
            .param("apikey", &self.api_key)
            .param("hash", id);
        let resp = match self.transport.call(&req) {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(hash = %id, "download failed: {}", e);
                return DownloadReport::failed(id, DownloadOutcome::TransportError { status: None });
            }
        };
        if !resp.is_success() {
            tracing::warn!(hash = %id, status = resp.status, "download failed");
            return DownloadReport::failed(
                id,
                DownloadOutcome::TransportError {
                    status: Some(resp.status),
                },
            );
        }

        if !checksum::matches_identifier(&resp.body, id) {
            tracing::warn!(
                hash = %id,
                actual = %checksum::sha256_hex(&resp.body),
                "integrity check failed"
            );
            return DownloadReport::failed(id, DownloadOutcome::IntegrityError);
        }

        match self.store.persist(id, &resp.body) {
            Ok(path) => {
                tracing::debug!(hash = %id, bytes = resp.body.len(), "stored");
                DownloadReport {
                    identifier: id.to_string(),
                    outcome: DownloadOutcome::Success,
                    path: Some(path),
                }
            }
            Err(e) => {
                tracing::warn!(hash = %id, "storage failed: {:#}", e);
                DownloadReport::failed(id, DownloadOutcome::StorageError(format!("{:#}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTransport;
    use crate::transport::Response;
    use std::collections::HashMap;

    /// Serves `content` for whichever identifier maps to it; 404 otherwise.
    fn serving(content: HashMap<String, Vec<u8>>) -> Arc<MockTransport> {
        Arc::new(MockTransport::new(move |req| {
            let hash = req.param_value("hash").unwrap_or_default();
            Ok(match content.get(hash) {
                Some(body) => Response::new(200, body.clone()),
                None => Response::new(404, Vec::new()),
            })
        }))
    }

    fn downloader(t: Arc<MockTransport>, workers: usize, dir: &std::path::Path) -> Downloader {
        Downloader::new(
            t,
            WorkerPool::new(workers),
            "http://vt/download",
            "key",
            ArtifactStore::new(dir),
        )
    }

    #[test]
    fn verified_content_is_stored_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let body = b"MZ\x90\x00 sample".to_vec();
        let id = checksum::sha256_hex(&body).to_uppercase();
        let t = serving(HashMap::from([(id.clone(), body.clone())]));
        let d = downloader(t.clone(), 2, dir.path());

        let rounds: Vec<Vec<DownloadReport>> = d.download([id.clone()]).unwrap().collect();
        assert_eq!(rounds.len(), 1);
        let report = &rounds[0][0];
        assert_eq!(report.outcome, DownloadOutcome::Success);
        assert_eq!(report.path.as_deref(), Some(dir.path().join(&id).as_path()));
        assert_eq!(std::fs::read(dir.path().join(&id)).unwrap(), body);
        let req = t.requests().remove(0);
        assert_eq!(req.param_value("hash"), Some(id.as_str()));
        assert_eq!(req.param_value("apikey"), Some("key"));
    }

    #[test]
    fn mismatched_content_is_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let id = checksum::sha256_hex(b"expected");
        let t = serving(HashMap::from([(id.clone(), b"tampered".to_vec())]));
        let d = downloader(t, 2, dir.path());

        let report = d.fetch_one(&id);
        assert_eq!(report.outcome, DownloadOutcome::IntegrityError);
        assert!(report.path.is_none());
        assert!(!dir.path().join(&id).exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn non_200_keeps_status() {
        let dir = tempfile::tempdir().unwrap();
        let d = downloader(serving(HashMap::new()), 2, dir.path());
        let report = d.fetch_one("abcd");
        assert_eq!(report.outcome, DownloadOutcome::TransportError { status: Some(404) });
    }

    #[test]
    fn rounds_sized_by_workers_in_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let bodies: Vec<Vec<u8>> = (0..5).map(|i| format!("artifact {i}").into_bytes()).collect();
        let ids: Vec<String> = bodies.iter().map(|b| checksum::sha256_hex(b)).collect();
        let content: HashMap<String, Vec<u8>> = ids.iter().cloned().zip(bodies).collect();
        let t = serving(content);
        let d = downloader(t.clone(), 2, dir.path());

        let mut submitted = ids.clone();
        submitted.insert(2, String::new());
        let rounds: Vec<Vec<DownloadReport>> = d.download(submitted).unwrap().collect();
        let sizes: Vec<usize> = rounds.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        let order: Vec<String> = rounds.into_iter().flatten().map(|r| r.identifier).collect();
        assert_eq!(order, ids);
        assert!(t.peak_concurrency() <= 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 5);
    }

    #[test]
    fn download_creates_missing_directory_once() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("samples").join("new");
        let d = downloader(serving(HashMap::new()), 2, &dir);
        let rounds = d.download(Vec::<String>::new()).unwrap();
        assert_eq!(rounds.count(), 0);
        assert!(dir.is_dir());
    }

    #[test]
    fn directory_creation_failure_is_reported_before_requests() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let t = serving(HashMap::new());
        let d = downloader(t.clone(), 2, &blocker.join("sub"));
        assert!(d.download(["abc"]).is_err());
        assert_eq!(t.calls(), 0);
    }

    #[test]
    fn duplicate_identifiers_in_one_round_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let body: Vec<u8> = (0u8..=255).cycle().take(4 * 1024 * 1024).collect();
        let id = checksum::sha256_hex(&body);
        let t = serving(HashMap::from([(id.clone(), body.clone())]));
        let d = downloader(t, 4, dir.path());

        for _ in 0..5 {
            let rounds: Vec<Vec<DownloadReport>> =
                d.download(vec![id.clone(); 4]).unwrap().collect();
            assert_eq!(rounds.len(), 1);
            for report in &rounds[0] {
                assert_eq!(report.outcome, DownloadOutcome::Success);
            }
            assert_eq!(std::fs::read(dir.path().join(&id)).unwrap(), body);
            let names: Vec<_> = std::fs::read_dir(dir.path())
                .unwrap()
                .map(|e| e.unwrap().file_name())
                .collect();
            assert_eq!(names, vec![std::ffi::OsString::from(&id)]);
        }
    }

    #[test]
    fn storage_failure_is_an_outcome() {
        let root = tempfile::tempdir().unwrap();
        let body = b"content".to_vec();
        let id = checksum::sha256_hex(&body);
        let t = serving(HashMap::from([(id.clone(), body)]));
        // Store points at a directory that does not exist and is never created.
        let d = downloader(t, 1, &root.path().join("gone"));
        let report = d.fetch_one(&id);
        assert!(matches!(report.outcome, DownloadOutcome::StorageError(_)));
    }
}
