//! The download → decode → write pipeline.
//!
//! Every fetch carries its own completion: the result of the future, or the
//! callback handed to that particular call. Fetches through one manager (or
//! its clones) run one at a time, since they share the payload file.
//!
//! The timeout and cancellation bound the wait for a turn and the download.
//! Once the payload is on disk, decoding and writing run to completion on
//! tokio's blocking pool; a fetch whose future is dropped by then leaves the
//! table unchanged.

use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    bundle::{BUNDLE_NAME, LocalizationBundle},
    error::Error,
    options::{DocumentDirectory, ManagerOptions},
    traits::Downloader,
    types::{BundleConfig, LocalizationPayload},
};

/// Fetches translation bundles and materializes them on disk.
///
/// Cloning is cheap; clones share the downloader and take turns fetching.
#[derive(Clone)]
pub struct Manager {
    config: BundleConfig,
    options: ManagerOptions,
    downloader: Arc<dyn Downloader>,
    /// Held from the download until the table is written.
    fetch_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("config", &self.config)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Manager {
    /// Creates a manager with default options. Performs no I/O.
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        export_config_id: impl Into<String>,
        downloader: impl Downloader + 'static,
    ) -> Self {
        Self::with_options(
            base_url,
            project_id,
            export_config_id,
            downloader,
            ManagerOptions::default(),
        )
    }

    pub fn with_options(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        export_config_id: impl Into<String>,
        downloader: impl Downloader + 'static,
        options: ManagerOptions,
    ) -> Self {
        Manager {
            config: BundleConfig::new(base_url, project_id, export_config_id),
            options,
            downloader: Arc::new(downloader),
            fetch_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    /// The bundle under this manager's document directory, if it exists.
    pub fn bundle(&self) -> Option<LocalizationBundle> {
        let document_dir = self.options.document_dir.resolve()?;
        LocalizationBundle::open(document_dir.join(BUNDLE_NAME))
    }

    /// Downloads, decodes and writes the bundle. Returns the written table.
    pub async fn fetch_updated_strings(&self) -> Result<String, Error> {
        self.run(None).await
    }

    /// Like [`Manager::fetch_updated_strings`], but stops with
    /// [`Error::Cancelled`] if `token` is cancelled before the download
    /// finishes. A cancellation arriving during the write is ignored.
    pub async fn fetch_updated_strings_cancellable(
        &self,
        token: &CancellationToken,
    ) -> Result<String, Error> {
        self.run(Some(token)).await
    }

    /// Runs the fetch and reports through `on_complete` exactly once:
    /// `(Some(content), None)` on success, `(None, Some(error))` on failure.
    pub async fn fetch_updated_strings_with<F>(&self, on_complete: F)
    where
        F: FnOnce(Option<String>, Option<Error>),
    {
        match self.fetch_updated_strings().await {
            Ok(content) => on_complete(Some(content), None),
            Err(e) => on_complete(None, Some(e)),
        }
    }

    /// Starts the fetch on the current tokio runtime. Aborting the returned
    /// handle cancels it; `on_complete` is then never called.
    pub fn spawn_fetch<F>(&self, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Option<String>, Option<Error>) + Send + 'static,
    {
        let manager = self.clone();
        tokio::spawn(async move { manager.fetch_updated_strings_with(on_complete).await })
    }

    async fn run(&self, token: Option<&CancellationToken>) -> Result<String, Error> {
        let result = self.fetch(token).await;
        if let Err(e) = &result {
            warn!(
                project = %self.config.project_id,
                export_config = %self.config.export_config_id,
                error = %e,
                "Fetching updated strings failed"
            );
        }
        result
    }

    /// Applies the timeout and `token` to `work`.
    async fn bounded<T>(
        &self,
        token: Option<&CancellationToken>,
        work: impl Future<Output = Result<T, Error>>,
    ) -> Result<T, Error> {
        let timed = async {
            match self.options.timeout {
                Some(limit) => tokio::time::timeout(limit, work)
                    .await
                    .unwrap_or_else(|_| Err(Error::Timeout(limit))),
                None => work.await,
            }
        };
        match token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Fetch cancelled");
                    Err(Error::Cancelled)
                }
                result = timed => result,
            },
            None => timed.await,
        }
    }

    async fn fetch(&self, token: Option<&CancellationToken>) -> Result<String, Error> {
        let document_dir = self
            .options
            .document_dir
            .resolve()
            .ok_or(Error::StorageUnavailable)?;
        let payload_path = document_dir.join(&self.options.payload_file_name);

        let turn = self
            .bounded(token, async {
                let turn = self.fetch_lock.clone().lock_owned().await;
                debug!(
                    base_url = %self.config.base_url,
                    project = %self.config.project_id,
                    export_config = %self.config.export_config_id,
                    "Downloading localization bundle"
                );
                self.downloader
                    .download(&self.config, &payload_path)
                    .await?;
                Ok(turn)
            })
            .await?;

        // Cancelled when this future is dropped before the write completes.
        let abandoned = CancellationToken::new();
        let drop_guard = abandoned.clone().drop_guard();
        let bundle = LocalizationBundle::in_document_dir(&document_dir);
        let (language, entries, content) = tokio::task::spawn_blocking(move || {
            materialize(&payload_path, &bundle, &abandoned, turn)
        })
        .await
        .map_err(task_failure)??;
        let _ = drop_guard.disarm();

        info!(language = %language, entries, "Localization bundle updated");
        Ok(content)
    }

    /// Looks `key` up in the bundle under the platform document directory,
    /// following the system's preferred languages.
    ///
    /// Returns `key` unchanged when the bundle, the table or the key is
    /// missing. `table_name` defaults to `Localizable`; `comment` is context
    /// for translators and does not affect the lookup.
    pub fn localized_string(key: &str, table_name: Option<&str>, comment: &str) -> String {
        let _ = comment;
        match platform_bundle() {
            Some(bundle) => bundle.localized_string(key, table_name),
            None => key.to_string(),
        }
    }

    /// Looks `key` up in this manager's bundle, honouring
    /// [`ManagerOptions::preferred_languages`]. Falls back to `key`.
    pub fn localize(&self, key: &str, table_name: Option<&str>) -> String {
        let Some(bundle) = self.bundle() else {
            return key.to_string();
        };
        match &self.options.preferred_languages {
            Some(preferred) => {
                bundle.localized_string_preferring(preferred.as_slice(), key, table_name)
            }
            None => bundle.localized_string(key, table_name),
        }
    }
}

fn platform_bundle() -> Option<LocalizationBundle> {
    let document_dir: PathBuf = DocumentDirectory::Platform.resolve()?;
    LocalizationBundle::open(document_dir.join(BUNDLE_NAME))
}

/// A blocking task that panicked or was shut down; not attributable to one step.
fn task_failure(e: tokio::task::JoinError) -> Error {
    Error::Io(std::io::Error::other(format!(
        "decode/write task failed: {}",
        e
    )))
}

/// Decode and write steps, run on the blocking pool while holding the
/// manager's fetch turn.
fn materialize(
    payload_path: &Path,
    bundle: &LocalizationBundle,
    abandoned: &CancellationToken,
    _turn: OwnedMutexGuard<()>,
) -> Result<(String, usize, String), Error> {
    let payload = LocalizationPayload::read_from(payload_path)?;
    debug!(
        language = %payload.language_code,
        entries = payload.len(),
        "Decoded localization payload"
    );
    let content = bundle.write_payload_unless(&payload, || abandoned.is_cancelled())?;
    Ok((payload.language_code, payload.texts.len(), content))
}
