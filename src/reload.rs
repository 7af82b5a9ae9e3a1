//! Live reload of the domain allow-list.
//!
//! Reload triggers (file changes, SIGHUP, or an explicit sender) are funneled
//! through one channel into a task that calls [`AllowlistStore::reload`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use crate::config::AllowlistConfig;
use crate::policy::AllowlistStore;

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Drives allow-list reloads from a trigger channel
pub struct ReloadWatcher {
    store: Arc<AllowlistStore>,
    reload_tx: mpsc::Sender<()>,
    reload_rx: mpsc::Receiver<()>,
    /// Notified after each completed reload.
    reload_complete: Arc<Notify>,
    watch_file: bool,
    sighup: bool,
}

impl ReloadWatcher {
    pub fn new(store: Arc<AllowlistStore>) -> Self {
        let (reload_tx, reload_rx) = mpsc::channel(1);
        Self {
            store,
            reload_tx,
            reload_rx,
            reload_complete: Arc::new(Notify::new()),
            watch_file: false,
            sighup: false,
        }
    }

    /// Watcher set up per `[allowlist]`. With `watch` off, only explicit
    /// triggers reload the store.
    pub fn from_config(store: Arc<AllowlistStore>, config: &AllowlistConfig) -> Self {
        let watcher = Self::new(store);
        if config.watch {
            watcher.watch_source_file().on_sighup()
        } else {
            watcher
        }
    }

    /// Reload when the store's source file is created or modified
    pub fn watch_source_file(mut self) -> Self {
        self.watch_file = true;
        self
    }

    /// Reload on SIGHUP (unix only; ignored elsewhere)
    pub fn on_sighup(mut self) -> Self {
        self.sighup = true;
        self
    }

    /// Sender that triggers a reload when `()` is sent
    pub fn trigger(&self) -> mpsc::Sender<()> {
        self.reload_tx.clone()
    }

    /// Signaled after each reload completes
    pub fn reload_complete_notify(&self) -> Arc<Notify> {
        self.reload_complete.clone()
    }

    /// Start the reload task. Must be called inside a tokio runtime.
    ///
    /// The task ends once every trigger sender has been dropped.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        let Self {
            store,
            reload_tx,
            mut reload_rx,
            reload_complete,
            watch_file,
            sighup,
        } = self;

        if watch_file {
            match store.source() {
                Some(path) => spawn_file_watcher(path.to_path_buf(), reload_tx.clone()),
                None => tracing::debug!("Allow-list has no source file to watch"),
            }
        }
        #[cfg(unix)]
        if sighup {
            spawn_sighup_handler(reload_tx.clone());
        }
        #[cfg(not(unix))]
        let _ = sighup;

        drop(reload_tx);

        tokio::spawn(async move {
            while reload_rx.recv().await.is_some() {
                let reload_store = store.clone();
                let count = match tokio::task::spawn_blocking(move || reload_store.reload()).await
                {
                    Ok(count) => count,
                    Err(e) => {
                        tracing::error!(error = %e, "Allow-list reload task failed");
                        reload_complete.notify_waiters();
                        continue;
                    }
                };
                tracing::info!(domains = count, "Allow-list reloaded");
                reload_complete.notify_waiters();
            }
            tracing::debug!("Reload channel closed");
        })
    }
}

/// Spawn a file watcher thread that sends reload triggers on file changes.
fn spawn_file_watcher(path: PathBuf, reload_tx: mpsc::Sender<()>) {
    std::thread::spawn(move || {
        use notify::{EventKind, RecursiveMode, Watcher};

        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = match notify::recommended_watcher(tx) {
            Ok(w) => w,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create domains file watcher");
                return;
            }
        };

        // Watch parent directory to catch editor save patterns (write-to-tmp + rename)
        let watch_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
            tracing::error!(
                error = %e,
                path = %watch_dir.display(),
                "Failed to watch domains directory"
            );
            return;
        }

        tracing::debug!(path = %path.display(), "Watching domains file for changes");

        let file_name = path.file_name().map(|f| f.to_owned());

        loop {
            match rx.recv() {
                Ok(Ok(event)) => {
                    if !matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        continue;
                    }

                    let is_our_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if !is_our_file {
                        continue;
                    }

                    // Debounce: drain events for a short window after a change
                    while rx.recv_timeout(DEBOUNCE).is_ok() {}

                    tracing::debug!("Domains file change detected, triggering reload");
                    if reload_tx.blocking_send(()).is_err() {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Domains file watcher error");
                }
                Err(_) => break,
            }
        }
    });
}

/// Spawn a SIGHUP handler that triggers allow-list reloads.
#[cfg(unix)]
fn spawn_sighup_handler(reload_tx: mpsc::Sender<()>) {
    tokio::spawn(async move {
        let mut signal =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGHUP handler");
                    return;
                }
            };
        while signal.recv().await.is_some() {
            tracing::info!("Received SIGHUP, triggering allow-list reload");
            if reload_tx.send(()).await.is_err() {
                break;
            }
        }
    });
}
