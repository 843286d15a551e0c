//! Upload session
//!
//! Each accepted file is read and encoded on its own task. Tasks write back to
//! the shared item list by id only, so an item removed while its task is in
//! flight stays removed: the late update finds nothing and is dropped.

use crate::config::{UploadConfig, UploadMode};
use crate::encode::{mime_for, DataUrlEncoder};
use crate::error::UploadError;
use crate::item::{FileUploadItem, UploadId, UploadStatus};
use crate::size::format_file_size;
use crate::source::FileSource;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use stepform_schema::FileValue;
use tokio::task::JoinHandle;

/// Called with the items that passed validation in one selection or drop
pub type AcceptedCallback = Arc<dyn Fn(&[FileUploadItem]) + Send + Sync>;

type Items = Arc<Mutex<Vec<FileUploadItem>>>;

/// Stateful manager of one batch of file selections
pub struct UploadSession {
    config: UploadConfig,
    items: Items,
    tasks: Mutex<HashMap<UploadId, JoinHandle<()>>>,
    drag_depth: Mutex<u32>,
    on_files_accepted: Option<AcceptedCallback>,
}

impl fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("config", &self.config)
            .field("items", &self.items.lock().len())
            .field("drag_active", &self.is_drag_active())
            .finish_non_exhaustive()
    }
}

impl UploadSession {
    /// Create session
    #[must_use]
    pub fn new(config: UploadConfig) -> Self {
        Self {
            config,
            items: Arc::new(Mutex::new(Vec::new())),
            tasks: Mutex::new(HashMap::new()),
            drag_depth: Mutex::new(0),
            on_files_accepted: None,
        }
    }

    /// Register the acceptance callback
    #[must_use]
    pub fn with_on_files_accepted<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[FileUploadItem]) + Send + Sync + 'static,
    {
        self.on_files_accepted = Some(Arc::new(callback));
        self
    }

    /// Settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Add files from a picker
    ///
    /// Rejected files enter `error` immediately and stay listed. Accepted files
    /// start encoding concurrently. In single mode the list is replaced and only
    /// the first file is kept. Must be called from within a tokio runtime.
    pub fn select_files<I>(&self, files: I) -> Vec<UploadId>
    where
        I: IntoIterator<Item = Arc<dyn FileSource>>,
    {
        let mut files: Vec<Arc<dyn FileSource>> = files.into_iter().collect();
        if self.config.mode == UploadMode::Single {
            files.truncate(1);
            if !files.is_empty() {
                self.clear();
            }
        }

        let mut ids = Vec::with_capacity(files.len());
        let mut accepted = Vec::new();
        let mut to_encode = Vec::new();
        {
            let mut items = self.items.lock();
            for file in files {
                let mut item = FileUploadItem::new(file.name(), file.size());
                match self.check(&item) {
                    Ok(()) => {
                        tracing::debug!(id = %item.id, name = %item.name, "file accepted");
                        accepted.push(item.clone());
                        to_encode.push((item.id, file));
                    }
                    Err(e) => {
                        tracing::warn!(id = %item.id, name = %item.name, error = %e, "file rejected");
                        item.fail(e.to_string());
                    }
                }
                ids.push(item.id);
                items.push(item);
            }
        }

        let chunk_size = self.config.effective_chunk_size();
        {
            let mut tasks = self.tasks.lock();
            tasks.retain(|_, task| !task.is_finished());
            for (id, file) in to_encode {
                let handle = tokio::spawn(encode_item(id, file, Arc::clone(&self.items), chunk_size));
                tasks.insert(id, handle);
            }
        }

        if !accepted.is_empty() {
            if let Some(callback) = &self.on_files_accepted {
                callback(&accepted);
            }
        }
        ids
    }

    /// Add files from a drop; ends any drag
    pub fn drop_files<I>(&self, files: I) -> Vec<UploadId>
    where
        I: IntoIterator<Item = Arc<dyn FileSource>>,
    {
        *self.drag_depth.lock() = 0;
        self.select_files(files)
    }

    /// Pointer entered the drop zone (or one of its children)
    pub fn drag_enter(&self) {
        *self.drag_depth.lock() += 1;
    }

    /// Pointer left the drop zone (or one of its children)
    pub fn drag_leave(&self) {
        let mut depth = self.drag_depth.lock();
        *depth = depth.saturating_sub(1);
    }

    /// A drag is over the drop zone
    #[must_use]
    pub fn is_drag_active(&self) -> bool {
        *self.drag_depth.lock() > 0
    }

    /// Remove an item; its pending encode becomes a no-op
    ///
    /// Returns whether the item was present.
    pub fn remove_file(&self, id: UploadId) -> bool {
        let removed = {
            let mut items = self.items.lock();
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        };
        if let Some(task) = self.tasks.lock().remove(&id) {
            task.abort();
        }
        if removed {
            tracing::debug!(%id, "file removed");
        }
        removed
    }

    /// Remove every item
    pub fn clear(&self) {
        self.items.lock().clear();
        for (_, task) in self.tasks.lock().drain() {
            task.abort();
        }
    }

    /// Items in insertion order
    #[must_use]
    pub fn items(&self) -> Vec<FileUploadItem> {
        self.items.lock().clone()
    }

    /// One item by id
    #[must_use]
    pub fn item(&self, id: UploadId) -> Option<FileUploadItem> {
        self.items.lock().iter().find(|item| item.id == id).cloned()
    }

    /// Completed payloads in insertion order
    #[must_use]
    pub fn completed_files(&self) -> Vec<FileValue> {
        self.items
            .lock()
            .iter()
            .filter_map(FileUploadItem::to_file_value)
            .collect()
    }

    /// Some item has not reached a terminal status
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.items.lock().iter().any(|item| !item.status.is_terminal())
    }

    /// Wait until every started encode has finished
    pub async fn wait_idle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = self.tasks.lock().drain().map(|(_, task)| task).collect();
            if pending.is_empty() {
                return;
            }
            for result in futures::future::join_all(pending).await {
                if let Err(e) = result {
                    if e.is_panic() {
                        tracing::error!(error = %e, "encode task panicked");
                    }
                }
            }
        }
    }

    /// Human-readable size
    #[inline]
    #[must_use]
    pub fn format_file_size(&self, bytes: u64) -> String {
        format_file_size(bytes)
    }

    fn check(&self, item: &FileUploadItem) -> Result<(), UploadError> {
        if !self.config.allows_extension(&item.extension) {
            return Err(UploadError::TypeNotAllowed {
                extension: item.extension.clone(),
                allowed: self.config.allowed_extensions.join(", "),
            });
        }
        if let Some(limit) = self.config.max_size_bytes {
            if item.size > limit {
                return Err(UploadError::TooLarge {
                    size: item.size,
                    limit: format_file_size(limit),
                });
            }
        }
        Ok(())
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        for (_, task) in self.tasks.get_mut().drain() {
            task.abort();
        }
    }
}

/// Apply `f` to the item with `id`; false if the item is gone or `f` refused
fn update(items: &Items, id: UploadId, f: impl FnOnce(&mut FileUploadItem) -> bool) -> bool {
    items.lock().iter_mut().find(|item| item.id == id).is_some_and(f)
}

async fn encode_item(id: UploadId, source: Arc<dyn FileSource>, items: Items, chunk_size: usize) {
    if !update(&items, id, |item| item.advance(UploadStatus::Uploading, 0)) {
        return;
    }

    let bytes = match source.read().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(%id, error = %e, "file read failed");
            update(&items, id, |item| item.fail(UploadError::from(e).to_string()));
            return;
        }
    };

    let mime = mime_for(&stepform_schema::extension_of(source.name()));
    let mut encoder = DataUrlEncoder::new(mime, bytes.len());
    let total = bytes.len().max(1);
    let mut done = 0;
    for chunk in bytes.chunks(chunk_size) {
        encoder.push(chunk);
        done += chunk.len();
        // 100 is reserved for completion
        let progress = u8::try_from(done * 99 / total).unwrap_or(99);
        if !update(&items, id, |item| item.advance(UploadStatus::Uploading, progress)) {
            tracing::debug!(%id, "item removed during encode");
            return;
        }
        tokio::task::yield_now().await;
    }

    let payload = encoder.finish();
    if update(&items, id, |item| item.complete(payload)) {
        tracing::debug!(%id, status = %UploadStatus::Completed, "file encoded");
    } else {
        tracing::debug!(%id, "discarding encode result for removed item");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryFile;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const MB: u64 = 1024 * 1024;

    fn csv_json_10mb() -> UploadConfig {
        UploadConfig::new()
            .with_allowed_extensions(["csv", "json"])
            .with_max_size(10 * MB)
    }

    #[tokio::test]
    async fn oversized_file_enters_error_and_stays_listed() {
        let accepted = Arc::new(Mutex::new(0usize));
        let seen = Arc::clone(&accepted);
        let session = UploadSession::new(csv_json_10mb()).with_on_files_accepted(move |items| {
            *seen.lock() += items.len();
        });

        let big = InMemoryFile::new("big.csv", Vec::new()).with_reported_size(15 * MB);
        let ids = session.select_files([big.shared()]);
        session.wait_idle().await;

        let item = session.item(ids[0]).unwrap();
        assert_eq!(item.status, UploadStatus::Error);
        assert_eq!(item.error.as_deref(), Some("file exceeds maximum size of 10 MB"));
        assert!(item.payload.is_none());
        assert!(session.completed_files().is_empty());
        assert_eq!(*accepted.lock(), 0);
    }

    #[tokio::test]
    async fn disallowed_extension_rejected() {
        let session = UploadSession::new(csv_json_10mb());
        let ids = session.select_files([InMemoryFile::new("sheet.XLS", "x").shared()]);
        let item = session.item(ids[0]).unwrap();
        assert_eq!(item.status, UploadStatus::Error);
        assert_eq!(
            item.error.as_deref(),
            Some("file type .xls is not allowed (allowed: csv, json)")
        );
    }

    #[tokio::test]
    async fn accepted_file_completes_with_data_url() {
        let session = UploadSession::new(csv_json_10mb());
        let ids = session.select_files([InMemoryFile::new("data.csv", "a,b").shared()]);
        session.wait_idle().await;

        let item = session.item(ids[0]).unwrap();
        assert_eq!(item.status, UploadStatus::Completed);
        assert_eq!(item.progress, 100);
        assert_eq!(item.payload.as_deref(), Some("data:text/csv;base64,YSxi"));

        let files = session.completed_files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, ids[0].to_string());
    }

    #[tokio::test(start_paused = true)]
    async fn removal_mid_encode_is_final() {
        let session = UploadSession::new(csv_json_10mb());
        let slow = InMemoryFile::new("slow.csv", "a,b").with_delay(Duration::from_secs(1));
        let ids = session.select_files([slow.shared()]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.item(ids[0]).unwrap().status, UploadStatus::Uploading);

        assert!(session.remove_file(ids[0]));
        tokio::time::sleep(Duration::from_secs(5)).await;
        session.wait_idle().await;

        assert!(session.items().is_empty());
        assert!(!session.remove_file(ids[0]));
    }

    #[tokio::test]
    async fn late_encode_for_removed_item_is_dropped() {
        // Run the encode directly so no abort can intervene
        let items: Items = Arc::new(Mutex::new(Vec::new()));
        let item = FileUploadItem::new("data.csv", 3);
        let id = item.id;
        items.lock().push(item);
        items.lock().clear();

        encode_item(id, InMemoryFile::new("data.csv", "a,b").shared(), Arc::clone(&items), 3).await;
        assert!(items.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_encodes_keep_insertion_order() {
        let session = UploadSession::new(csv_json_10mb());
        let files = [("first.csv", 300), ("second.json", 100), ("third.csv", 200)]
            .map(|(name, ms)| InMemoryFile::new(name, "{}").with_delay(Duration::from_millis(ms)).shared());
        session.select_files(files);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let statuses: Vec<_> = session.items().iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![UploadStatus::Uploading, UploadStatus::Completed, UploadStatus::Uploading]
        );

        session.wait_idle().await;
        let names: Vec<_> = session.items().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["first.csv", "second.json", "third.csv"]);
        assert!(!session.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn finished_encodes_are_not_retained() {
        let session = UploadSession::new(csv_json_10mb());
        session.select_files(["a.csv", "b.csv", "c.csv"].map(|name| InMemoryFile::new(name, "x,y\n").shared()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!session.is_busy());
        assert_eq!(session.tasks.lock().len(), 3);

        session.select_files([InMemoryFile::new("d.csv", "x,y\n").with_delay(Duration::from_secs(1)).shared()]);
        assert_eq!(session.tasks.lock().len(), 1);
        session.wait_idle().await;
        assert_eq!(session.items().len(), 4);
    }

    #[tokio::test]
    async fn read_failure_isolated_to_its_item() {
        let session = UploadSession::new(csv_json_10mb());
        let ids = session.select_files([
            InMemoryFile::new("bad.csv", "x").failing("device error").shared(),
            InMemoryFile::new("good.csv", "x").shared(),
        ]);
        session.wait_idle().await;

        let bad = session.item(ids[0]).unwrap();
        assert_eq!(bad.status, UploadStatus::Error);
        assert_eq!(bad.error.as_deref(), Some("failed to read 'bad.csv': device error"));
        assert_eq!(session.item(ids[1]).unwrap().status, UploadStatus::Completed);
    }

    #[tokio::test]
    async fn duplicate_names_tracked_independently() {
        let session = UploadSession::new(csv_json_10mb());
        let ids = session.select_files([
            InMemoryFile::new("data.csv", "1").shared(),
            InMemoryFile::new("data.csv", "2").shared(),
        ]);
        assert_ne!(ids[0], ids[1]);

        session.remove_file(ids[0]);
        session.wait_idle().await;
        let remaining = session.items();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, ids[1]);
    }

    #[tokio::test]
    async fn single_mode_replaces_and_keeps_first() {
        let session = UploadSession::new(csv_json_10mb().with_mode(UploadMode::Single));
        session.select_files([InMemoryFile::new("old.csv", "1").shared()]);
        let ids = session.select_files([
            InMemoryFile::new("new.csv", "2").shared(),
            InMemoryFile::new("ignored.csv", "3").shared(),
        ]);
        session.wait_idle().await;

        assert_eq!(ids.len(), 1);
        let names: Vec<_> = session.items().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["new.csv"]);
    }

    #[tokio::test]
    async fn callback_sees_only_accepted() {
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        let session = UploadSession::new(csv_json_10mb()).with_on_files_accepted(move |items| {
            sink.lock().extend(items.iter().map(|i| i.name.clone()));
        });
        session.select_files([
            InMemoryFile::new("a.csv", "1").shared(),
            InMemoryFile::new("b.exe", "2").shared(),
        ]);
        assert_eq!(*names.lock(), vec!["a.csv".to_string()]);
    }

    #[tokio::test]
    async fn drag_state_nests_and_drop_clears() {
        let session = UploadSession::new(UploadConfig::new());
        session.drag_enter();
        session.drag_enter();
        session.drag_leave();
        assert!(session.is_drag_active());
        session.drop_files([InMemoryFile::new("a.csv", "1").shared()]);
        assert!(!session.is_drag_active());
        session.drag_leave();
        assert!(!session.is_drag_active());
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_monotonic() {
        let session = UploadSession::new(UploadConfig::new().with_chunk_size(3));
        let bytes = vec![b'x'; 300];
        let ids = session.select_files([InMemoryFile::new("big.csv", bytes).shared()]);

        let mut last = 0;
        while session.is_busy() {
            let progress = session.item(ids[0]).unwrap().progress;
            assert!(progress >= last);
            last = progress;
            tokio::task::yield_now().await;
        }
        assert_eq!(session.item(ids[0]).unwrap().progress, 100);
    }
}
