//! Spawned transfers and completion handlers
//!
//! Both surfaces run the transfer as a Tokio task. A [`Completion`] resolves
//! once with the task's outcome; the `*_with_completion` variants hand that
//! same outcome to an `FnOnce` handler, which therefore runs exactly once and
//! always on a runtime worker task, never on the calling thread.
//!
//! All functions here must be called from within a Tokio runtime.

use crate::blob::manager::BlobTransferClient;
use crate::blob::models::{DownloadRequest, UploadRequest};
use crate::error::{BlobRelayError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tracing::error;

/// Pending outcome of a spawned transfer.
///
/// Dropping it does not cancel the transfer.
#[must_use = "a Completion does nothing unless awaited"]
pub struct Completion<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T> Completion<T> {
    fn new(handle: JoinHandle<Result<T>>) -> Self {
        Self { handle }
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) => {
                error!("Transfer task did not complete: {}", e);
                Err(BlobRelayError::network(format!(
                    "transfer task did not complete: {e}"
                )))
            }
        })
    }
}

impl BlobTransferClient {
    /// Start an upload in the background
    pub fn spawn_upload(&self, request: UploadRequest) -> Completion<String> {
        let client = self.clone();
        Completion::new(tokio::spawn(async move { client.upload(request).await }))
    }

    /// Start a download in the background
    pub fn spawn_download(&self, request: DownloadRequest) -> Completion<Vec<u8>> {
        let client = self.clone();
        Completion::new(tokio::spawn(async move { client.download(request).await }))
    }

    /// Upload and report the outcome to `complete`.
    ///
    /// `complete` receives the blob location or the error, exactly once.
    /// A panic inside the transfer task is delivered as an error. If the
    /// runtime shuts down first, `complete` is dropped without being called.
    pub fn upload_blob_with_completion<F>(&self, request: UploadRequest, complete: F)
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        let completion = self.spawn_upload(request);
        tokio::spawn(async move { complete(completion.await) });
    }

    /// Download and report the contents or the error to `complete`, exactly once.
    pub fn download_blob_with_completion<F>(&self, request: DownloadRequest, complete: F)
    where
        F: FnOnce(Result<Vec<u8>>) + Send + 'static,
    {
        let completion = self.spawn_download(request);
        tokio::spawn(async move { complete(completion.await) });
    }
}
