//! Where CSV text comes from.
//!
//! The runner only ever asks for a file by name. Whether the answer comes
//! from disk right away or after a suspended fetch is the source's business.

use crate::error::{RigError, RigResult};
use futures::future::{self, BoxFuture, FutureExt};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Blocking fetch.
pub trait TextSource {
    fn fetch_text(&self, name: &str) -> RigResult<String>;
}

/// Suspending fetch, for platforms where data files arrive asynchronously.
pub trait AsyncTextSource {
    fn fetch_text<'a>(&'a self, name: &'a str) -> BoxFuture<'a, RigResult<String>>;
}

/// Reads `<root>/<name>` from disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path { &self.root }

    fn read(&self, name: &str) -> RigResult<String> {
        let path = self.root.join(name);
        std::fs::read_to_string(&path).map_err(|source| RigError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl TextSource for DirSource {
    fn fetch_text(&self, name: &str) -> RigResult<String> {
        self.read(name)
    }
}

impl AsyncTextSource for DirSource {
    fn fetch_text<'a>(&'a self, name: &'a str) -> BoxFuture<'a, RigResult<String>> {
        future::ready(self.read(name)).boxed()
    }
}

/// Named in-memory files.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self { Self::default() }

    pub fn with_file(mut self, name: &str, content: &str) -> Self {
        self.files.insert(name.to_string(), content.to_string());
        self
    }

    fn read(&self, name: &str) -> RigResult<String> {
        self.files.get(name).cloned().ok_or_else(|| RigError::FetchFailed {
            name:   name.to_string(),
            reason: "no such file".to_string(),
        })
    }
}

impl TextSource for MemorySource {
    fn fetch_text(&self, name: &str) -> RigResult<String> {
        self.read(name)
    }
}

impl AsyncTextSource for MemorySource {
    fn fetch_text<'a>(&'a self, name: &'a str) -> BoxFuture<'a, RigResult<String>> {
        async move {
            // Yield once so callers really do go through a suspension point.
            YieldOnce::default().await;
            self.read(name)
        }
        .boxed()
    }
}

#[derive(Default)]
struct YieldOnce {
    yielded: bool,
}

impl std::future::Future for YieldOnce {
    type Output = ();

    fn poll(mut self: std::pin::Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> std::task::Poll<()> {
        if self.yielded {
            std::task::Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            std::task::Poll::Pending
        }
    }
}
