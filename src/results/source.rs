// src/results/source.rs
// =============================================================================
// Source content: the pages flagged links were found on.
//
// Re-verification asks whether a source still exists, replacement rewrites
// its markup, and delete-source removes it. DirectorySource serves a static
// site build from disk:
//
//   https://site.example/            -> <root>/index.html
//   https://site.example/blog/post/  -> <root>/blog/post/index.html
//   https://site.example/blog/post   -> <root>/blog/post/index.html,
//                                       or <root>/blog/post if that is a file
//   https://site.example/feed.xml    -> <root>/feed.xml
// =============================================================================

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use url::Url;

use crate::error::ContentError;

pub trait SourceContent: Send + Sync {
    fn exists(&self, source_url: &str) -> bool;
    fn read(&self, source_url: &str) -> Result<String, ContentError>;
    fn write(&self, source_url: &str, content: &str) -> Result<(), ContentError>;
    fn remove(&self, source_url: &str) -> Result<(), ContentError>;
}

/// A static site build on disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    // Maps a source URL to the file behind it. Paths that try to leave the
    // root ("..") map to nothing.
    fn file_for(&self, source_url: &str) -> Option<PathBuf> {
        let path = match Url::parse(source_url) {
            Ok(url) => url.path().to_string(),
            Err(_) => source_url.split(['?', '#']).next().unwrap_or_default().to_string(),
        };

        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }

        let base = self.root.join(relative);
        if path.ends_with('/') || path.is_empty() {
            return Some(base.join("index.html"));
        }
        if base.is_file() {
            return Some(base);
        }
        Some(base.join("index.html"))
    }

    fn existing_file(&self, source_url: &str) -> Result<PathBuf, ContentError> {
        self.file_for(source_url)
            .filter(|file| file.is_file())
            .ok_or_else(|| ContentError::Missing(source_url.to_string()))
    }
}

impl SourceContent for DirectorySource {
    fn exists(&self, source_url: &str) -> bool {
        self.existing_file(source_url).is_ok()
    }

    fn read(&self, source_url: &str) -> Result<String, ContentError> {
        Ok(fs::read_to_string(self.existing_file(source_url)?)?)
    }

    fn write(&self, source_url: &str, content: &str) -> Result<(), ContentError> {
        fs::write(self.existing_file(source_url)?, content)?;
        Ok(())
    }

    fn remove(&self, source_url: &str) -> Result<(), ContentError> {
        fs::remove_file(self.existing_file(source_url)?)?;
        Ok(())
    }
}

/// Used when no content directory is configured: every source is assumed to
/// exist, and nothing can be rewritten or removed.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnmanagedSource;

impl SourceContent for UnmanagedSource {
    fn exists(&self, _source_url: &str) -> bool {
        true
    }

    fn read(&self, source_url: &str) -> Result<String, ContentError> {
        Err(ContentError::Missing(format!("{source_url} (no content_root configured)")))
    }

    fn write(&self, source_url: &str, _content: &str) -> Result<(), ContentError> {
        Err(ContentError::Missing(format!("{source_url} (no content_root configured)")))
    }

    fn remove(&self, source_url: &str) -> Result<(), ContentError> {
        Err(ContentError::Missing(format!("{source_url} (no content_root configured)")))
    }
}

/// Pages held in memory, keyed by URL without a trailing slash.
#[derive(Debug, Default)]
pub struct MemorySource {
    pages: Mutex<HashMap<String, String>>,
}

impl MemorySource {
    pub fn with_pages<'a>(pages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let pages = pages
            .into_iter()
            .map(|(url, html)| (key(url), html.to_string()))
            .collect();
        Self {
            pages: Mutex::new(pages),
        }
    }

    fn with_pages_mut<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> T {
        match self.pages.lock() {
            Ok(mut pages) => f(&mut pages),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

fn key(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

impl SourceContent for MemorySource {
    fn exists(&self, source_url: &str) -> bool {
        self.with_pages_mut(|pages| pages.contains_key(&key(source_url)))
    }

    fn read(&self, source_url: &str) -> Result<String, ContentError> {
        self.with_pages_mut(|pages| pages.get(&key(source_url)).cloned())
            .ok_or_else(|| ContentError::Missing(source_url.to_string()))
    }

    fn write(&self, source_url: &str, content: &str) -> Result<(), ContentError> {
        self.with_pages_mut(|pages| match pages.get_mut(&key(source_url)) {
            Some(page) => {
                *page = content.to_string();
                Ok(())
            }
            None => Err(ContentError::Missing(source_url.to_string())),
        })
    }

    fn remove(&self, source_url: &str) -> Result<(), ContentError> {
        self.with_pages_mut(|pages| pages.remove(&key(source_url)))
            .map(|_| ())
            .ok_or_else(|| ContentError::Missing(source_url.to_string()))
    }
}
