// src/checker/local.rs
// =============================================================================
// Local content resolution.
//
// Same-origin and root-relative links that point at content we know exists
// are accepted without a network round trip. Anything we cannot resolve is
// still checked remotely: it may be a redirect, an archive or some other
// route the site serves without a content entry behind it.
// =============================================================================

/// Resolves a same-origin href to the id of the content it points at.
pub trait LocalResolver: Send + Sync {
    fn resolve(&self, href: &str) -> Option<u64>;
}

/// A resolver that never knows anything; every local link is checked remotely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocalContent;

impl LocalResolver for NoLocalContent {
    fn resolve(&self, _href: &str) -> Option<u64> {
        None
    }
}

/// Resolves against a fixed list of known content paths.
///
/// The id of a path is its 1-based position in the list.
#[derive(Debug, Clone, Default)]
pub struct KnownPaths {
    site_url: String,
    paths: Vec<String>,
}

impl KnownPaths {
    pub fn new(site_url: &str, paths: &[String]) -> Self {
        Self {
            site_url: site_url.trim_end_matches('/').to_string(),
            paths: paths.iter().map(|p| normalize_path(p)).collect(),
        }
    }

    // "/blog/post/?utm=1#top" and "https://site/blog/post" both become "/blog/post"
    fn path_of<'a>(&self, href: &'a str) -> Option<&'a str> {
        let rest = match href.strip_prefix(self.site_url.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with(['/', '?', '#']) => rest,
            Some(_) => return None,
            None if href.starts_with('/') && !href.starts_with("//") => href,
            None => return None,
        };
        Some(rest.split(['?', '#']).next().unwrap_or_default())
    }
}

impl LocalResolver for KnownPaths {
    fn resolve(&self, href: &str) -> Option<u64> {
        let path = normalize_path(self.path_of(href)?);
        self.paths
            .iter()
            .position(|known| *known == path)
            .map(|index| index as u64 + 1)
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
