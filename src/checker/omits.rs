// src/checker/omits.rs
// =============================================================================
// Omission lists: links and source pages an administrator never wants
// flagged.
//
// An entry matches exactly, or as a pattern when it contains `*`
// ("https://partner.example/*" omits every link on that host).
// Page entries ignore a trailing slash on either side.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::config::SiteConfig;

/// Which list an omission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OmitKind {
    Link,
    Page,
}

impl OmitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OmitKind::Link => "link",
            OmitKind::Page => "page",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Omissions {
    links: Vec<String>,
    pages: Vec<String>,
}

impl Omissions {
    pub fn new(links: Vec<String>, pages: Vec<String>) -> Self {
        Self { links, pages }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(config.omitted_links.clone(), config.omitted_pages.clone())
    }

    pub fn add(&mut self, kind: OmitKind, value: impl Into<String>) {
        let value = value.into();
        let list = match kind {
            OmitKind::Link => &mut self.links,
            OmitKind::Page => &mut self.pages,
        };
        if !list.contains(&value) {
            list.push(value);
        }
    }

    pub fn is_link_omitted(&self, link: &str) -> bool {
        self.links.iter().any(|pattern| matches(pattern, link))
    }

    pub fn is_page_omitted(&self, page: &str) -> bool {
        let page = page.trim_end_matches('/');
        self.pages
            .iter()
            .any(|pattern| matches(pattern.trim_end_matches('/'), page))
    }
}

fn matches(pattern: &str, value: &str) -> bool {
    if pattern.contains('*') {
        wildcard_match(pattern.as_bytes(), value.as_bytes())
    } else {
        pattern == value
    }
}

// Glob match where `*` stands for any run of characters (including none).
// Greedy with backtracking to the most recent star.
fn wildcard_match(pattern: &[u8], value: &[u8]) -> bool {
    let (mut p, mut v) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, v));
            p += 1;
        } else if p < pattern.len() && pattern[p] == value[v] {
            p += 1;
            v += 1;
        } else if let Some((star_p, star_v)) = star {
            p = star_p + 1;
            v = star_v + 1;
            star = Some((star_p, star_v + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}
