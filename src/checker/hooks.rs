// src/checker/hooks.rs
// =============================================================================
// Extension points around the link check.
//
// - LinkRewriter runs first and may rewrite an href, reject it, or answer with
//   a ready-made status so no check happens at all.
// - StatusPostProcessor sees every status produced by a remote check and may
//   replace it.
//
// Both default to doing nothing. They are plain traits injected at
// construction time, so a deployment plugs in its own rules without touching
// the classifier.
// =============================================================================

use super::status::{StatusRecord, StatusType};

/// What a rewriter decided about an href.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreCheck {
    /// Keep checking this (possibly rewritten) href
    Link(String),
    /// Drop the href: it is reported as omitted
    Reject,
    /// Answer with this status instead of checking
    Status(PartialStatus),
}

/// A status supplied by a rewriter. Any of `status_type`, `code` or `text`
/// may be missing, in which case the classifier reports the href as broken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialStatus {
    pub status_type: Option<StatusType>,
    pub code: Option<u16>,
    pub text: Option<String>,
    pub link: Option<String>,
}

impl PartialStatus {
    // Names of the required fields that are missing, in a stable order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.status_type.is_none() {
            missing.push("type");
        }
        if self.code.is_none() {
            missing.push("code");
        }
        if self.text.is_none() {
            missing.push("text");
        }
        missing
    }

    /// Converts into a full record when every required field is present.
    /// `fallback_link` is used when the rewriter did not name a link.
    pub fn complete(self, fallback_link: &str) -> Option<StatusRecord> {
        Some(StatusRecord {
            status_type: self.status_type?,
            code: self.code?,
            text: self.text?,
            link: self.link.unwrap_or_else(|| fallback_link.to_string()),
        })
    }
}

pub trait LinkRewriter: Send + Sync {
    fn rewrite(&self, href: &str) -> PreCheck;
}

pub trait StatusPostProcessor: Send + Sync {
    fn process(&self, status: StatusRecord) -> StatusRecord;
}

/// Leaves every href untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl LinkRewriter for PassThrough {
    fn rewrite(&self, href: &str) -> PreCheck {
        PreCheck::Link(href.to_string())
    }
}

/// Leaves every status untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPostProcess;

impl StatusPostProcessor for NoPostProcess {
    fn process(&self, status: StatusRecord) -> StatusRecord {
        status
    }
}
