// src/checker/mod.rs
// =============================================================================
// This module contains all link checking logic.
//
// Submodules:
// - status:   the StatusRecord every check produces
// - taxonomy: labels for HTTP and pseudo status codes
// - schemes:  the non-HTTP URI scheme list
// - classify: check_link, the decision pipeline for one href
// - http:     the single outbound request behind a remote check
// - oembed:   video watch links checked through their oEmbed endpoint
// - hooks:    rewriter / post-processor extension points
// - local:    same-origin links resolved without a request
// - omits:    omitted links and pages
// - html:     link extraction from HTML pages
// =============================================================================

mod classify;
mod hooks;
mod html;
mod http;
mod local;
mod oembed;
mod omits;
mod schemes;
mod status;
pub mod taxonomy;

pub use classify::LinkClassifier;
pub use hooks::{LinkRewriter, NoPostProcess, PartialStatus, PassThrough, PreCheck, StatusPostProcessor};
pub use html::{decode_markup_href, extract_links, extract_page_links, sanitize_link, Location, PageLinks};
pub use http::{RemoteChecker, INVALID_URL_MESSAGE, UNRESOLVED_HOST_MESSAGE};
pub use local::{KnownPaths, LocalResolver, NoLocalContent};
pub use oembed::oembed_url;
pub use omits::{OmitKind, Omissions};
pub use schemes::{builtin_url_schemes, scheme_of};
pub use status::{StatusRecord, StatusType, CODE_INVALID_URL, CODE_NO_RESPONSE};
