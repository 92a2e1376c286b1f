// src/lib.rs
// =============================================================================
// link-notifier: finds broken links on a site's pages, records them against
// the page they were found on, and tells someone about the new ones.
//
// Modules, leaves first:
// - config:     layered settings frozen into an immutable SiteConfig
// - error:      typed errors of the storage, settings and notifier layers
// - checker:    link extraction and classification (the core)
// - cache:      TTL cache of links that recently checked good
// - db:         SQLite pool and schema
// - results:    flagged results and their lifecycle
// - omit_store: omissions added from the command line
// - notify:     log and webhook channels
// - scan:       the page scanning pipeline
// =============================================================================

pub mod cache;
pub mod checker;
pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod omit_store;
pub mod results;
pub mod scan;
