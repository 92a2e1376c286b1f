// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the CLI structure is described by the structs
// and enums below, and clap generates the parsing, --help and --version.
//
// Layout:
//   link-notifier [--config PATH] [--verbose] <COMMAND>
//
//   check        classify one href
//   scan         scan one page by URL
//   visit        classify the links of an HTML file (or stdin) as a page load
//   multi-scan   scan every page listed in a file
//   results      list / clear / rescan / replace / delete-source
//   omit         add a link or page to the omission lists
//   cache        purge expired entries or empty the cache
// =============================================================================

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "link-notifier",
    version,
    about = "Find, record and report broken links on a website",
    long_about = "link-notifier checks the links on your site's pages, keeps a list of the broken \
                  and warning ones with the page they were found on, and notifies you when new \
                  broken links show up."
)]
pub struct Cli {
    /// Settings file (default: ./link-notifier.toml when present)
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a single href
    ///
    /// Example: link-notifier check https://example.com/page
    Check {
        /// The href, exactly as it would appear in markup
        href: String,

        /// Output the status record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan one page of the site and record its broken links
    ///
    /// Example: link-notifier scan https://example.com/blog/post/
    Scan {
        /// URL of the page to scan
        url: String,

        /// Output the scan report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify links from already-rendered HTML, as seen on a page load
    ///
    /// Example: curl -s https://example.com/ | link-notifier visit --source https://example.com/
    Visit {
        /// The page the HTML belongs to
        #[arg(long)]
        source: String,

        /// HTML file to read (stdin when omitted)
        file: Option<PathBuf>,

        /// Id of the signed-in user who loaded the page (0 = guest)
        #[arg(long, default_value_t = 0)]
        author: u64,

        /// Output the scan report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan every page listed in a file (one URL per line, # comments)
    #[command(name = "multi-scan")]
    MultiScan {
        file: PathBuf,

        /// Output the scan reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage recorded results
    #[command(subcommand)]
    Results(ResultsCommand),

    /// Never flag a link, or never scan a page
    #[command(subcommand)]
    Omit(OmitCommand),

    /// Manage the good-link cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand, Debug)]
pub enum ResultsCommand {
    /// List recorded broken and warning links
    List {
        #[arg(long)]
        json: bool,
    },

    /// Delete a result without re-checking it
    Clear { id: i64 },

    /// Re-check one result, or all of them
    Rescan {
        /// Result id (all results when omitted)
        id: Option<i64>,
    },

    /// Rewrite the source page to use a new link, then delete the result
    Replace { id: i64, new_link: String },

    /// Delete a source page and every result found on it
    #[command(name = "delete-source")]
    DeleteSource { url: String },
}

#[derive(Subcommand, Debug)]
pub enum OmitCommand {
    /// Omit a link (exact, or a pattern with *)
    Link(OmitArgs),
    /// Omit a source page (exact, or a pattern with *)
    Page(OmitArgs),
}

#[derive(Args, Debug)]
pub struct OmitArgs {
    pub value: String,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Delete entries older than the cache TTL
    Purge,
    /// Delete every entry
    Destroy,
}
