// src/checker/html.rs
// =============================================================================
// This module extracts candidate links from HTML.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Never fails: broken markup is repaired the way a browser would
// - Supports CSS selectors for finding elements
//
// Which elements count as links is configurable as (tag, attribute) pairs,
// e.g. ("a", "href"), ("img", "src"), ("iframe", "src"). The parser already
// decodes entities in attribute values, so values are returned as the
// browser sees them (minus control characters), in document order, without
// resolving them: resolution is the classifier's job.
// =============================================================================

use log::warn;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Where on the page a link was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Header,
    Content,
    Footer,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Header => "header",
            Location::Content => "content",
            Location::Footer => "footer",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "header" => Some(Location::Header),
            "content" => Some(Location::Content),
            "footer" => Some(Location::Footer),
            _ => None,
        }
    }
}

/// Links of one page split by where they appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub header: Vec<String>,
    pub content: Vec<String>,
    pub footer: Vec<String>,
}

impl PageLinks {
    pub fn len(&self) -> usize {
        self.header.len() + self.content.len() + self.footer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every link paired with its location, header first, footer last.
    pub fn into_located(self) -> Vec<(Location, String)> {
        let header = self.header.into_iter().map(|l| (Location::Header, l));
        let content = self.content.into_iter().map(|l| (Location::Content, l));
        let footer = self.footer.into_iter().map(|l| (Location::Footer, l));
        header.chain(content).chain(footer).collect()
    }
}

// Extracts all configured link attributes from an HTML document or fragment
//
// Parameters:
//   html: the markup to parse (may be invalid)
//   sources: (tag, attribute) pairs to harvest
//
// Returns: the sanitized attribute values, in document order
//
// Example:
//   html = "<a href='/docs'>Docs</a><img src='/logo.png'>"
//   sources = [("a", "href")]
//   result = ["/docs"]
pub fn extract_links(html: &str, sources: &[(String, String)]) -> Vec<String> {
    let document = Html::parse_document(html);
    collect(&document, sources)
        .into_iter()
        .map(|(_, value)| value)
        .collect()
}

// Same as extract_links, but sorts each link by the landmark it sits in:
// inside a <header> element, inside a <footer> element, or anywhere else.
pub fn extract_page_links(html: &str, sources: &[(String, String)]) -> PageLinks {
    let document = Html::parse_document(html);
    let mut page = PageLinks::default();

    for (location, value) in collect(&document, sources) {
        match location {
            Location::Header => page.header.push(value),
            Location::Content => page.content.push(value),
            Location::Footer => page.footer.push(value),
        }
    }

    page
}

// Cleans a parsed attribute value before it is checked: control characters
// (tabs, newlines, NUL, ...) inside a link are removed. A value made only of
// whitespace, tabs and newlines included, is returned as is so it stays a
// blank link rather than becoming an empty one.
pub fn sanitize_link(value: &str) -> String {
    if value.trim().is_empty() {
        return value.to_string();
    }
    value.chars().filter(|c| !c.is_control()).collect()
}

// For an href copied out of markup by hand (the `check` command): entities
// are decoded the way the parser would, then the value is sanitized.
pub fn decode_markup_href(raw: &str) -> String {
    sanitize_link(&html_escape::decode_html_entities(raw))
}

fn collect(document: &Html, sources: &[(String, String)]) -> Vec<(Location, String)> {
    let Some(selector) = build_selector(sources) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let tag = element.value().name();
            let attribute = sources
                .iter()
                .find(|(source_tag, _)| source_tag.eq_ignore_ascii_case(tag))
                .map(|(_, attribute)| attribute.as_str())?;
            let value = element.value().attr(attribute)?;
            Some((location_of(&element), sanitize_link(value)))
        })
        .collect()
}

// One combined selector ("a[href], img[src]") keeps results in document order.
// Pairs that do not form a valid selector are skipped with a warning.
fn build_selector(sources: &[(String, String)]) -> Option<Selector> {
    let parts: Vec<String> = sources
        .iter()
        .filter_map(|(tag, attribute)| {
            let part = format!("{tag}[{attribute}]");
            let valid = Selector::parse(&part).is_ok();
            if valid {
                Some(part)
            } else {
                warn!("Ignoring invalid link source <{} {}>", tag, attribute);
                None
            }
        })
        .collect();

    if parts.is_empty() {
        return None;
    }
    Selector::parse(&parts.join(", ")).ok()
}

// The nearest enclosing <header> or <footer> decides the location
fn location_of(element: &ElementRef) -> Location {
    for ancestor in element.ancestors() {
        if let Some(parent) = ancestor.value().as_element() {
            match parent.name() {
                "header" => return Location::Header,
                "footer" => return Location::Footer,
                _ => {}
            }
        }
    }
    Location::Content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(t, a)| (t.to_string(), a.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_anchor_hrefs_raw() {
        let html = r##"<a href="https://good.example/">ok</a><a href="#section">jump</a><a href="ftp://x/">file</a>"##;
        let links = extract_links(html, &sources(&[("a", "href")]));
        assert_eq!(links, vec!["https://good.example/", "#section", "ftp://x/"]);
    }

    #[test]
    fn test_extract_is_repeatable() {
        let html = r#"<p><a href="/a">A</a><a href="/b">B</a></p>"#;
        let s = sources(&[("a", "href")]);
        assert_eq!(extract_links(html, &s), extract_links(html, &s));
    }

    #[test]
    fn test_multiple_sources_keep_document_order() {
        let html = r#"
            <img src="/logo.png">
            <a href="/docs">Docs</a>
            <iframe src="https://player.example/1"></iframe>
            <video src="/clip.mp4"></video>
        "#;
        let links = extract_links(
            html,
            &sources(&[("a", "href"), ("iframe", "src"), ("img", "src")]),
        );
        assert_eq!(links, vec!["/logo.png", "/docs", "https://player.example/1"]);
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let html = r#"<div><a href="/one">one<a href='/two'>two</div></span><a href=/three>"#;
        let links = extract_links(html, &sources(&[("a", "href")]));
        assert_eq!(links, vec!["/one", "/two", "/three"]);
    }

    #[test]
    fn test_anchor_without_href_is_ignored() {
        let html = r#"<a name="top">top</a><a href="">empty</a>"#;
        let links = extract_links(html, &sources(&[("a", "href")]));
        assert_eq!(links, vec![""]);
    }

    #[test]
    fn test_sanitize_strips_controls_only() {
        assert_eq!(sanitize_link("/a?x=1&amp;y=2"), "/a?x=1&amp;y=2");
        assert_eq!(sanitize_link("https://a.example/\n\tpath"), "https://a.example/path");
        assert_eq!(sanitize_link("   "), "   ");
        assert_eq!(sanitize_link("\n\t"), "\n\t");
        assert_eq!(sanitize_link(""), "");
    }

    #[test]
    fn test_entities_are_decoded_once() {
        let html = r#"<a href="/q?x=&amp;lt;">lt</a><a href="/r?a=1&amp;amp;b=2">amp</a><a href="/s?a=1&amp;b=2">plain</a>"#;
        let links = extract_links(html, &sources(&[("a", "href")]));
        assert_eq!(links, vec!["/q?x=&lt;", "/r?a=1&amp;b=2", "/s?a=1&b=2"]);
    }

    #[test]
    fn test_blank_href_with_tabs_and_newlines_stays_blank() {
        let html = "<a href=\"\n\t\">blank</a><a href=\"   \">spaces</a>";
        let links = extract_links(html, &sources(&[("a", "href")]));
        assert_eq!(links, vec!["\n\t", "   "]);
    }

    #[test]
    fn test_decode_markup_href() {
        assert_eq!(decode_markup_href("/a?x=1&amp;y=2"), "/a?x=1&y=2");
        assert_eq!(decode_markup_href("https://a.example/&#10;path"), "https://a.example/path");
    }

    #[test]
    fn test_page_links_by_location() {
        let html = r#"
            <header><nav><a href="/home">Home</a></nav></header>
            <main><a href="/post">Post</a><a href="/other">Other</a></main>
            <footer><a href="/privacy">Privacy</a></footer>
        "#;
        let page = extract_page_links(html, &sources(&[("a", "href")]));
        assert_eq!(page.header, vec!["/home"]);
        assert_eq!(page.content, vec!["/post", "/other"]);
        assert_eq!(page.footer, vec!["/privacy"]);
        assert_eq!(page.len(), 4);

        let located = page.into_located();
        assert_eq!(located[0], (Location::Header, "/home".to_string()));
        assert_eq!(located[3], (Location::Footer, "/privacy".to_string()));
    }

    #[test]
    fn test_invalid_source_is_skipped() {
        let html = r#"<a href="/ok">ok</a>"#;
        let links = extract_links(html, &sources(&[("a", "href"), ("[[", "src")]));
        assert_eq!(links, vec!["/ok"]);
    }
}
