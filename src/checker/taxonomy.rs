// src/checker/taxonomy.rs
// =============================================================================
// Reference table of status codes: label, short description and whether the
// code is an official (IANA registered) HTTP status.
//
// The table is static and immutable. Which codes count as broken or warning
// is decided by SiteConfig, not here.
//
// Codes 0 and 666 carry an empty label on purpose: for those the transport
// error message is the only useful text.
// =============================================================================

/// One row of the status-code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyEntry {
    pub code: u16,
    pub msg: &'static str,
    pub desc: &'static str,
    pub official: bool,
}

const fn entry(code: u16, msg: &'static str, desc: &'static str, official: bool) -> TaxonomyEntry {
    TaxonomyEntry { code, msg, desc, official }
}

// Sorted by code so lookups can binary search
static TAXONOMY: &[TaxonomyEntry] = &[
    entry(0, "", "No response was received from the server.", false),
    entry(100, "Continue", "The server received the request headers; the client should send the body.", true),
    entry(101, "Switching Protocols", "The server is switching protocols as requested.", true),
    entry(102, "Processing", "The server accepted the request but has not completed it.", true),
    entry(103, "Early Hints", "Preliminary headers sent before the final response.", true),
    entry(200, "OK", "The request succeeded.", true),
    entry(201, "Created", "The request succeeded and a new resource was created.", true),
    entry(202, "Accepted", "The request was accepted for processing.", true),
    entry(203, "Non-Authoritative Information", "Returned metadata comes from a third-party copy.", true),
    entry(204, "No Content", "The request succeeded with no content to return.", true),
    entry(205, "Reset Content", "The client should reset the document view.", true),
    entry(206, "Partial Content", "Only part of the resource was delivered.", true),
    entry(207, "Multi-Status", "Multiple status values for multiple operations.", true),
    entry(208, "Already Reported", "Members of a binding were already enumerated.", true),
    entry(218, "This is fine", "Apache catch-all for errors passed through by the origin.", false),
    entry(226, "IM Used", "Instance manipulations were applied to the response.", true),
    entry(300, "Multiple Choices", "Several representations are available.", true),
    entry(301, "Moved Permanently", "The resource has a new permanent URL.", true),
    entry(302, "Found", "The resource is temporarily at another URL.", true),
    entry(303, "See Other", "The response is found at another URL using GET.", true),
    entry(304, "Not Modified", "The cached copy is still valid.", true),
    entry(305, "Use Proxy", "The resource must be accessed through a proxy.", true),
    entry(306, "Switch Proxy", "No longer used.", true),
    entry(307, "Temporary Redirect", "Repeat the request at another URL with the same method.", true),
    entry(308, "Permanent Redirect", "Repeat this and all future requests at another URL.", true),
    entry(400, "Bad Request", "The server cannot process a malformed request.", true),
    entry(401, "Unauthorized", "Authentication is required.", true),
    entry(402, "Payment Required", "Reserved for payment-gated resources.", true),
    entry(403, "Forbidden or Unsecure", "The server refuses to authorize the request.", true),
    entry(404, "Not Found", "The resource could not be found.", true),
    entry(405, "Method Not Allowed", "The request method is not supported for this resource.", true),
    entry(406, "Not Acceptable", "No representation matches the Accept headers.", true),
    entry(407, "Proxy Authentication Required", "The client must authenticate with the proxy.", true),
    entry(408, "Request Timeout", "The server timed out waiting for the request.", true),
    entry(409, "Conflict", "The request conflicts with the current state of the resource.", true),
    entry(410, "Gone", "The resource was removed and will not come back.", true),
    entry(411, "Length Required", "The request did not specify a content length.", true),
    entry(412, "Precondition Failed", "A request precondition was not met.", true),
    entry(413, "Payload Too Large", "The payload is larger than allowed.", true),
    entry(414, "URI Too Long", "The URI is longer than the server will interpret.", true),
    entry(415, "Unsupported Media Type", "The media type is not supported.", true),
    entry(416, "Range Not Satisfiable", "The requested range cannot be served.", true),
    entry(417, "Expectation Failed", "The Expect header cannot be met.", true),
    entry(418, "I'm a teapot", "The server refuses to brew coffee.", true),
    entry(419, "Page Expired", "Laravel: the CSRF token is missing or expired.", false),
    entry(420, "Enhance Your Calm", "Twitter: the client is being rate limited.", false),
    entry(421, "Misdirected Request", "The request was sent to a server unable to respond.", true),
    entry(422, "Unprocessable Entity", "The request is well-formed but semantically invalid.", true),
    entry(423, "Locked", "The resource is locked.", true),
    entry(424, "Failed Dependency", "A previous request failed.", true),
    entry(425, "Too Early", "The server will not risk processing a replayed request.", true),
    entry(426, "Upgrade Required", "The client should switch protocols.", true),
    entry(428, "Precondition Required", "The request must be conditional.", true),
    entry(429, "Too Many Requests", "The client sent too many requests.", true),
    entry(430, "Request Header Fields Too Large", "Shopify: too many requests or headers too large.", false),
    entry(431, "Request Header Fields Too Large", "The request headers are too large.", true),
    entry(440, "Login Time-out", "IIS: the session has expired.", false),
    entry(444, "No Response", "nginx: the server closed the connection without a response.", false),
    entry(449, "Retry With", "IIS: the request should be retried with more information.", false),
    entry(450, "Blocked by Windows Parental Controls", "Microsoft: blocked by parental controls.", false),
    entry(451, "Unavailable For Legal Reasons", "The resource is unavailable for legal reasons.", true),
    entry(494, "Request header too large", "nginx: the request header is too large.", false),
    entry(495, "SSL Certificate Error", "nginx: the client certificate is invalid.", false),
    entry(496, "SSL Certificate Required", "nginx: a client certificate is required.", false),
    entry(497, "HTTP Request Sent to HTTPS Port", "nginx: plain HTTP sent to the HTTPS port.", false),
    entry(498, "Invalid Token", "Esri: the token is expired or invalid.", false),
    entry(499, "Client Closed Request", "nginx: the client closed the connection early.", false),
    entry(500, "Internal Server Error", "The server hit an unexpected condition.", true),
    entry(501, "Not Implemented", "The server does not support the request method.", true),
    entry(502, "Bad Gateway", "An upstream server sent an invalid response.", true),
    entry(503, "Service Unavailable", "The server is overloaded or down for maintenance.", true),
    entry(504, "Gateway Timeout", "An upstream server did not respond in time.", true),
    entry(505, "HTTP Version Not Supported", "The HTTP version is not supported.", true),
    entry(506, "Variant Also Negotiates", "Content negotiation ended in a loop.", true),
    entry(507, "Insufficient Storage", "The server cannot store the representation.", true),
    entry(508, "Loop Detected", "The server detected an infinite loop.", true),
    entry(509, "Bandwidth Limit Exceeded", "Apache/cPanel: the bandwidth limit was exceeded.", false),
    entry(510, "Not Extended", "Further extensions to the request are required.", true),
    entry(511, "Network Authentication Required", "The client must authenticate to gain network access.", true),
    entry(520, "Web Server Returned an Unknown Error", "Cloudflare: the origin returned an unexpected response.", false),
    entry(521, "Web Server Is Down", "Cloudflare: the origin refused the connection.", false),
    entry(522, "Connection Timed Out", "Cloudflare: the connection to the origin timed out.", false),
    entry(523, "Origin Is Unreachable", "Cloudflare: the origin could not be reached.", false),
    entry(524, "A Timeout Occurred", "Cloudflare: the origin did not answer in time.", false),
    entry(525, "SSL Handshake Failed", "Cloudflare: the TLS handshake with the origin failed.", false),
    entry(526, "Invalid SSL Certificate", "Cloudflare: the origin certificate could not be validated.", false),
    entry(527, "Railgun Error", "Cloudflare: the Railgun connection was interrupted.", false),
    entry(529, "Site is overloaded", "Qualys SSLLabs: the site cannot process the request.", false),
    entry(530, "Site is frozen", "Pantheon: the site has been frozen due to inactivity.", false),
    entry(598, "Network read timeout error", "Informal: a proxy timed out reading from the network.", false),
    entry(666, "", "The URL is invalid or its host could not be resolved.", false),
    entry(999, "Scanning Not Permitted", "Non-standard: the host refuses automated requests.", false),
];

/// Looks up the table row for a code.
pub fn lookup(code: u16) -> Option<&'static TaxonomyEntry> {
    TAXONOMY
        .binary_search_by_key(&code, |entry| entry.code)
        .ok()
        .map(|index| &TAXONOMY[index])
}

/// The label for a code, or None when unknown or intentionally blank.
pub fn label(code: u16) -> Option<&'static str> {
    lookup(code).map(|entry| entry.msg).filter(|msg| !msg.is_empty())
}

/// Whether a code is a real HTTP status worth linking to a reference page.
/// The two sentinels are not.
pub fn has_reference_link(code: u16) -> bool {
    code != 0 && code != 666 && lookup(code).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_unique() {
        for pair in TAXONOMY.windows(2) {
            assert!(pair[0].code < pair[1].code, "{} before {}", pair[0].code, pair[1].code);
        }
    }

    #[test]
    fn test_lookup_known_codes() {
        assert_eq!(label(404), Some("Not Found"));
        assert_eq!(label(413), Some("Payload Too Large"));
        assert!(lookup(404).unwrap().official);
        assert!(!lookup(999).unwrap().official);
    }

    #[test]
    fn test_sentinels_have_no_label() {
        assert_eq!(label(0), None);
        assert_eq!(label(666), None);
        assert!(lookup(666).is_some());
        assert!(!has_reference_link(0));
        assert!(!has_reference_link(666));
        assert!(has_reference_link(404));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(lookup(299), None);
        assert_eq!(label(299), None);
    }
}
