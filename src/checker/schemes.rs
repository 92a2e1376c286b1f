// src/checker/schemes.rs
// =============================================================================
// URI schemes that are never checked over HTTP.
//
// An href such as mailto:, tel:, ftp: or an app deep link (spotify:, zoommtg:)
// has nothing an HTTP client could verify, so the classifier skips it as good
// before any network work happens.
//
// Sources:
// - registered schemes: https://www.iana.org/assignments/uri-schemes/uri-schemes.xhtml
// - common unregistered ones: https://en.wikipedia.org/wiki/List_of_URI_schemes
// =============================================================================

use std::collections::HashSet;

static OFFICIAL_SCHEMES: &[&str] = &[
    "aaa", "aaas", "about", "acap", "acct", "acd", "acr", "adiumxtra", "adt", "afp", "afs",
    "aim", "amss", "android", "appdata", "apt", "ar", "ark", "at", "attachment", "aw",
    "barion", "bb", "beshare", "bitcoin", "bitcoincash", "blob", "bolo", "brid", "browserext",
    "cabal", "calculator", "callto", "cap", "cast", "casts", "chrome", "chrome-extension",
    "cid", "coap", "coap+tcp", "coap+ws", "coaps", "coaps+tcp", "coaps+ws",
    "com-eventbrite-attendee", "content", "content-type", "crid", "cstr", "cvs", "dab", "dat",
    "data", "dav", "dhttp", "diaspora", "dict", "did", "dis", "dlna-playcontainer",
    "dlna-playsingle", "dns", "dntp", "doi", "dpp", "drm", "drop", "dtmi", "dtn", "dvb", "dvx",
    "dweb", "ed2k", "eid", "elsi", "embedded", "ens", "ethereum", "example", "facetime", "fax",
    "feed", "feedready", "fido", "file", "filesystem", "finger", "first-run-pen-experience",
    "fish", "fm", "ftp", "fuchsia-pkg", "geo", "gg", "git", "gitoid", "gizmoproject", "go",
    "gopher", "graph", "grd", "gtalk", "h323", "ham", "hcap", "hcp", "hxxp", "hxxps",
    "hydrazone", "hyper", "iax", "icap", "icon", "im", "imap", "info", "iotdisco", "ipfs",
    "ipn", "ipns", "ipp", "ipps", "irc", "irc6", "ircs", "iris", "iris.beep", "iris.lwz",
    "iris.xpc", "iris.xpcs", "isostore", "itms", "jabber", "jar", "jms", "keyparc", "lastfm",
    "lbry", "ldap", "ldaps", "leaptofrogans", "lid", "lorawan", "lpa", "lvlt",
    "machineProvisioningProgressReporter", "magnet", "mailserver", "mailto", "maps", "market",
    "matrix", "message", "microsoft.windows.camera", "microsoft.windows.camera.multipicker",
    "microsoft.windows.camera.picker", "mid", "mms", "modem", "mongodb", "moz", "ms-access",
    "ms-appinstaller", "ms-browser-extension", "ms-calculator", "ms-drive-to", "ms-enrollment",
    "ms-excel", "ms-eyecontrolspeech", "ms-gamebarservices", "ms-gamingoverlay",
    "ms-getoffice", "ms-help", "ms-infopath", "ms-inputapp", "ms-launchremotedesktop",
    "ms-lockscreencomponent-config", "ms-media-stream-id", "ms-meetnow",
    "ms-mixedrealitycapture", "ms-mobileplans", "ms-newsandinterests", "ms-officeapp",
    "ms-people", "ms-project", "ms-powerpoint", "ms-publisher", "ms-remotedesktop",
    "ms-remotedesktop-launch", "ms-restoretabcompanion", "ms-screenclip", "ms-screensketch",
    "ms-search", "ms-search-repair", "ms-secondary-screen-controller",
    "ms-secondary-screen-setup", "ms-settings", "ms-settings-airplanemode",
    "ms-settings-bluetooth", "ms-settings-camera", "ms-settings-cellular",
    "ms-settings-cloudstorage", "ms-settings-connectabledevices",
    "ms-settings-displays-topology", "ms-settings-emailandaccounts", "ms-settings-language",
    "ms-settings-location", "ms-settings-lock", "ms-settings-nfctransactions",
    "ms-settings-notifications", "ms-settings-power", "ms-settings-privacy",
    "ms-settings-proximity", "ms-settings-screenrotation", "ms-settings-wifi",
    "ms-settings-workplace", "ms-spd", "ms-stickers", "ms-sttoverlay", "ms-transit-to",
    "ms-useractivityset", "ms-virtualtouchpad", "ms-visio", "ms-walk-to", "ms-whiteboard",
    "ms-whiteboard-cmd", "ms-word", "msnim", "msrp", "msrps", "mss", "mt", "mtqp", "mumble",
    "mupdate", "mvn", "mvrp", "mvrps", "news", "nfs", "ni", "nih", "nntp", "notes", "num",
    "ocf", "oid", "onenote", "onenote-cmd", "opaquelocktoken", "openid", "openpgp4fpr",
    "otpauth", "p1", "pack", "palm", "paparazzi", "payment", "payto", "pkcs11", "platform",
    "pop", "pres", "prospero", "proxy", "pwid", "psyc", "pttp", "qb", "query",
    "quic-transport", "redis", "rediss", "reload", "res", "resource", "rmi", "rsync", "rtmfp",
    "rtmp", "rtsp", "rtsps", "rtspu", "sarif", "secondlife", "secret-token", "service",
    "session", "sftp", "sgn", "shc", "shttp", "sieve", "simpleledger", "simplex", "sip",
    "sips", "skype", "smb", "smp", "sms", "smtp", "snews", "snmp", "soap.beep", "soap.beeps",
    "soldat", "spiffe", "spotify", "ssb", "ssh", "starknet", "steam", "stun", "stuns",
    "submit", "svn", "swh", "swid", "swidpath", "tag", "taler", "teamspeak", "tel", "teliaeid",
    "telnet", "tftp", "things", "thismessage", "tip", "tn3270", "tool", "turn", "turns", "tv",
    "udp", "unreal", "upt", "urn", "ut2004", "uuid-in-package", "v-event", "vemmi", "ventrilo",
    "ves", "videotex", "vnc", "view-source", "vscode", "vscode-insiders", "vsls", "w3", "wais",
    "web3", "wcr", "webcal", "web+ap", "wifi", "wpid", "ws", "wss", "wtai", "wyciwyg", "xcon",
    "xcon-userid", "xfire", "xmlrpc.beep", "xmlrpc.beeps", "xmpp", "xftp", "xrcp", "xri",
    "ymsgr",
];

static UNOFFICIAL_SCHEMES: &[&str] = &[
    "admin", "app", "freeplane", "javascript", "jdbc", "msteams", "ms-spd", "odbc", "psns",
    "rdar", "s3", "trueconf", "slack", "stratum", "viber", "zoommtg", "zoomus",
];

/// The built-in denylist, lowercased and deduplicated.
///
/// Configuration may extend this set (`extra_url_schemes`) but never shrinks it.
pub fn builtin_url_schemes() -> HashSet<String> {
    OFFICIAL_SCHEMES
        .iter()
        .chain(UNOFFICIAL_SCHEMES.iter())
        .map(|scheme| scheme.to_ascii_lowercase())
        .collect()
}

// Returns the scheme of an href if it has one, lowercased.
//
// Only the text before the first ':' counts, and only when it is a valid
// scheme name (letter first, then letters, digits, '+', '-' or '.').
// "/path:x" and "a b:c" therefore have no scheme.
pub fn scheme_of(href: &str) -> Option<String> {
    let (candidate, _) = href.split_once(':')?;
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some(candidate.to_ascii_lowercase())
}
