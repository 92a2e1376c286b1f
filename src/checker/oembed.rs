// src/checker/oembed.rs
// =============================================================================
// Video-host link rewriting.
//
// A HEAD on a YouTube watch page answers 200 even when the video has been
// removed. The oEmbed endpoint does not: it answers 404 (or 400) for a video
// that no longer exists. Watch links are therefore checked through oEmbed.
//
// Recognised forms:
//   https://www.youtube.com/watch?v=ID
//   https://m.youtube.com/watch?v=ID
//   https://youtu.be/ID
//   https://www.youtube.com/shorts/ID
//   https://www.youtube.com/embed/ID
//   https://www.youtube.com/live/ID
// =============================================================================

use url::Url;

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

const WATCH_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

// Returns the oEmbed URL to check instead of `link`, if `link` is a
// recognised video watch link.
pub fn oembed_url(link: &str) -> Option<String> {
    let parsed = Url::parse(link).ok()?;
    let id = video_id(&parsed)?;
    let watch = format!("https://www.youtube.com/watch?v={id}");
    let endpoint = Url::parse_with_params(OEMBED_ENDPOINT, &[("url", watch.as_str()), ("format", "json")]).ok()?;
    Some(endpoint.to_string())
}

fn video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();

    let candidate = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if WATCH_HOSTS.contains(&host.as_str()) {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("shorts") | Some("embed") | Some("live") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };

    candidate.filter(|id| is_video_id(id))
}

fn is_video_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
