//! Classification of content URLs into platform-hosted and
//! third-party-hosted origins.

use url::Url;

use crate::models::access_grant::OriginKind;

/// Host families of external video providers whose URLs embed as-is.
const VIDEO_PROVIDER_HOSTS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "wistia.com",
    "loom.com",
];

/// Host families of external audio providers.
const AUDIO_PROVIDER_HOSTS: &[&str] = &[
    "soundcloud.com",
    "spotify.com",
    "mixcloud.com",
    "audiomack.com",
];

/// Pattern-matches a URL against the known external media providers.
///
/// Total over all inputs and side-effect-free: unparseable, non-HTTP, or
/// unrecognized URLs classify as [`OriginKind::Internal`], deferring the
/// authorization decision to the issuing authority rather than guessing.
pub fn classify(raw_url: &str) -> OriginKind {
    let Ok(url) = Url::parse(raw_url) else {
        return OriginKind::Internal;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return OriginKind::Internal;
    }
    let Some(host) = url.host_str() else {
        return OriginKind::Internal;
    };

    let external = VIDEO_PROVIDER_HOSTS
        .iter()
        .chain(AUDIO_PROVIDER_HOSTS)
        .any(|provider| host_matches(host, provider));
    if external {
        OriginKind::External
    } else {
        OriginKind::Internal
    }
}

/// Exact host or any subdomain of the provider (www., open., player., ...).
fn host_matches(host: &str, provider: &str) -> bool {
    host == provider
        || (host.len() > provider.len()
            && host.ends_with(provider)
            && host.as_bytes()[host.len() - provider.len() - 1] == b'.')
}
