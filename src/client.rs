/* src/client.rs */

/// Bucket shared by every caller we cannot identify.
pub const UNKNOWN: &str = "unknown";

/// Picks the caller identity from proxy headers.
///
/// The first hop of `x-forwarded-for` wins when it is non-empty, then `x-real-ip`.
/// Anonymous callers all land in the [`UNKNOWN`] bucket.
pub fn client_key(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|ip| !ip.is_empty()))
        .unwrap_or(UNKNOWN)
        .to_string()
}

pub fn route_key(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        UNKNOWN.to_string()
    } else {
        path.to_string()
    }
}
