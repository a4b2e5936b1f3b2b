use unicode_normalization::UnicodeNormalization;

/// Normalize a UTF-8 string to NFC.
pub fn normalize_nfc(input: &str) -> String {
    input.nfc().collect::<String>()
}

/// Split a logical path into NFC-normalized segments, cleaned the way a URL
/// path is cleaned against its root:
/// - both '/' and '\' separate segments; empty and "." segments are dropped
/// - ".." pops the previous segment and never climbs above the root
///
/// The empty result denotes the root itself.
pub fn clean_segments(logical: &str) -> Vec<String> {
    let n = normalize_nfc(logical);
    let mut out: Vec<String> = Vec::new();
    for seg in n.split(|c| c == '/' || c == '\\') {
        match seg {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s.to_string()),
        }
    }
    out
}

/// Logical form of cleaned segments: '/'-joined with no leading slash.
pub fn logical_string(segments: &[String]) -> String {
    segments.join("/")
}

/// Canonical mount prefix: a single leading '/', no trailing '/'. The root mount is "".
pub fn mount_prefix(mount: &str) -> String {
    let t = mount.trim_matches('/');
    if t.is_empty() {
        String::new()
    } else {
        format!("/{}", t)
    }
}

/// Strip exactly `prefix` from a request path. Returns None when the path is not under it
/// (e.g. "/downloadsx/a" for prefix "/downloads").
pub fn strip_mount<'a>(prefix: &str, request_path: &'a str) -> Option<&'a str> {
    let rest = request_path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
