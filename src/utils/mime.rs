//! MIME type helpers for declared stream types
//!
//! The site declares types with parameters, e.g.
//! `video/mp4; codecs="avc1.640028"`.

/// MIME type without parameters, lowercased
pub fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Codec list from the `codecs` parameter, if declared
pub fn codecs(mime_type: &str) -> Vec<String> {
    mime_type
        .split(';')
        .skip(1)
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            (key.trim() == "codecs").then(|| value.trim().trim_matches('"').to_string())
        })
        .flat_map(|list| {
            list.split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Get file extension from MIME type
pub fn ext_from_mime(mime_type: &str) -> &'static str {
    match essence(mime_type).as_str() {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/3gpp" => "3gp",
        "video/x-flv" => "flv",
        "audio/mp4" => "m4a",
        "audio/webm" => "weba",
        "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        "audio/opus" => "opus",
        _ => "bin",
    }
}
