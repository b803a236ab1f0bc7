//! Site-specific markup and player script patterns
//!
//! Everything that depends on how the site currently lays out its watch page
//! and player script lives here. When extraction starts failing with
//! `ExtractionFailed`, this table is what needs updating; bump [`REVISION`]
//! along with it.

use regex::Regex;
use std::sync::LazyLock;

/// Revision of the pattern table, reported in debug logs
pub const REVISION: &str = "2021.06";

/// Anchors for the embedded player configuration, newest convention first.
///
/// Each anchor ends right before the opening brace of the object; the object
/// itself is cut out with a brace-balanced scan.
pub static CONFIG_ANCHORS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "ytInitialPlayerResponse",
            Regex::new(r"ytInitialPlayerResponse\s*=\s*\{").unwrap(),
        ),
        (
            "ytplayer.config",
            Regex::new(r";\s*ytplayer\.config\s*=\s*\{").unwrap(),
        ),
    ]
});

/// Banner shown in place of the player for unavailable videos
pub static UNAVAILABLE_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<h1\s+id="unavailable-message"\s+class="message">\s*(.+?)\s*</h1>"#).unwrap()
});

/// Markers of an age-gated watch page
pub static AGE_GATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"og:restrictions:age|player-age-gate-content">"#).unwrap()
});

/// Signature timestamp in the embedded player page
pub static SIGNATURE_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""sts"\s*:\s*(\d+)|signatureTimestamp"?\s*:\s*(\d+)"#).unwrap()
});

/// Player script location, tried in order
pub static PLAYER_URL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r#""jsUrl"\s*:\s*"([^"]+)""#).unwrap(),
        Regex::new(r#""PLAYER_JS_URL"\s*:\s*"([^"]+)""#).unwrap(),
        Regex::new(r#""assets"\s*:\s*\{[^}]*"js"\s*:\s*"([^"]+)""#).unwrap(),
        Regex::new(r#"<script\s+src="([^"]+/base\.js)""#).unwrap(),
    ]
});

/// Call sites of the decrypt function inside the player script, tried in order
pub static DECRYPT_CALL_SITES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(
            r#"\b[cs]\s*&&\s*[adf]\.set\([^,]+\s*,\s*encodeURIComponent\s*\(\s*([a-zA-Z0-9$_]+)\("#,
        )
        .unwrap(),
        Regex::new(
            r#"\b[a-zA-Z0-9]+\s*&&\s*[a-zA-Z0-9]+\.set\([^,]+\s*,\s*encodeURIComponent\s*\(\s*([a-zA-Z0-9$_]+)\("#,
        )
        .unwrap(),
        Regex::new(r#"\bm=([a-zA-Z0-9$_]{2,})\(decodeURIComponent\(h\.s\)\)"#).unwrap(),
        Regex::new(r#"\.sig\|\|([a-zA-Z0-9$_]+)\("#).unwrap(),
        Regex::new(
            r#"(?:^|[^a-zA-Z0-9$_.])([a-zA-Z0-9$_]{2,})\s*=\s*function\(\s*a\s*\)\s*\{\s*a\s*=\s*a\.split\(\s*""\s*\)"#,
        )
        .unwrap(),
    ]
});

/// A method of the helper object: name, parameter list, body
pub static HELPER_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?([a-zA-Z0-9$_]+)["']?\s*:\s*function\s*\(([^)]*)\)\s*\{([^}]*)\}"#).unwrap()
});

/// Statement of the decrypt body calling a helper method,
/// e.g. `Wx.Ab(a,3)` or `Wx["Ab"](a,3)`
pub static HELPER_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^([a-zA-Z0-9$_]+)(?:\.([a-zA-Z0-9$_]+)|\[["']([a-zA-Z0-9$_]+)["']\])\(\s*([a-zA-Z0-9$_]+)\s*(?:,\s*(\d+)\s*)?\)$"#,
    )
    .unwrap()
});

/// Decrypt function definition for a known name.
///
/// Captures the parameter name and the body.
pub fn decrypt_function(name: &str) -> Result<Regex, regex::Error> {
    let name = regex::escape(name);
    Regex::new(&format!(
        r#"(?:function\s+{name}|(?:^|[^a-zA-Z0-9$_.]){name}\s*=\s*function)\s*\(\s*([a-zA-Z0-9$_]+)\s*\)\s*\{{([^}}]*)\}}"#,
    ))
}

/// Helper object definition for a known name; captures the object body
pub fn helper_object(name: &str) -> Result<Regex, regex::Error> {
    let name = regex::escape(name);
    Regex::new(&format!(
        r#"(?:var|let|const|[;,])\s*{name}\s*=\s*\{{((?:[^{{}}]|\{{[^{{}}]*\}})*)\}}"#,
    ))
}

/// `.reverse()` applied to the given parameter
pub fn reverse_of(param: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"^{}\.reverse\(\)$", regex::escape(param)))
}

/// `.splice(index, 1)` applied to the given parameters
pub fn splice_of(param: &str, index: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"^{}\.splice\(\s*{}\s*,\s*1\s*\)$",
        regex::escape(param),
        regex::escape(index)
    ))
}

/// First-element swap with the element at `index % length`; captures the
/// temporary written and the temporary read back
pub fn swap_of(param: &str, index: &str) -> Result<Regex, regex::Error> {
    let p = regex::escape(param);
    let i = regex::escape(index);
    Regex::new(&format!(
        r"^var\s+([a-zA-Z0-9$_]+)\s*=\s*{p}\[0\]\s*;\s*{p}\[0\]\s*=\s*{p}\[{i}\s*%\s*{p}\.length\]\s*;\s*{p}\[{i}\s*%\s*{p}\.length\]\s*=\s*([a-zA-Z0-9$_]+)$",
    ))
}

/// `X=X.split("")`, captures both sides
pub static SPLIT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([a-zA-Z0-9$_]+)\s*=\s*([a-zA-Z0-9$_]+)\.split\(\s*(?:""|'')\s*\)$"#).unwrap()
});

/// `return X.join("")`
pub static JOIN_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^return\s+([a-zA-Z0-9$_]+)\.join\(\s*(?:""|'')\s*\)$"#).unwrap()
});
