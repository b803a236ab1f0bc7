//! Timed text (subtitle) documents

use crate::core::Subtitle;
use crate::error::ExtractionError;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct TrackList {
    #[serde(rename = "track", default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    #[serde(rename = "@lang_code")]
    lang_code: String,
}

#[derive(Debug, Default, Deserialize)]
struct Transcript {
    #[serde(rename = "text", default)]
    lines: Vec<Line>,
}

#[derive(Debug, Deserialize)]
struct Line {
    #[serde(rename = "@start")]
    start: String,
    #[serde(rename = "@dur", default)]
    dur: Option<String>,
    #[serde(rename = "$text", default)]
    text: String,
}

/// Language codes listed in a track list document, in document order.
///
/// An empty body means the video has no subtitles.
pub fn parse_track_list(xml: &str) -> Result<Vec<String>, ExtractionError> {
    if xml.trim().is_empty() {
        return Ok(Vec::new());
    }
    let list: TrackList = quick_xml::de::from_str(xml)
        .map_err(|e| ExtractionError::MalformedSubtitles(format!("track list: {}", e)))?;

    let mut codes: Vec<String> = Vec::with_capacity(list.tracks.len());
    for track in list.tracks {
        if !track.lang_code.is_empty() && !codes.contains(&track.lang_code) {
            codes.push(track.lang_code);
        }
    }
    Ok(codes)
}

/// Subtitle lines of one language document, in document order
pub fn parse_transcript(xml: &str) -> Result<Vec<Subtitle>, ExtractionError> {
    if xml.trim().is_empty() {
        return Ok(Vec::new());
    }
    let transcript: Transcript = quick_xml::de::from_str(xml)
        .map_err(|e| ExtractionError::MalformedSubtitles(format!("transcript: {}", e)))?;

    transcript
        .lines
        .into_iter()
        .map(|line| {
            let start_seconds = seconds(&line.start)?;
            let duration_seconds = line.dur.as_deref().map(seconds).transpose()?.unwrap_or(0.0);
            Ok(Subtitle {
                start_seconds,
                duration_seconds,
                text: line.text.trim().to_string(),
            })
        })
        .collect()
}

fn seconds(value: &str) -> Result<f64, ExtractionError> {
    value
        .trim()
        .parse()
        .map_err(|_| ExtractionError::MalformedSubtitles(format!("bad time value {:?}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_list() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript_list docid="123">
  <track id="0" name="" lang_code="en" lang_original="English" lang_translated="English" lang_default="true"/>
  <track id="1" name="" lang_code="fr" lang_original="Français" lang_translated="French"/>
</transcript_list>"#;
        assert_eq!(parse_track_list(xml).unwrap(), vec!["en", "fr"]);
    }

    #[test]
    fn test_empty_track_list() {
        assert!(parse_track_list("").unwrap().is_empty());
        assert!(parse_track_list(r#"<transcript_list docid="1"></transcript_list>"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_transcript() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.5" dur="2.25">Hello &amp; welcome</text>
<text start="2.75" dur="1">second line</text>
<text start="4"></text>
</transcript>"#;
        let lines = parse_transcript(xml).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].start_seconds, 0.5);
        assert_eq!(lines[0].duration_seconds, 2.25);
        assert_eq!(lines[0].text, "Hello & welcome");
        assert_eq!(lines[1].text, "second line");
        assert_eq!(lines[2].duration_seconds, 0.0);
        assert_eq!(lines[2].text, "");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            parse_transcript(r#"<transcript><text start="abc">x</text></transcript>"#),
            Err(ExtractionError::MalformedSubtitles(_))
        ));
        assert!(matches!(
            parse_track_list("<transcript_list><track"),
            Err(ExtractionError::MalformedSubtitles(_))
        ));
    }
}
