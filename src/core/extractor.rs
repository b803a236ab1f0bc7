//! Extraction pipeline
//!
//! Drives one extraction from watch page to playable streams:
//! page → config → playability gate → cipher detection → player code →
//! signature interpretation → reconstruction → classification.
//! Every call owns its config and operation sequence; nothing is shared
//! between calls or kept after one returns.

use crate::core::{PlayerConfig, SubtitleMap};
use crate::error::{ExtractionError, RytexError, Stage, StageContext};
use crate::platform::client::{Endpoints, HttpClientConfig, HttpFetcher, PageFetcher};
use crate::platform::page::{self, ConfigExtractor};
use crate::platform::playability::{self, Playability};
use crate::platform::streams::{classify_streams, StreamReconstructor};
use crate::platform::{patterns, streams_are_ciphered, subtitles};
use crate::platform::{PlayerCodeResolver, SignatureInterpreter};
use crate::Result;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Client tag rewritten by [`Extractor::embedded_player_url`]
const WEB_CLIENT: &str = "WEB";
const EMBEDDED_PLAYER_CLIENT: &str = "ANDROID_EMBEDDED_PLAYER";

/// Single-value result of an extraction, split by failure kind
#[derive(Debug)]
pub enum ExtractionOutcome {
    Success(PlayerConfig),
    /// Transport failure; the caller may retry
    NetworkFailure(RytexError),
    OtherFailure(RytexError),
}

impl From<Result<PlayerConfig>> for ExtractionOutcome {
    fn from(result: Result<PlayerConfig>) -> Self {
        match result {
            Ok(config) => ExtractionOutcome::Success(config),
            Err(e) if e.is_retryable() => ExtractionOutcome::NetworkFailure(e),
            Err(e) => ExtractionOutcome::OtherFailure(e),
        }
    }
}

/// Stream and metadata extractor
pub struct Extractor {
    fetcher: Arc<dyn PageFetcher>,
    endpoints: Endpoints,
}

impl Extractor {
    /// Create an extractor backed by an HTTP fetcher with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create an extractor backed by an HTTP fetcher with custom settings
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        Ok(Self::with_fetcher(Arc::new(HttpFetcher::with_config(config)?)))
    }

    /// Create an extractor on top of any page fetcher
    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            endpoints: Endpoints::default(),
        }
    }

    /// Point the extractor at different endpoints
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Extract the player config of `video_id` with playable stream URLs
    pub async fn extract(&self, video_id: &str) -> Result<PlayerConfig> {
        info!("Extracting {} (patterns {})", video_id, patterns::REVISION);

        let watch_page = self.fetcher.fetch(&self.endpoints.watch_url(video_id)).await?;
        let (config, page) = if page::is_age_gated(&watch_page) {
            info!("Watch page is age-gated, using the embedded player fallback");
            self.age_gate_fallback(video_id).await?
        } else {
            let config = ConfigExtractor::new()
                .extract(&watch_page)
                .at_stage(video_id, Stage::Config)?;
            (config, watch_page)
        };

        match playability::classify(&config) {
            Playability::Unavailable(reason) => {
                return Err(RytexError::VideoUnavailable {
                    video_id: video_id.to_string(),
                    reason,
                })
            }
            Playability::LiveWithoutFormats => {
                info!("{} is live without adaptive formats, use the manifest URLs", video_id);
                return Ok(config);
            }
            Playability::Available => {}
        }

        let ciphered = streams_are_ciphered(config.streaming_data.as_ref(), config.is_live_content())
            .at_stage(video_id, Stage::CipherDetection)?;

        let config = if ciphered {
            info!("Streams are ciphered, decrypting");
            self.decrypt_streams(video_id, &page, &config).await?
        } else {
            debug!("Streams carry direct URLs");
            config
        };

        Ok(classify_streams(&config))
    }

    /// Extract and report the result as an [`ExtractionOutcome`]
    pub async fn extract_outcome(&self, video_id: &str) -> ExtractionOutcome {
        self.extract(video_id).await.into()
    }

    /// Playable URL of the first muxed stream, if any
    pub async fn muxed_url(&self, video_id: &str) -> Result<Option<String>> {
        let config = self.extract(video_id).await?;
        Ok(config
            .muxed_formats()
            .iter()
            .find_map(|descriptor| descriptor.url.clone()))
    }

    /// First muxed stream URL tagged for the embedded Android player
    pub async fn embedded_player_url(&self, video_id: &str) -> Result<Option<String>> {
        Ok(self
            .muxed_url(video_id)
            .await?
            .map(|url| rewrite_client_tag(&url)))
    }

    /// Subtitles of `video_id` keyed by language code.
    ///
    /// `Ok` with an empty map means the video has no subtitle tracks; fetch
    /// or parse failures are errors.
    pub async fn extract_subtitles(&self, video_id: &str) -> Result<SubtitleMap> {
        let list = self
            .fetcher
            .fetch(&self.endpoints.subtitle_list_url(video_id))
            .await?;
        let languages = subtitles::parse_track_list(&list).at_stage(video_id, Stage::Subtitles)?;
        if languages.is_empty() {
            info!("{} has no subtitle tracks", video_id);
            return Ok(HashMap::new());
        }
        debug!("Subtitle languages: {}", languages.join(", "));

        let tracks = try_join_all(languages.into_iter().map(|lang| async move {
            let xml = self
                .fetcher
                .fetch(&self.endpoints.subtitle_track_url(video_id, &lang))
                .await?;
            let lines = subtitles::parse_transcript(&xml).at_stage(video_id, Stage::Subtitles)?;
            Ok::<_, RytexError>((lang, lines))
        }))
        .await?;

        Ok(tracks.into_iter().collect())
    }

    /// Like [`Extractor::extract_subtitles`], but failures yield an empty map
    pub async fn extract_subtitles_or_empty(&self, video_id: &str) -> SubtitleMap {
        match self.extract_subtitles(video_id).await {
            Ok(map) => map,
            Err(e) => {
                warn!("Subtitles of {} unavailable: {}", video_id, e);
                HashMap::new()
            }
        }
    }

    /// Player config through the embedded player and legacy video info
    /// endpoint; returns the embedded player page for player code lookup
    async fn age_gate_fallback(&self, video_id: &str) -> Result<(PlayerConfig, String)> {
        let embed_page = self.fetcher.fetch(&self.endpoints.embed_url(video_id)).await?;
        let sts = page::signature_timestamp(&embed_page).at_stage(video_id, Stage::AgeGate)?;
        debug!("Signature timestamp {}", sts);

        let body = self
            .fetcher
            .fetch(&self.endpoints.video_info_url(video_id, &sts))
            .await?;
        let config = page::parse_video_info(&body).at_stage(video_id, Stage::AgeGate)?;
        Ok((config, embed_page))
    }

    async fn decrypt_streams(
        &self,
        video_id: &str,
        page: &str,
        config: &PlayerConfig,
    ) -> Result<PlayerConfig> {
        let reference = PlayerCodeResolver::new(self.fetcher.as_ref(), &self.endpoints)
            .resolve(video_id, page)
            .await?;
        let sequence = SignatureInterpreter::new()
            .compile(&reference.function_body, &reference.helper_body)
            .at_stage(video_id, Stage::Signature)?;
        info!(
            "Decrypt function {} compiled to {} operations",
            reference.function_name,
            sequence.len()
        );

        StreamReconstructor::new(&sequence)
            .reconstruct_config(config)
            .map_err(|e| {
                let stage = match e {
                    ExtractionError::SignatureDecryptionFailed(_) => Stage::Signature,
                    _ => Stage::Reconstruction,
                };
                RytexError::extraction(video_id, stage, e)
            })
    }
}

/// Rewrite the `c=WEB` client tag of a stream URL for the embedded player.
///
/// Only the `c` pair changes; every other pair keeps its exact encoding so
/// the signed parameters stay intact.
fn rewrite_client_tag(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let web = format!("c={}", WEB_CLIENT);
    let embedded = format!("c={}", EMBEDDED_PLAYER_CLIENT);

    let query = match parsed.query() {
        Some(query) if query.split('&').any(|pair| pair == web) => query
            .split('&')
            .map(|pair| if pair == web { embedded.as_str() } else { pair })
            .collect::<Vec<_>>()
            .join("&"),
        _ => return url.to_string(),
    };
    parsed.set_query(Some(&query));
    parsed.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves canned bodies by URL and records requests
    #[derive(Default)]
    struct CannedFetcher {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl CannedFetcher {
        fn with(mut self, url: String, body: &str) -> Self {
            self.pages.insert(url, body.to_string());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| RytexError::network(url, "HTTP status 404 Not Found"))
        }
    }

    const ID: &str = "dQw4w9WgXcQ";

    fn watch(endpoints: &Endpoints, config: &str) -> (String, String) {
        (
            endpoints.watch_url(ID),
            format!("<script>var ytInitialPlayerResponse = {};</script>", config),
        )
    }

    fn build(fetcher: CannedFetcher) -> (Extractor, Arc<CannedFetcher>) {
        let fetcher = Arc::new(fetcher);
        (Extractor::with_fetcher(fetcher.clone()), fetcher)
    }

    #[tokio::test]
    async fn test_direct_urls() {
        let endpoints = Endpoints::default();
        let (url, body) = watch(
            &endpoints,
            r#"{"playabilityStatus":{"status":"OK"},"streamingData":{
                "formats":[{"itag":18,"url":"https://r1/videoplayback?c=WEB&itag=18","mimeType":"video/mp4"}],
                "adaptiveFormats":[
                    {"itag":137,"url":"https://r1/137","mimeType":"video/mp4","approxDurationMs":"1000"},
                    {"itag":140,"url":"https://r1/140","mimeType":"audio/mp4","approxDurationMs":"1000"}]}}"#,
        );
        let (extractor, fetcher) = build(CannedFetcher::default().with(url, &body));

        let config = extractor.extract(ID).await.unwrap();
        let streaming = config.streaming_data.unwrap();
        assert_eq!(streaming.audio_streams.len(), 1);
        assert_eq!(streaming.video_streams.len(), 1);
        // no player script is fetched for direct URLs
        assert_eq!(fetcher.requests.lock().unwrap().len(), 1);

        assert_eq!(
            extractor.muxed_url(ID).await.unwrap().as_deref(),
            Some("https://r1/videoplayback?c=WEB&itag=18")
        );
        assert_eq!(
            extractor.embedded_player_url(ID).await.unwrap().as_deref(),
            Some("https://r1/videoplayback?c=ANDROID_EMBEDDED_PLAYER&itag=18")
        );
    }

    #[tokio::test]
    async fn test_unavailable_status() {
        let endpoints = Endpoints::default();
        let (url, body) = watch(
            &endpoints,
            r#"{"playabilityStatus":{"status":"ERROR","reason":"Video unavailable"}}"#,
        );
        let (extractor, _) = build(CannedFetcher::default().with(url, &body));

        match extractor.extract(ID).await {
            Err(RytexError::VideoUnavailable { video_id, reason }) => {
                assert_eq!(video_id, ID);
                assert_eq!(reason, "Video unavailable");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            extractor.extract_outcome(ID).await,
            ExtractionOutcome::OtherFailure(RytexError::VideoUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_live_without_formats_skips_decryption() {
        let endpoints = Endpoints::default();
        let (url, body) = watch(
            &endpoints,
            r#"{"playabilityStatus":{"status":"OK"},"videoDetails":{"isLiveContent":true},
                "streamingData":{"hlsManifestUrl":"https://m/live.m3u8"}}"#,
        );
        let (extractor, _) = build(CannedFetcher::default().with(url, &body));

        let config = extractor.extract(ID).await.unwrap();
        assert_eq!(
            config.streaming_data.unwrap().hls_manifest_url.as_deref(),
            Some("https://m/live.m3u8")
        );
    }

    #[tokio::test]
    async fn test_missing_and_empty_stream_data() {
        let endpoints = Endpoints::default();
        let (url, body) = watch(&endpoints, r#"{"playabilityStatus":{"status":"OK"}}"#);
        let (extractor, _) = build(CannedFetcher::default().with(url, &body));
        let err = extractor.extract(ID).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::CipherDetection));

        let (url, body) = watch(&endpoints, r#"{"streamingData":{"adaptiveFormats":[]}}"#);
        let (extractor, _) = build(CannedFetcher::default().with(url, &body));
        assert!(matches!(
            extractor.extract(ID).await,
            Err(RytexError::ExtractionFailed {
                source: ExtractionError::EmptyStreamList,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_network_failure_outcome() {
        let (extractor, _) = build(CannedFetcher::default());
        match extractor.extract_outcome(ID).await {
            ExtractionOutcome::NetworkFailure(e) => assert!(e.is_retryable()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_age_gate_fallback() {
        let endpoints = Endpoints::default();
        let player_response = r#"{"playabilityStatus":{"status":"OK"},"streamingData":{
            "adaptiveFormats":[{"itag":140,"url":"https://r1/140","mimeType":"audio/mp4","approxDurationMs":"5"}]}}"#;
        let fetcher = CannedFetcher::default()
            .with(
                endpoints.watch_url(ID),
                r#"<meta property="og:restrictions:age" content="18+">"#,
            )
            .with(endpoints.embed_url(ID), r#"<script>yt.setConfig({"sts":18745})</script>"#)
            .with(
                endpoints.video_info_url(ID, "18745"),
                &format!("status=ok&player_response={}", urlencoding::encode(player_response)),
            );
        let (extractor, fetcher) = build(fetcher);

        let config = extractor.extract(ID).await.unwrap();
        assert_eq!(config.streaming_data.unwrap().audio_streams.len(), 1);
        let requests = fetcher.requests.lock().unwrap();
        assert_eq!(requests[1], endpoints.embed_url(ID));
        assert!(requests[2].contains("sts=18745"));
    }

    #[tokio::test]
    async fn test_age_gate_without_player_response() {
        let endpoints = Endpoints::default();
        let fetcher = CannedFetcher::default()
            .with(endpoints.watch_url(ID), r#"<div id="player-age-gate-content">"#)
            .with(endpoints.embed_url(ID), r#"{"sts":1}"#)
            .with(endpoints.video_info_url(ID, "1"), "status=fail&reason=Restricted");
        let (extractor, _) = build(fetcher);

        let err = extractor.extract(ID).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::AgeGate));
        assert!(err.to_string().contains("Restricted"));
    }

    #[tokio::test]
    async fn test_subtitles_failure_is_distinct_from_absence() {
        let endpoints = Endpoints::default();
        let fetcher = CannedFetcher::default().with(endpoints.subtitle_list_url(ID), "");
        let (extractor, _) = build(fetcher);
        assert!(extractor.extract_subtitles(ID).await.unwrap().is_empty());

        let fetcher = CannedFetcher::default().with(
            endpoints.subtitle_list_url(ID),
            r#"<transcript_list><track id="0" lang_code="en"/></transcript_list>"#,
        );
        let (extractor, _) = build(fetcher);
        assert!(extractor.extract_subtitles(ID).await.unwrap_err().is_retryable());
        assert!(extractor.extract_subtitles_or_empty(ID).await.is_empty());

        let fetcher = CannedFetcher::default()
            .with(
                endpoints.subtitle_list_url(ID),
                r#"<transcript_list><track id="0" lang_code="en"/></transcript_list>"#,
            )
            .with(
                endpoints.subtitle_track_url(ID, "en"),
                r#"<transcript><text start="x">bad</text></transcript>"#,
            );
        let (extractor, _) = build(fetcher);
        let err = extractor.extract_subtitles(ID).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Subtitles));
    }

    #[test]
    fn test_rewrite_client_tag() {
        assert_eq!(
            rewrite_client_tag("https://r1/videoplayback?c=WEB&itag=18"),
            "https://r1/videoplayback?c=ANDROID_EMBEDDED_PLAYER&itag=18"
        );
        assert_eq!(
            rewrite_client_tag("https://r1/videoplayback?c=WEB_REMIX&itag=18"),
            "https://r1/videoplayback?c=WEB_REMIX&itag=18"
        );
        assert_eq!(rewrite_client_tag("not a url"), "not a url");
    }

    #[test]
    fn test_rewrite_client_tag_keeps_other_pairs_verbatim() {
        assert_eq!(
            rewrite_client_tag("https://r1/videoplayback?n=a%20b&c=WEB&sparams=ip%2Cid&sig=AB%2F%3D"),
            "https://r1/videoplayback?n=a%20b&c=ANDROID_EMBEDDED_PLAYER&sparams=ip%2Cid&sig=AB%2F%3D"
        );
        assert_eq!(
            rewrite_client_tag("https://r1/videoplayback?x=c%3DWEB&itag=18"),
            "https://r1/videoplayback?x=c%3DWEB&itag=18"
        );
    }
}
