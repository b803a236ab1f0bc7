//! Player script resolution
//!
//! Locates the player script referenced by a page, fetches it, and cuts
//! out the decrypt function together with its helper object.

use crate::error::{ExtractionError, RytexError, Stage, StageContext};
use crate::platform::client::{Endpoints, PageFetcher};
use crate::platform::patterns;
use tracing::{debug, info};

/// Decrypt function located inside a fetched player script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCodeReference {
    pub script_url: String,
    pub script: String,
    /// Name of the decrypt function
    pub function_name: String,
    /// Name of its array parameter
    pub param: String,
    pub function_body: String,
    /// Name of the helper object the decrypt function calls into
    pub helper_name: String,
    pub helper_body: String,
}

/// Resolves the decrypt function for a page
pub struct PlayerCodeResolver<'a> {
    fetcher: &'a dyn PageFetcher,
    endpoints: &'a Endpoints,
}

impl<'a> PlayerCodeResolver<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, endpoints: &'a Endpoints) -> Self {
        Self { fetcher, endpoints }
    }

    /// Find, fetch and dissect the player script referenced by `page`
    pub async fn resolve(
        &self,
        video_id: &str,
        page: &str,
    ) -> Result<PlayerCodeReference, RytexError> {
        let path = player_script_path(page).at_stage(video_id, Stage::PlayerCode)?;
        let script_url = self.endpoints.resolve(&path);
        info!("Fetching player script {}", script_url);

        let script = self.fetcher.fetch(&script_url).await?;
        locate_decrypt_function(script_url, script).at_stage(video_id, Stage::PlayerCode)
    }
}

/// Player script path as referenced by the page, JSON escapes removed
pub fn player_script_path(page: &str) -> Result<String, ExtractionError> {
    patterns::PLAYER_URL
        .iter()
        .find_map(|re| re.captures(page))
        .map(|caps| caps[1].replace("\\/", "/"))
        .ok_or_else(|| ExtractionError::PlayerCodeNotFound("player script url".to_string()))
}

/// Locate the decrypt function and its helper object inside `script`
pub fn locate_decrypt_function(
    script_url: String,
    script: String,
) -> Result<PlayerCodeReference, ExtractionError> {
    let function_name = patterns::DECRYPT_CALL_SITES
        .iter()
        .find_map(|re| re.captures(&script))
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ExtractionError::PlayerCodeNotFound("decrypt call site".to_string()))?;
    info!("Decrypt function is {}", function_name);

    let definition = patterns::decrypt_function(&function_name)
        .map_err(|e| ExtractionError::PlayerCodeNotFound(e.to_string()))?;
    let caps = definition.captures(&script).ok_or_else(|| {
        ExtractionError::PlayerCodeNotFound(format!("body of function {}", function_name))
    })?;
    let param = caps[1].to_string();
    let function_body = caps[2].to_string();

    let helper_name = function_body
        .split(';')
        .find_map(|statement| patterns::HELPER_CALL.captures(statement.trim()))
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            ExtractionError::PlayerCodeNotFound(format!(
                "helper object used by {}",
                function_name
            ))
        })?;

    let helper = patterns::helper_object(&helper_name)
        .map_err(|e| ExtractionError::PlayerCodeNotFound(e.to_string()))?;
    let helper_body = helper
        .captures(&script)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            ExtractionError::PlayerCodeNotFound(format!("helper object {}", helper_name))
        })?;
    debug!(
        "Helper object {} spans {} bytes",
        helper_name,
        helper_body.len()
    );

    Ok(PlayerCodeReference {
        script_url,
        script,
        function_name,
        param,
        function_body,
        helper_name,
        helper_body,
    })
}
