//! Whole-file video responses.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use tokio::fs;

use crate::parser::{HttpRequest, Method};
use crate::server::handler::Rule;
use crate::server::static_files::translate_path;
use crate::server::{Error, HttpResponse, StatusCode};

/// Path suffix that selects the video handler.
pub const VIDEO_SUFFIX: &str = ".mp4";

/// Content type sent for video files.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Serve the video named by the request path from `root`.
///
/// The whole file is read into memory and sent in one response with
/// `Cache-Control: no-cache` and a wildcard CORS header. A missing file is
/// reported as [`Error::NotFound`], any failure while reading it as
/// [`Error::IoError`].
pub async fn serve_video(root: &Path, request: &HttpRequest) -> Result<HttpResponse, Error> {
    let path = translate_path(root, &request.decoded_path());
    if !fs::try_exists(&path).await.unwrap_or(false) {
        return Err(Error::NotFound("Video file not found".to_string()));
    }

    let contents = fs::read(&path).await?;
    debug!("Sending {len} bytes of {path}", len = contents.len(), path = path.display());

    Ok(HttpResponse::new(StatusCode::Ok)
        .with_header("Content-type", VIDEO_CONTENT_TYPE)
        .with_header("Access-Control-Allow-Origin", "*")
        .with_header("Cache-Control", "no-cache")
        .with_body_bytes(contents))
}

/// A `GET *.mp4` rule backed by [`serve_video`].
pub fn video_rule(root: impl Into<PathBuf>) -> Rule {
    let root: Arc<PathBuf> = Arc::new(root.into());
    Rule::suffix(VIDEO_SUFFIX, vec![Method::GET], move |req| {
        let root = root.clone();
        async move { serve_video(&root, &req).await }
    })
}
