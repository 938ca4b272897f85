//! Ready-made dispatchers for the two server binaries.

use std::path::PathBuf;
use std::sync::Arc;

use crate::server::{video_rule, Dispatcher, StaticFiles};

/// A dispatcher that only serves static files from `root`.
pub fn static_dispatcher(root: impl Into<PathBuf>) -> Dispatcher {
    let files = Arc::new(StaticFiles::new(root));
    Dispatcher::new(move |req| {
        let files = files.clone();
        async move { files.serve(&req).await }
    })
}

/// Static files from `root`, with `Access-Control-Allow-Origin: *` added to
/// every response.
pub fn cors_dispatcher(root: impl Into<PathBuf>) -> Dispatcher {
    static_dispatcher(root).with_response_header("Access-Control-Allow-Origin", "*")
}

/// Static files from `root`, with `GET *.mp4` answered by the video handler.
pub fn video_dispatcher(root: impl Into<PathBuf>) -> Dispatcher {
    let root = root.into();
    static_dispatcher(root.clone()).with_rule(video_rule(root))
}
