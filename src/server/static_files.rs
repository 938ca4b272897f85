//! Generic static file serving.
//!
//! Maps request paths onto a root directory, serves files with a content
//! type guessed from their extension, renders directory listings and
//! answers conditional GETs based on modification time.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::parser::HttpRequest;
use crate::server::response::html_escape;
use crate::server::{Error, HttpResponse, StatusCode};

/// Files tried, in order, when a directory is requested.
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Characters left unescaped in listing links.
const LINK_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Join a decoded request path onto `root`.
///
/// Empty, `.` and `..` segments are dropped, so the result never leaves
/// `root` through the path alone. Symlinks inside `root` are followed.
pub fn translate_path(root: &Path, decoded_path: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in decoded_path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        path.push(segment);
    }
    path
}

/// A static file responder rooted at a directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    /// Create a responder serving files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Answer a request. Only `GET` and `HEAD` are served.
    ///
    /// `HEAD` is answered like `GET`; the connection drops the body.
    pub async fn serve(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        if !request.method.is_retrieval() {
            return Err(Error::UnsupportedMethod(request.method.to_string()));
        }

        let decoded = request.decoded_path();
        let path = translate_path(&self.root, &decoded);
        self.respond(request, &decoded, &path).await
    }

    async fn respond(&self, request: &HttpRequest, decoded: &str, path: &Path) -> Result<HttpResponse, Error> {
        let Ok(metadata) = fs::metadata(path).await else {
            return Err(Error::NotFound("File not found".to_string()));
        };

        if metadata.is_dir() {
            if !decoded.ends_with('/') {
                return Ok(redirect_to_directory(request));
            }

            for index in INDEX_FILES {
                let candidate = path.join(index);
                if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                    return send_file(request, &candidate).await;
                }
            }

            return list_directory(path, decoded).await;
        }

        // A trailing slash names a directory; files never match it.
        if decoded.ends_with('/') {
            return Err(Error::NotFound("File not found".to_string()));
        }

        send_file(request, path).await
    }
}

/// Redirect `/dir` to `/dir/`, keeping the query string.
fn redirect_to_directory(request: &HttpRequest) -> HttpResponse {
    let mut location = format!("{}/", request.raw_path());
    if let Some(query) = request.query() {
        location.push('?');
        location.push_str(query);
    }

    HttpResponse::new(StatusCode::MovedPermanently)
        .with_header("Location", location)
        .with_header("Content-Length", "0")
}

async fn send_file(request: &HttpRequest, path: &Path) -> Result<HttpResponse, Error> {
    let mut file = match fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            debug!("Cannot open {path}: {e}", path = path.display());
            return Err(Error::NotFound("File not found".to_string()));
        }
    };

    let metadata = file.metadata().await?;
    let modified = metadata.modified().ok();

    if let Some(modified) = modified {
        if is_not_modified(request, modified) {
            return Ok(HttpResponse::new(StatusCode::NotModified));
        }
    }

    let mut contents = Vec::with_capacity(metadata.len() as usize);
    file.read_to_end(&mut contents).await?;

    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    let mut response = HttpResponse::new(StatusCode::Ok).with_content_type(content_type.to_string());
    response.set_header("Content-Length", contents.len().to_string());
    if let Some(modified) = modified {
        response.set_header("Last-Modified", httpdate::fmt_http_date(modified));
    }
    response.body = contents;

    Ok(response)
}

/// Whether `If-Modified-Since` allows answering 304.
///
/// Ignored when `If-None-Match` is present or the date does not parse.
/// Modification times are compared in whole seconds.
fn is_not_modified(request: &HttpRequest, modified: SystemTime) -> bool {
    if request.has_header("If-None-Match") {
        return false;
    }
    let Some(since) = request
        .get_header("If-Modified-Since")
        .and_then(|value| httpdate::parse_http_date(value).ok())
    else {
        return false;
    };

    let seconds = |t: SystemTime| t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    seconds(modified) <= seconds(since)
}

async fn list_directory(path: &Path, decoded: &str) -> Result<HttpResponse, Error> {
    let denied = || Error::NotFound("No permission to list directory".to_string());

    let mut read_dir = fs::read_dir(path).await.map_err(|_| denied())?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(|_| denied())? {
        let name = entry.file_name().to_string_lossy().into_owned();
        // Directories are judged through symlinks; the `@` marks the link itself.
        let is_dir = fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir());
        let is_link = entry.file_type().await.is_ok_and(|kind| kind.is_symlink());
        let link = if is_dir { format!("{name}/") } else { name.clone() };
        let display = match (is_link, is_dir) {
            (true, _) => format!("{name}@"),
            (false, true) => format!("{name}/"),
            (false, false) => name.clone(),
        };
        entries.push((name.to_lowercase(), display, link));
    }
    entries.sort();

    let title = format!("Directory listing for {}", html_escape(decoded));
    let mut body = format!(
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for (_, display, link) in &entries {
        let href = utf8_percent_encode(link, LINK_SAFE).to_string();
        body.push_str(&format!(
            "<li><a href=\"{href}\">{display}</a></li>\n",
            href = html_escape(&href),
            display = html_escape(display),
        ));
    }
    body.push_str("</ul>\n<hr>\n</body>\n</html>\n");

    Ok(HttpResponse::new(StatusCode::Ok)
        .with_content_type("text/html; charset=utf-8")
        .with_body_string(body))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::parser::{HttpVersion, Method};

    fn get(path: &str) -> HttpRequest {
        HttpRequest::new(Method::GET, path.to_string(), HttpVersion::Http11, HashMap::new())
    }

    fn body_text(response: &HttpResponse) -> String {
        String::from_utf8_lossy(&response.body).into_owned()
    }

    #[test]
    fn test_translate_path_drops_dot_segments() {
        let root = Path::new("/srv/www");
        assert_eq!(translate_path(root, "/a/b.txt"), PathBuf::from("/srv/www/a/b.txt"));
        assert_eq!(translate_path(root, "/../../etc/passwd"), PathBuf::from("/srv/www/etc/passwd"));
        assert_eq!(translate_path(root, "/./a//b/"), PathBuf::from("/srv/www/a/b"));
        assert_eq!(translate_path(root, "/"), PathBuf::from("/srv/www"));
    }

    #[tokio::test]
    async fn test_serves_file_with_guessed_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body {}").unwrap();
        let files = StaticFiles::new(dir.path());

        let response = files.serve(&get("/style.css")).await.unwrap();
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.header("Content-Type"), Some("text/css"));
        assert_eq!(response.header("Content-Length"), Some("7"));
        assert!(response.header("Last-Modified").is_some());
        assert_eq!(response.body, b"body {}");
    }

    #[tokio::test]
    async fn test_unknown_extension_is_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blob.zzqx"), [0u8, 1, 2]).unwrap();
        let files = StaticFiles::new(dir.path());

        let response = files.serve(&get("/blob.zzqx")).await.unwrap();
        assert_eq!(response.header("Content-Type"), Some("application/octet-stream"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let files = StaticFiles::new(dir.path());

        let err = files.serve(&get("/nope.txt")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m == "File not found"));
    }

    #[tokio::test]
    async fn test_trailing_slash_on_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        let files = StaticFiles::new(dir.path());

        let err = files.serve(&get("/a.txt/")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        let files = StaticFiles::new(dir.path());

        let response = files.serve(&get("/docs?page=2")).await.unwrap();
        assert_eq!(response.status, StatusCode::MovedPermanently);
        assert_eq!(response.header("Location"), Some("/docs/?page=2"));
        assert_eq!(response.header("Content-Length"), Some("0"));
    }

    #[tokio::test]
    async fn test_directory_serves_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        let files = StaticFiles::new(dir.path());

        let response = files.serve(&get("/")).await.unwrap();
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert_eq!(response.body, b"<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b file.txt"), "b").unwrap();
        std::fs::write(dir.path().join("A.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let files = StaticFiles::new(dir.path());

        let response = files.serve(&get("/")).await.unwrap();
        let body = body_text(&response);

        assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));
        assert!(body.contains("<title>Directory listing for /</title>"));
        assert!(body.contains("<li><a href=\"b%20file.txt\">b file.txt</a></li>"));
        assert!(body.contains("<li><a href=\"sub/\">sub/</a></li>"));
        let a = body.find("A.txt").unwrap();
        let b = body.find("b file.txt").unwrap();
        let sub = body.find("sub/").unwrap();
        assert!(a < b && b < sub);
    }

    #[tokio::test]
    async fn test_head_answers_like_get() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let files = StaticFiles::new(dir.path());

        let mut request = get("/a.txt");
        request.method = Method::HEAD;
        let head = files.serve(&request).await.unwrap();
        let full = files.serve(&get("/a.txt")).await.unwrap();

        assert_eq!(head.status, StatusCode::Ok);
        assert_eq!(head.headers, full.headers);
        assert_eq!(head.body, full.body);
        assert_eq!(head.header("Content-Length"), Some("5"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_is_linked_as_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "n").unwrap();
        std::os::unix::fs::symlink(dir.path().join("notes.txt"), dir.path().join("shortcut")).unwrap();
        let files = StaticFiles::new(dir.path());

        let body = body_text(&files.serve(&get("/")).await.unwrap());
        assert!(body.contains("<li><a href=\"alias/\">alias@</a></li>"), "{body}");
        assert!(body.contains("<li><a href=\"real/\">real/</a></li>"), "{body}");
        assert!(body.contains("<li><a href=\"shortcut\">shortcut@</a></li>"), "{body}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_directory_is_not_found() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through the mode bits; nothing to check then.
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let files = StaticFiles::new(dir.path());
        let result = files.serve(&get("/locked/")).await;
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m == "No permission to list directory"));
        assert_eq!(err.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn test_other_methods_are_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let files = StaticFiles::new(dir.path());

        let mut request = get("/");
        request.method = Method::POST;
        let err = files.serve(&request).await.unwrap_err();

        assert!(matches!(err, Error::UnsupportedMethod(ref m) if m == "POST"));
        assert_eq!(err.status(), StatusCode::NotImplemented);
    }

    #[tokio::test]
    async fn test_if_modified_since() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let files = StaticFiles::new(dir.path());

        let first = files.serve(&get("/a.txt")).await.unwrap();
        let last_modified = first.header("Last-Modified").unwrap().to_string();

        let mut request = get("/a.txt");
        request.headers.insert("If-Modified-Since".to_string(), last_modified.clone());
        let response = files.serve(&request).await.unwrap();
        assert_eq!(response.status, StatusCode::NotModified);
        assert!(response.body.is_empty());

        request.headers.insert("If-None-Match".to_string(), "\"abc\"".to_string());
        let response = files.serve(&request).await.unwrap();
        assert_eq!(response.status, StatusCode::Ok);

        let mut stale = get("/a.txt");
        stale.headers.insert("If-Modified-Since".to_string(), "Thu, 01 Jan 1970 00:00:00 GMT".to_string());
        let response = files.serve(&stale).await.unwrap();
        assert_eq!(response.status, StatusCode::Ok);
    }
}
