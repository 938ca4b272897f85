//! HTTP response types and utilities.

/// HTTP status codes with their standard reason phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 200,
    MovedPermanently = 301,
    NotModified = 304,
    BadRequest = 400,
    NotFound = 404,
    InternalServerError = 500,
    NotImplemented = 501,
}

impl StatusCode {
    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }

    /// The numeric status code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Represents an HTTP response.
///
/// Headers keep their insertion order when serialized.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The HTTP status code
    pub status: StatusCode,
    /// The HTTP headers, in the order they are sent
    pub headers: Vec<(String, String)>,
    /// The response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new HTTP response with the given status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: vec![("Server".to_string(), concat!("devserve-rs/", env!("CARGO_PKG_VERSION")).to_string())],
            body: Vec::new(),
        }
    }

    /// Build the HTML error page used for 4xx and 5xx answers of the file
    /// server.
    pub fn error_page(status: StatusCode, message: &str) -> Self {
        let code = status.as_u16();
        let body = format!(
            "<!DOCTYPE HTML>\n\
             <html lang=\"en\">\n\
             \x20   <head>\n\
             \x20       <meta charset=\"utf-8\">\n\
             \x20       <title>Error response</title>\n\
             \x20   </head>\n\
             \x20   <body>\n\
             \x20       <h1>Error response</h1>\n\
             \x20       <p>Error code: {code}</p>\n\
             \x20       <p>Message: {message}.</p>\n\
             \x20       <p>Error code explanation: {code} - {reason}.</p>\n\
             \x20   </body>\n\
             </html>\n",
            message = html_escape(message),
            reason = status.reason_phrase(),
        );

        Self::new(status)
            .with_content_type("text/html;charset=utf-8")
            .with_body_string(body)
    }

    /// Set the response body with a string.
    pub fn with_body_string(self, body: impl Into<String>) -> Self {
        self.with_body_bytes(body.into().into_bytes())
    }

    /// Set the response body with bytes.
    pub fn with_body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        let content_length = self.body.len().to_string();
        self.with_header("Content-Length", content_length)
    }

    /// Add a header, or replace the value of an existing one in place.
    ///
    /// Names are matched case-insensitively; the original spelling of a
    /// replaced header is kept.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// In-place variant of [`HttpResponse::with_header`].
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some((_, existing)) => *existing = value,
            None => self.headers.push((name, value)),
        }
    }

    /// Set the content type.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Look up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Drop the body but keep every header, `Content-Length` included.
    /// Used to answer HEAD requests.
    pub fn without_body(mut self) -> Self {
        self.body = Vec::new();
        self
    }

    /// Convert the response to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.body.len() + 256);

        let status_line = format!("HTTP/1.1 {} {}\r\n", self.status.as_u16(), self.status.reason_phrase());
        bytes.extend_from_slice(status_line.as_bytes());

        for (name, value) in &self.headers {
            let header_line = format!("{name}: {value}\r\n");
            bytes.extend_from_slice(header_line.as_bytes());
        }

        // Add the empty line that separates headers from body
        bytes.extend_from_slice(b"\r\n");

        bytes.extend_from_slice(&self.body);

        bytes
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub(crate) fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_reason_phrase() {
        assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
        assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
        assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    }

    #[test]
    fn test_headers_keep_insertion_order() {
        let response = HttpResponse::new(StatusCode::Ok)
            .with_header("Content-type", "video/mp4")
            .with_header("Access-Control-Allow-Origin", "*")
            .with_header("Cache-Control", "no-cache");

        let names: Vec<&str> = response.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["Server", "Content-type", "Access-Control-Allow-Origin", "Cache-Control"]);
    }

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let response = HttpResponse::new(StatusCode::Ok)
            .with_header("Content-type", "text/plain")
            .with_content_type("video/mp4");

        assert_eq!(response.headers.len(), 2);
        assert_eq!(response.header("CONTENT-TYPE"), Some("video/mp4"));
        assert_eq!(response.headers[1].0, "Content-type");
    }

    #[test]
    fn test_without_body_keeps_content_length() {
        let response = HttpResponse::new(StatusCode::Ok)
            .with_body_bytes(vec![1, 2, 3])
            .without_body();

        assert!(response.body.is_empty());
        assert_eq!(response.header("Content-Length"), Some("3"));
    }

    #[test]
    fn test_error_page() {
        let response = HttpResponse::error_page(StatusCode::NotFound, "File <not> found");
        let body = String::from_utf8(response.body.clone()).unwrap();

        assert_eq!(response.status, StatusCode::NotFound);
        assert_eq!(response.header("Content-Type"), Some("text/html;charset=utf-8"));
        assert!(body.contains("<p>Error code: 404</p>"));
        assert!(body.contains("Message: File &lt;not&gt; found."));
    }

    #[test]
    fn test_http_response_to_bytes() {
        let response = HttpResponse::new(StatusCode::Ok)
            .with_content_type("text/plain")
            .with_body_string("Hello, world!");

        let bytes = response.to_bytes();
        let response_str = String::from_utf8_lossy(&bytes);

        assert!(response_str.starts_with("HTTP/1.1 200 OK\r\nServer: devserve-rs/"));
        assert!(response_str.contains("Content-Type: text/plain\r\nContent-Length: 13\r\n"));
        assert!(response_str.ends_with("\r\n\r\nHello, world!"));
    }
}
