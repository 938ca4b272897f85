//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;

use percent_encoding::percent_decode_str;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Represents an HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, HEAD, etc.)
    pub method: Method,
    /// The raw request target, including any query string
    pub path: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers, keyed by the name as sent
    pub headers: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a new HTTP request.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `path` - The raw request target
    /// * `version` - The HTTP version
    /// * `headers` - The HTTP headers
    pub fn new(method: Method, path: String, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        Self {
            method,
            path,
            version,
            headers,
        }
    }

    /// Get a header value.
    ///
    /// Header names are compared case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v)
            } else {
                None
            }
        })
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// The request path with query string and fragment removed and
    /// percent-escapes decoded.
    ///
    /// Invalid UTF-8 produced by decoding is replaced with U+FFFD.
    pub fn decoded_path(&self) -> String {
        percent_decode_str(self.raw_path()).decode_utf8_lossy().into_owned()
    }

    /// The request path as sent, without query string or fragment.
    pub fn raw_path(&self) -> &str {
        self.path
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        let without_fragment = self.path.split('#').next().unwrap_or_default();
        without_fragment.split_once('?').map(|(_, query)| query)
    }
}

/// Find the end of the header block.
///
/// Returns the index just past the blank line that terminates the headers,
/// accepting both CRLF and bare LF line endings.
pub fn find_header_end(input: &[u8]) -> Option<usize> {
    let crlf = input.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4);
    let lf = input.windows(2).position(|w| w == b"\n\n").map(|i| i + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Parse an HTTP request from a byte slice.
///
/// Anything after the header block is ignored.
///
/// # Examples
///
/// ```
/// use devserve::parse_request;
///
/// let request = parse_request(b"GET /clip.mp4 HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
/// assert_eq!(request.method.to_string(), "GET");
/// assert_eq!(request.decoded_path(), "/clip.mp4");
/// ```
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let head = match find_header_end(input) {
        Some(end) => &input[..end],
        None => input,
    };

    // Convert the header block to a string
    let input_str = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(_) => return Err(Error::MalformedRequestLine("Invalid UTF-8".to_string())),
    };

    let mut lines = input_str.lines();

    // Parse the request line
    let request_line = match lines.next() {
        Some(line) if !line.trim().is_empty() => line,
        _ => return Err(Error::EmptyRequest),
    };

    // Split the request line into method, path, and version
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    // The version is checked first so a garbled line reports as bad syntax
    // rather than as an unsupported method.
    let version = HttpVersion::from_str(parts[2])?;
    let method = Method::from_str(parts[0])?;

    let path = parts[1].to_string();
    if !path.starts_with('/') {
        return Err(Error::InvalidPath(path));
    }

    // Parse the headers
    let mut headers = HashMap::new();
    for line in lines {
        // Empty line indicates the end of headers
        if line.is_empty() {
            break;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::InvalidHeaderFormat(line.to_string()));
        };

        headers.insert(name.trim().to_string(), value.trim().to_string());
    }

    Ok(HttpRequest::new(method, path, version, headers))
}
