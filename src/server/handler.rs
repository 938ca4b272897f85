//! Request dispatch: ordered rules in front of a fallback handler.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::parser::{HttpRequest, Method};
use crate::server::{Error, HttpResponse};

/// Type alias for a boxed future that returns a Result<HttpResponse, Error>.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

/// Type alias for a handler function that takes an HttpRequest and returns a HandlerFuture.
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> HandlerFuture + Send + Sync>;

/// Type alias for a rule predicate.
pub type PredicateFn = Arc<dyn Fn(&HttpRequest) -> bool + Send + Sync>;

/// Box an async function into a [`HandlerFn`].
pub fn handler_fn<F, Fut>(handler: F) -> HandlerFn
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    Arc::new(move |req: HttpRequest| -> HandlerFuture { Box::pin(handler(req)) })
}

/// A custom handler together with the predicate that selects it.
#[derive(Clone)]
pub struct Rule {
    /// Name used in log lines.
    pub name: String,
    /// Decides whether this rule handles a request.
    pub predicate: PredicateFn,
    /// The handler function.
    pub handler: HandlerFn,
}

impl Rule {
    /// Create a rule from an arbitrary predicate and handler.
    pub fn new<P, F, Fut>(name: impl Into<String>, predicate: P, handler: F) -> Self
    where
        P: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
            handler: handler_fn(handler),
        }
    }

    /// Create a rule matching requests whose method is in `methods` and whose
    /// decoded path ends with `suffix`.
    ///
    /// The comparison is an exact, case-sensitive suffix check.
    pub fn suffix<F, Fut>(suffix: impl Into<String>, methods: Vec<Method>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        let suffix = suffix.into();
        let name = format!("*{suffix}");
        Self::new(
            name,
            move |req: &HttpRequest| methods.contains(&req.method) && req.decoded_path().ends_with(&suffix),
            handler,
        )
    }

    /// Whether this rule handles the request.
    pub fn matches(&self, request: &HttpRequest) -> bool {
        (self.predicate)(request)
    }
}

/// Routes each request to the first matching [`Rule`], or to the fallback
/// when none matches.
///
/// Headers registered with [`Dispatcher::with_response_header`] are added to
/// every response when it is finalized, error responses included.
#[derive(Clone)]
pub struct Dispatcher {
    rules: Vec<Rule>,
    fallback: HandlerFn,
    response_headers: Vec<(String, String)>,
}

impl Dispatcher {
    /// Create a dispatcher with no rules around the given fallback.
    pub fn new<F, Fut>(fallback: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        Self {
            rules: Vec::new(),
            fallback: handler_fn(fallback),
            response_headers: Vec::new(),
        }
    }

    /// Append a rule. Rules are tried in the order they were added.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Register a header to inject into every finalized response.
    pub fn with_response_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response_headers.push((name.into(), value.into()));
        self
    }

    /// The registered rules, in matching order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run the first matching rule, or the fallback.
    pub async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        match self.rules.iter().find(|rule| rule.matches(&request)) {
            Some(rule) => {
                log::debug!("{path} handled by rule {name}", path = request.path, name = rule.name);
                (rule.handler)(request).await
            }
            None => (self.fallback)(request).await,
        }
    }

    /// Apply the injected headers. Called once per response, right before
    /// it is serialized.
    pub fn finalize(&self, mut response: HttpResponse) -> HttpResponse {
        for (name, value) in &self.response_headers {
            response.set_header(name.as_str(), value.as_str());
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::parser::HttpVersion;
    use crate::server::StatusCode;

    fn request(method: Method, path: &str) -> HttpRequest {
        HttpRequest::new(method, path.to_string(), HttpVersion::Http11, HashMap::new())
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(|_req| async { Ok(HttpResponse::new(StatusCode::Ok).with_body_string("fallback")) })
            .with_rule(Rule::suffix(".mp4", vec![Method::GET], |_req| async {
                Ok(HttpResponse::new(StatusCode::Ok).with_body_string("video"))
            }))
    }

    #[test]
    fn test_suffix_rule_is_exact() {
        let rule = Rule::suffix(".mp4", vec![Method::GET], |_req| async { Ok(HttpResponse::new(StatusCode::Ok)) });

        assert!(rule.matches(&request(Method::GET, "/clip.mp4")));
        assert!(rule.matches(&request(Method::GET, "/a/b/c.mp4")));
        assert!(rule.matches(&request(Method::GET, "/clip.mp4?t=3")));
        assert!(!rule.matches(&request(Method::GET, "/foo.mp4bar")));
        assert!(!rule.matches(&request(Method::GET, "/CLIP.MP4")));
        assert!(!rule.matches(&request(Method::HEAD, "/clip.mp4")));
    }

    #[tokio::test]
    async fn test_dispatch_prefers_matching_rule() {
        let dispatcher = dispatcher();

        let video = dispatcher.dispatch(request(Method::GET, "/clip.mp4")).await.unwrap();
        assert_eq!(video.body, b"video");

        let other = dispatcher.dispatch(request(Method::GET, "/index.html")).await.unwrap();
        assert_eq!(other.body, b"fallback");
    }

    #[tokio::test]
    async fn test_rules_are_tried_in_order() {
        let dispatcher = dispatcher().with_rule(Rule::new(
            "everything",
            |_req| true,
            |_req| async { Ok(HttpResponse::new(StatusCode::Ok).with_body_string("catch-all")) },
        ));

        assert_eq!(dispatcher.rules().len(), 2);
        let video = dispatcher.dispatch(request(Method::GET, "/clip.mp4")).await.unwrap();
        assert_eq!(video.body, b"video");
        let other = dispatcher.dispatch(request(Method::GET, "/index.html")).await.unwrap();
        assert_eq!(other.body, b"catch-all");
    }

    #[test]
    fn test_finalize_injects_headers() {
        let dispatcher = dispatcher().with_response_header("Access-Control-Allow-Origin", "*");
        let response = dispatcher.finalize(HttpResponse::new(StatusCode::NotFound));

        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
        assert_eq!(response.headers.last().map(|(k, _)| k.as_str()), Some("Access-Control-Allow-Origin"));
    }
}
