//! View response type

use crate::ViewError;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use http_body_util::Full;

/// Content type of every rendered view
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const ERROR_PAGE: &str = "<!DOCTYPE html><html><head><title>Error</title></head>\
    <body><h1>500 Internal Server Error</h1>\
    <p>Template rendering failed</p></body></html>";

/// A rendered HTML document, or the error that prevented rendering
///
/// # Example
///
/// ```rust,ignore
/// async fn home(req: http::Request<Body>) -> http::Response<Full<Bytes>> {
///     let views = req.extensions().get::<ViewContext>().unwrap();
///     views
///         .render("home", &json!({ "title": "Home" }), RenderOptions::new())
///         .await
///         .unwrap_or_else(View::error)
///         .into_response()
/// }
/// ```
#[derive(Debug)]
pub struct View {
    /// The rendered HTML content
    content: Result<String, ViewError>,
    /// Status code (default 200)
    status: StatusCode,
}

impl View {
    /// Create a view from rendered HTML
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            content: Ok(html.into()),
            status: StatusCode::OK,
        }
    }

    /// Create an error view
    pub fn error(err: ViewError) -> Self {
        Self {
            content: Err(err),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Set the status code used when rendering succeeded
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// The rendered HTML, if rendering succeeded
    pub fn html(&self) -> Option<&str> {
        self.content.as_deref().ok()
    }

    /// Consume the view, returning the HTML or the render error
    pub fn into_result(self) -> Result<String, ViewError> {
        self.content
    }

    /// Build an HTML response
    ///
    /// A failed render becomes a generic 500 page; the error is logged, not
    /// shown to the client.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let (status, body) = match self.content {
            Ok(html) => (self.status, Bytes::from(html)),
            Err(err) => {
                tracing::error!("Template rendering failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Bytes::from_static(ERROR_PAGE.as_bytes()),
                )
            }
        };
        let mut response = Response::new(Full::new(body));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
        response
    }
}

impl From<Result<String, ViewError>> for View {
    fn from(result: Result<String, ViewError>) -> Self {
        match result {
            Ok(html) => Self::from_html(html),
            Err(err) => Self::error(err),
        }
    }
}

impl From<ViewError> for View {
    fn from(err: ViewError) -> Self {
        Self::error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_html_response() {
        let response = View::from_html("<p>ok</p>")
            .status(StatusCode::CREATED)
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], HTML_CONTENT_TYPE);
        assert_eq!(body_string(response).await, "<p>ok</p>");
    }

    #[tokio::test]
    async fn test_error_response_hides_details() {
        let view = View::from(Err::<String, _>(ViewError::not_found(
            "secret",
            "/srv/views/secret.html",
        )));
        assert!(view.html().is_none());

        let response = view.status(StatusCode::OK).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(body.contains("500 Internal Server Error"));
        assert!(!body.contains("/srv/views"));
    }
}
