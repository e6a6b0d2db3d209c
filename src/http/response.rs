//! Rendering translated responses and failures for the caller.

use axum::body::Body;
use axum::response::{IntoResponse, Response};

use crate::proxy::{ClientResponse, TranslateError};

impl IntoResponse for ClientResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl IntoResponse for TranslateError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
