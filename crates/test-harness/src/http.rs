//! HTTP mocking utilities for dispatch testing.

use wiremock::{
    matchers::{header, method},
    Mock, MockServer, Request, ResponseTemplate,
};

/// Mock event sink for testing envelope dispatch.
///
/// Wraps a wiremock server with the mount patterns dispatch tests use:
/// a fixed-status sink, optional expected-header matching, and request
/// capture for asserting on delivered headers and bodies.
pub struct MockSink {
    server: MockServer,
}

impl MockSink {
    /// Starts a new mock sink on a random port.
    ///
    /// Also initializes test tracing so dispatch spans show up in
    /// captured test output.
    pub async fn start() -> Self {
        crate::init_tracing();
        Self { server: MockServer::start().await }
    }

    /// Returns the sink URL dispatchers should post to.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Accepts every POST with the given status code.
    pub async fn respond_with_status(&self, status: u16) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Accepts every POST with 200 OK.
    pub async fn respond_ok(&self) {
        self.respond_with_status(200).await;
    }

    /// Accepts POSTs carrying all the given headers, 200 OK; anything
    /// else falls through unmatched.
    pub async fn respond_ok_expecting_headers(&self, expected: &[(&str, &str)]) {
        let mut mock = Mock::given(method("POST"));
        for (key, value) in expected {
            mock = mock.and(header(*key, *value));
        }
        mock.respond_with(ResponseTemplate::new(200)).mount(&self.server).await;
    }

    /// Accepts every POST with the given status after a delay, for
    /// timeout scenarios.
    pub async fn respond_delayed(&self, status: u16, delay: std::time::Duration) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    /// Returns all requests the sink received.
    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Asserts that exactly `expected` requests were received.
    pub async fn assert_request_count(&self, expected: usize) {
        let requests = self.received_requests().await;
        assert_eq!(
            requests.len(),
            expected,
            "Expected {} requests, received {}",
            expected,
            requests.len()
        );
    }
}
