//! In-process fake transport for unit and integration tests
//!
//! Records every request it is asked to send and answers with responses
//! queued ahead of time, in FIFO order. Sending with an empty queue is a
//! `Request` error, which keeps tests honest about how many calls they expect.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use crate::request::{HttpRequest, RawResponse};
use crate::{Error, Result, Transport};

#[derive(Debug, Default)]
pub struct FakeTransport {
    sent: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<RawResponse>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response.
    pub fn push_response(&self, response: RawResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Transport for FakeTransport {
    fn id(&self) -> &str {
        "fake"
    }

    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + '_>> {
        let url = request.url.clone();
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Box::pin(async move {
            next.ok_or_else(|| Error::Request(format!("no queued response for {url}")))
        })
    }
}
