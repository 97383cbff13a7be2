use silo::{OrmError, Request, Response, Result, ServerError, Transport};
use std::{collections::VecDeque, sync::Mutex};

/// Transport answering with queued responses, an empty body once the queue is exhausted.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Response>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn respond(&self, text: impl Into<String>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(Response::new(text)));
        self
    }

    pub fn fail(&self, code: u32, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(OrmError::Server(ServerError::new(code, message)).into()));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Bodies of the requests received so far.
    pub fn sent(&self) -> Vec<String> {
        self.requests().iter().map(|v| v.body.to_text()).collect()
    }

    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
        self.responses.lock().unwrap().clear();
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Response::default()))
    }
}
