//! In-memory executor for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use restcollector_domain::{Headers, OutgoingRequest, RestResponse, TransportError};
use serde_json::{json, Value};

use super::ports::HttpExecutor;

#[derive(Clone)]
enum Scripted {
    Reply(RestResponse),
    Fail(String),
}

/// Replays scripted responses per URL and records every request along with
/// the URLs whose responses have been handed back.
///
/// Each URL holds a queue; the last entry repeats once the others are used
/// up. Unscripted URLs answer 404.
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<OutgoingRequest>>,
    completed: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: Value) {
        self.push(url, Scripted::Reply(RestResponse::new(status, body)));
    }

    pub(crate) fn respond_with_headers(&self, url: &str, status: u16, headers: Headers, body: Value) {
        let mut response = RestResponse::new(status, body);
        response.headers = headers;
        self.push(url, Scripted::Reply(response));
    }

    pub(crate) fn fail(&self, url: &str, message: &str) {
        self.push(url, Scripted::Fail(message.to_string()));
    }

    /// Hold responses for `url` back by `delay`.
    pub(crate) fn delay(&self, url: &str, delay: Duration) {
        self.delays.lock().expect("delays lock").insert(url.to_string(), delay);
    }

    pub(crate) fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub(crate) fn requests_to(&self, url: &str) -> Vec<OutgoingRequest> {
        self.requests().into_iter().filter(|request| request.url == url).collect()
    }

    /// Number of responses for `url` that finished their delay.
    pub(crate) fn completed_to(&self, url: &str) -> usize {
        self.completed.lock().expect("completed lock").iter().filter(|done| *done == url).count()
    }

    fn push(&self, url: &str, entry: Scripted) {
        self.script.lock().expect("script lock").entry(url.to_string()).or_default().push_back(entry);
    }

    fn next(&self, url: &str) -> Option<Scripted> {
        let mut script = self.script.lock().expect("script lock");
        let queue = script.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl HttpExecutor for ScriptedExecutor {
    async fn execute(&self, request: OutgoingRequest) -> Result<RestResponse, TransportError> {
        let url = request.url.clone();
        self.requests.lock().expect("requests lock").push(request);

        let delay = self.delays.lock().expect("delays lock").get(&url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.lock().expect("completed lock").push(url.clone());

        match self.next(&url) {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(TransportError::new(message)),
            None => Ok(RestResponse::new(404, json!("Not Found"))),
        }
    }
}
