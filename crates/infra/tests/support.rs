#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use restcollector_core::{HttpExecutor, RestCollectorClient};
use restcollector_domain::Headers;
use restcollector_infra::ReqwestExecutor;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Caller context threaded into the request decorator.
#[derive(Debug, Clone)]
pub struct Bag {
    pub user_id: String,
}

impl Bag {
    pub fn new(user_id: &str) -> Self {
        Self { user_id: user_id.to_string() }
    }
}

/// Install a test-writer subscriber once per test binary.
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn logins() -> Value {
    json!([
        { "id": 1, "userId": 3, "loginTime": 1560518174 },
        { "id": 2, "userId": 4, "loginTime": 1560172574 }
    ])
}

/// Client against `entity_rest_api` whose decorator copies the bag's user id
/// into a `userId` header.
pub fn client(entity_rest_api: String) -> RestCollectorClient<Value, Bag> {
    let executor = ReqwestExecutor::builder().build().expect("executor should build");
    RestCollectorClient::new(Arc::new(executor) as Arc<dyn HttpExecutor>)
        .with_entity_rest_api(entity_rest_api)
        .with_decorator(|headers: &mut Headers, bag: Option<&Bag>| {
            if let Some(bag) = bag {
                headers.set("userId", bag.user_id.as_str());
            }
        })
}

/// Mount the logins, users and users-courses endpoints.
pub async fn mount_api(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/logins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(logins()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/logins/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": 1, "userId": 3, "loginTime": 1560518174 }])),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("id", "3"))
        .and(query_param("id", "4"))
        .and(header("userId", "context1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "email": "user3@gmail.com" },
            { "id": 4, "email": "user4@gmail.com" }
        ])))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users-courses"))
        .and(body_json(json!({ "otherData": [1, 2, 3], "users": [3, 4] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "user": 3, "course": "Chemistry" },
            { "user": 4, "course": "Biology" }
        ])))
        .mount(server)
        .await;

    for failing in ["/api/loginsFail", "/api/usersFail"] {
        Mock::given(method("GET"))
            .and(path(failing))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(server)
            .await;
    }
}

pub async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}
