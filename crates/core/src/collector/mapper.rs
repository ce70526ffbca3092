//! Attribute mappers: one secondary lookup per registered relationship.
//!
//! A [`MapperConfig`] is registered once on the client and never mutated.
//! Every top-level request instantiates a fresh [`AttributeMapper`] from it,
//! which collects join keys from the primary entities, queries the
//! secondary endpoint once with the deduplicated key set, and merges the
//! matching record back onto each entity.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use restcollector_common::collections::OrderedSet;
use restcollector_common::resilience::retry_with_config;
use restcollector_domain::{
    Entity, Headers, HttpMethod, JoinKey, OutgoingRequest, RequestError, RestCollectorError,
    Result,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::options::Retries;
use super::ports::{DecorateRequest, HttpExecutor};

/// Merge a matched secondary record (or `None`) into an entity.
pub type MergeFn<E, R> = Arc<dyn Fn(&mut E, Option<&R>) + Send + Sync>;

/// Reshape the outgoing key payload before dispatch.
pub type BeforeHook = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Immutable description of one secondary lookup.
///
/// `R` is the record type returned by the secondary endpoint; it defaults to
/// raw JSON.
pub struct MapperConfig<E, R = Value> {
    entity_attribute: String,
    rest_api_attribute: String,
    rest_api_url: String,
    method: HttpMethod,
    timeout: Option<Duration>,
    retry: Option<Retries>,
    before: Option<BeforeHook>,
    merge_entities: MergeFn<E, R>,
}

impl<E, R> MapperConfig<E, R> {
    /// Describe a lookup joining `entity[entity_attribute]` to
    /// `record[rest_api_attribute]` from records served at `rest_api_url`.
    pub fn new<F>(
        entity_attribute: impl Into<String>,
        rest_api_attribute: impl Into<String>,
        rest_api_url: impl Into<String>,
        merge_entities: F,
    ) -> Self
    where
        F: Fn(&mut E, Option<&R>) + Send + Sync + 'static,
    {
        Self {
            entity_attribute: entity_attribute.into(),
            rest_api_attribute: rest_api_attribute.into(),
            rest_api_url: rest_api_url.into(),
            method: HttpMethod::Get,
            timeout: None,
            retry: None,
            before: None,
            merge_entities: Arc::new(merge_entities),
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Retry this mapper's query independently of the top-level request.
    pub fn retry(mut self, retry: Retries) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Transform the key payload: the query object for GET, the raw key
    /// array otherwise.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    pub fn entity_attribute(&self) -> &str {
        &self.entity_attribute
    }

    pub fn rest_api_attribute(&self) -> &str {
        &self.rest_api_attribute
    }

    pub fn rest_api_url(&self) -> &str {
        &self.rest_api_url
    }

    pub fn http_method(&self) -> HttpMethod {
        self.method
    }

    pub fn retry_policy(&self) -> Option<&Retries> {
        self.retry.as_ref()
    }

    pub fn validate(&self) -> Result<()> {
        if self.entity_attribute.trim().is_empty() {
            return Err(RestCollectorError::InvalidInput(
                "mapper entity_attribute must not be empty".into(),
            ));
        }
        if self.rest_api_attribute.trim().is_empty() {
            return Err(RestCollectorError::InvalidInput(
                "mapper rest_api_attribute must not be empty".into(),
            ));
        }
        if self.rest_api_url.trim().is_empty() {
            return Err(RestCollectorError::InvalidInput(
                "mapper rest_api_url must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl<E, R> fmt::Debug for MapperConfig<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperConfig")
            .field("entity_attribute", &self.entity_attribute)
            .field("rest_api_attribute", &self.rest_api_attribute)
            .field("rest_api_url", &self.rest_api_url)
            .field("method", &self.method)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("before", &self.before.is_some())
            .finish()
    }
}

/// Everything a mapper query needs from the client and the current call.
pub struct QueryContext<B> {
    pub executor: Arc<dyn HttpExecutor>,
    pub decorator: Option<Arc<dyn DecorateRequest<B>>>,
    pub bag: Option<Arc<B>>,
}

impl<B> Clone for QueryContext<B> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            decorator: self.decorator.clone(),
            bag: self.bag.clone(),
        }
    }
}

impl<B> QueryContext<B> {
    /// A fresh header bag filled by the decorator, if any.
    pub fn decorated_headers(&self) -> Headers {
        let mut headers = Headers::new();
        if let Some(decorator) = &self.decorator {
            decorator.decorate_request(&mut headers, self.bag.as_deref());
        }
        headers
    }
}

/// Per-request mapper state.
pub struct AttributeMapper<E, R = Value> {
    config: Arc<MapperConfig<E, R>>,
    data_values: OrderedSet<JoinKey>,
    data_lookup: HashMap<JoinKey, R>,
}

impl<E, R> AttributeMapper<E, R>
where
    E: Entity,
    R: Entity + DeserializeOwned,
{
    pub fn new(config: Arc<MapperConfig<E, R>>) -> Self {
        Self { config, data_values: OrderedSet::new(), data_lookup: HashMap::new() }
    }

    /// Record the entity's join key if it has not been seen yet.
    pub fn collect_data(&mut self, entity: &E) {
        if let Some(key) = entity.join_key(&self.config.entity_attribute) {
            self.data_values.insert(key);
        }
    }

    /// Deduplicated keys in first-seen order.
    pub fn data_values(&self) -> &[JoinKey] {
        self.data_values.as_slice()
    }

    pub fn lookup(&self, key: &JoinKey) -> Option<&R> {
        self.data_lookup.get(key)
    }

    /// Query the secondary endpoint and index the returned records.
    ///
    /// Wrapped in the mapper's own retry policy when it has one.
    pub async fn query_data<B>(&mut self, ctx: &QueryContext<B>) -> Result<()> {
        let lookup = match self.config.retry.as_ref() {
            Some(retry) => retry_with_config(retry, || self.fetch_lookup(ctx)).await?,
            None => self.fetch_lookup(ctx).await?,
        };
        self.data_lookup = lookup;
        Ok(())
    }

    /// Invoke the merge function with the matching record, or `None`.
    pub fn merge_data(&self, entity: &mut E) {
        let matched = entity
            .join_key(&self.config.entity_attribute)
            .and_then(|key| self.data_lookup.get(&key));
        (self.config.merge_entities)(entity, matched);
    }

    fn payload(&self) -> (Option<Value>, Option<Value>) {
        let keys = Value::Array(self.data_values.iter().map(JoinKey::to_value).collect());
        let shape = |payload: Value| match &self.config.before {
            Some(hook) => hook(payload),
            None => payload,
        };

        if self.config.method.is_get() {
            let mut query = Map::new();
            query.insert(self.config.rest_api_attribute.clone(), keys);
            (Some(shape(Value::Object(query))), None)
        } else {
            (None, Some(shape(keys)))
        }
    }

    async fn fetch_lookup<B>(&self, ctx: &QueryContext<B>) -> Result<HashMap<JoinKey, R>> {
        let url = self.config.rest_api_url.as_str();
        let (query, data) = self.payload();

        let request = OutgoingRequest::new(self.config.method, url)
            .with_query(query.clone())
            .with_body(data.clone())
            .with_headers(ctx.decorated_headers())
            .with_timeout(self.config.timeout);

        debug!(
            method = %self.config.method,
            url,
            keys = self.data_values.len(),
            "sending mapper request"
        );

        let response = ctx
            .executor
            .execute(request)
            .await
            .map_err(|failure| RequestError::transport(url, &failure, query.clone(), data.clone()))?;

        debug!(url, status = response.status, "received mapper response");

        if !response.is_success() {
            return Err(RequestError::http(url, response.status, response.body, query, data).into());
        }

        let records: Vec<R> = serde_json::from_value(response.body).map_err(|err| {
            RestCollectorError::Decode { url: url.to_string(), message: err.to_string() }
        })?;

        let attribute = self.config.rest_api_attribute.as_str();
        let mut lookup = HashMap::with_capacity(records.len());
        for record in records {
            if let Some(key) = record.join_key(attribute) {
                // last record wins when the endpoint repeats a key
                lookup.insert(key, record);
            }
        }
        Ok(lookup)
    }
}

/// Builds fresh mapper state for one request.
pub(crate) trait MapperFactory<E, B>: Send + Sync {
    fn instantiate(self: Arc<Self>) -> Box<dyn MapperTask<E, B>>;
}

/// Type-erased mapper as driven by the engine.
#[async_trait]
pub(crate) trait MapperTask<E, B>: Send {
    fn collect_data(&mut self, entity: &E);

    async fn query_data(&mut self, ctx: &QueryContext<B>) -> Result<()>;

    fn merge_data(&self, entity: &mut E);
}

impl<E, R, B> MapperFactory<E, B> for MapperConfig<E, R>
where
    E: Entity + Send + 'static,
    R: Entity + DeserializeOwned + Send + Sync + 'static,
    B: Send + Sync + 'static,
{
    fn instantiate(self: Arc<Self>) -> Box<dyn MapperTask<E, B>> {
        Box::new(AttributeMapper::new(self))
    }
}

#[async_trait]
impl<E, R, B> MapperTask<E, B> for AttributeMapper<E, R>
where
    E: Entity + Send + 'static,
    R: Entity + DeserializeOwned + Send + Sync + 'static,
    B: Send + Sync + 'static,
{
    fn collect_data(&mut self, entity: &E) {
        AttributeMapper::collect_data(self, entity);
    }

    async fn query_data(&mut self, ctx: &QueryContext<B>) -> Result<()> {
        AttributeMapper::query_data(self, ctx).await
    }

    fn merge_data(&self, entity: &mut E) {
        AttributeMapper::merge_data(self, entity);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::collector::test_support::ScriptedExecutor;

    fn email_mapper() -> MapperConfig<Value> {
        MapperConfig::new("userId", "id", "http://users.test/api/users", |entity: &mut Value, user: Option<&Value>| {
            if let Some(user) = user {
                entity["email"] = user["email"].clone();
            }
        })
    }

    fn context(executor: Arc<ScriptedExecutor>) -> QueryContext<()> {
        QueryContext { executor, decorator: None, bag: None }
    }

    #[test]
    fn collect_data_deduplicates_in_first_seen_order() {
        let mut mapper = AttributeMapper::new(Arc::new(email_mapper()));
        for entity in [json!({ "userId": 4 }), json!({ "userId": 3 }), json!({ "userId": 4 }), json!({ "id": 9 })] {
            mapper.collect_data(&entity);
        }

        assert_eq!(mapper.data_values(), &[JoinKey::from(4), JoinKey::from(3)]);
    }

    #[test]
    fn validate_rejects_blank_attributes() {
        let config: MapperConfig<Value> = MapperConfig::new(" ", "id", "http://x", |_: &mut Value, _: Option<&Value>| {});
        assert!(matches!(config.validate(), Err(RestCollectorError::InvalidInput(_))));

        let config: MapperConfig<Value> = MapperConfig::new("userId", "", "http://x", |_: &mut Value, _: Option<&Value>| {});
        assert!(config.validate().is_err());
        assert!(email_mapper().validate().is_ok());
    }

    #[tokio::test]
    async fn get_query_carries_keys_under_rest_api_attribute() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.respond("http://users.test/api/users", 200, json!([{ "id": 3, "email": "a" }]));

        let mut mapper = AttributeMapper::new(Arc::new(email_mapper()));
        mapper.collect_data(&json!({ "userId": 3 }));
        mapper.collect_data(&json!({ "userId": 3 }));
        mapper.query_data(&context(Arc::clone(&executor))).await.expect("query");

        let sent = executor.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].query, Some(json!({ "id": [3] })));
        assert_eq!(sent[0].body, None);
        assert_eq!(mapper.lookup(&JoinKey::from(3)), Some(&json!({ "id": 3, "email": "a" })));
    }

    #[tokio::test]
    async fn non_get_sends_keys_as_body_through_before_hook() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.respond("http://courses.test/api/users-courses", 200, json!([]));

        let config: MapperConfig<Value> = MapperConfig::new(
            "userId",
            "user",
            "http://courses.test/api/users-courses",
            |_: &mut Value, _: Option<&Value>| {},
        )
        .method(HttpMethod::Post)
        .before(|payload| json!({ "otherData": [1, 2, 3], "users": payload }));

        let mut mapper = AttributeMapper::new(Arc::new(config));
        mapper.collect_data(&json!({ "userId": 3 }));
        mapper.collect_data(&json!({ "userId": 4 }));
        mapper.query_data(&context(Arc::clone(&executor))).await.expect("query");

        let sent = executor.requests();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].query, None);
        assert_eq!(sent[0].body, Some(json!({ "otherData": [1, 2, 3], "users": [3, 4] })));
    }

    #[tokio::test]
    async fn duplicate_response_keys_keep_the_last_record() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.respond(
            "http://users.test/api/users",
            200,
            json!([{ "id": 3, "email": "first" }, { "id": 3, "email": "second" }]),
        );

        let mut mapper = AttributeMapper::new(Arc::new(email_mapper()));
        mapper.collect_data(&json!({ "userId": 3 }));
        mapper.query_data(&context(executor)).await.expect("query");

        let mut entity = json!({ "userId": 3 });
        mapper.merge_data(&mut entity);
        assert_eq!(entity["email"], json!("second"));
    }

    #[tokio::test]
    async fn merge_receives_none_when_no_record_matches() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.respond("http://users.test/api/users", 200, json!([{ "id": 3, "email": "a" }]));

        let config: MapperConfig<Value> =
            MapperConfig::new("userId", "id", "http://users.test/api/users", |entity: &mut Value, user: Option<&Value>| {
                entity["matched"] = json!(user.is_some());
            });
        let mut mapper = AttributeMapper::new(Arc::new(config));
        mapper.collect_data(&json!({ "userId": 5 }));
        mapper.query_data(&context(executor)).await.expect("query");

        let mut entity = json!({ "userId": 5 });
        mapper.merge_data(&mut entity);
        assert_eq!(entity["matched"], json!(false));
    }

    #[tokio::test]
    async fn failing_status_yields_request_error_with_outgoing_query() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.respond("http://users.test/api/users", 500, json!("Internal Server Error"));

        let mut mapper = AttributeMapper::new(Arc::new(email_mapper()));
        mapper.collect_data(&json!({ "userId": 3 }));
        let err = mapper.query_data(&context(executor)).await.expect_err("should fail");

        let request = err.as_request().expect("request error");
        assert_eq!(request.status, 500u16);
        assert_eq!(request.url, "http://users.test/api/users");
        assert_eq!(request.query, Some(json!({ "id": [3] })));
        assert_eq!(request.data, None);
        assert_eq!(request.response, json!("Internal Server Error"));
    }

    #[tokio::test]
    async fn transport_failure_stringifies_into_status_and_response() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.fail("http://users.test/api/users", "connection refused");

        let mut mapper = AttributeMapper::new(Arc::new(email_mapper()));
        mapper.collect_data(&json!({ "userId": 3 }));
        let err = mapper.query_data(&context(executor)).await.expect_err("should fail");

        let request = err.as_request().expect("request error");
        assert!(request.status.is_transport());
        assert_eq!(request.response, json!("connection refused"));
    }

    #[tokio::test]
    async fn mapper_retry_recovers_from_transient_failure() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.respond("http://users.test/api/users", 503, json!("busy"));
        executor.respond("http://users.test/api/users", 200, json!([{ "id": 3, "email": "a" }]));

        let retry = Retries::builder().retries(2).fixed_backoff(Duration::ZERO).build().expect("retry");
        let mut mapper = AttributeMapper::new(Arc::new(email_mapper().retry(retry)));
        mapper.collect_data(&json!({ "userId": 3 }));
        mapper.query_data(&context(Arc::clone(&executor))).await.expect("query");

        assert_eq!(executor.requests().len(), 2);
        assert!(mapper.lookup(&JoinKey::from(3)).is_some());
    }

    #[tokio::test]
    async fn decorator_headers_are_attached() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.respond("http://users.test/api/users", 200, json!([]));

        let decorator: Arc<dyn DecorateRequest<String>> =
            Arc::new(|headers: &mut Headers, bag: Option<&String>| {
                if let Some(user) = bag {
                    headers.set("userId", user.as_str());
                }
            });
        let ctx = QueryContext {
            executor: Arc::clone(&executor) as Arc<dyn HttpExecutor>,
            decorator: Some(decorator),
            bag: Some(Arc::new("context1".to_string())),
        };

        let mut mapper = AttributeMapper::new(Arc::new(email_mapper()));
        mapper.query_data(&ctx).await.expect("query");

        assert_eq!(executor.requests()[0].headers.get("userId"), Some("context1"));
    }
}
