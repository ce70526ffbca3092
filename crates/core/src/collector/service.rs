//! Merge-fetch engine - primary request, mapper fan-out and merge

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use restcollector_common::resilience::retry_with_config;
use restcollector_domain::{
    Entity, HttpMethod, OutgoingRequest, RequestError, RestCollectorError, RestResponse, Result,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use super::mapper::{MapperConfig, MapperFactory, MapperTask, QueryContext};
use super::options::{Fetched, RequestOptions, RestCollectorResult, Retries};
use super::params::fill_params;
use super::ports::{DecorateRequest, HttpExecutor};

/// REST client that enriches fetched entities through registered mappers.
///
/// `E` is the entity type returned by the primary endpoint, `B` the caller
/// context handed to the request decorator.
pub struct RestCollectorClient<E, B = ()> {
    executor: Arc<dyn HttpExecutor>,
    entity_rest_api: Option<String>,
    decorator: Option<Arc<dyn DecorateRequest<B>>>,
    mappers: Vec<Arc<dyn MapperFactory<E, B>>>,
    default_retry: Option<Retries>,
}

impl<E, B> RestCollectorClient<E, B>
where
    E: Entity + DeserializeOwned + Send + 'static,
    B: Send + Sync + 'static,
{
    /// Create a client dispatching through `executor`
    pub fn new(executor: Arc<dyn HttpExecutor>) -> Self {
        Self {
            executor,
            entity_rest_api: None,
            decorator: None,
            mappers: Vec::new(),
            default_retry: None,
        }
    }

    /// Default URL template used when a request carries no explicit `url`.
    pub fn with_entity_rest_api(mut self, url: impl Into<String>) -> Self {
        self.entity_rest_api = Some(url.into());
        self
    }

    /// Retry policy for requests whose options carry none.
    pub fn with_default_retry(mut self, retry: Retries) -> Self {
        self.default_retry = Some(retry);
        self
    }

    pub fn with_decorator<D>(mut self, decorator: D) -> Self
    where
        D: DecorateRequest<B> + 'static,
    {
        self.decorator = Some(Arc::new(decorator));
        self
    }

    /// Register a mapper and return the client.
    pub fn with_mapper<R>(mut self, config: MapperConfig<E, R>) -> Result<Self>
    where
        R: Entity + DeserializeOwned + Send + Sync + 'static,
    {
        self.add_mapper(config)?;
        Ok(self)
    }

    /// Register a mapper. Mappers run in registration order during merge.
    pub fn add_mapper<R>(&mut self, config: MapperConfig<E, R>) -> Result<()>
    where
        R: Entity + DeserializeOwned + Send + Sync + 'static,
    {
        config.validate()?;
        debug!(
            entity_attribute = config.entity_attribute(),
            rest_api_url = config.rest_api_url(),
            "registered mapper"
        );
        self.mappers.push(Arc::new(config));
        Ok(())
    }

    pub fn mapper_count(&self) -> usize {
        self.mappers.len()
    }

    pub fn entity_rest_api(&self) -> Option<&str> {
        self.entity_rest_api.as_deref()
    }

    #[instrument(skip_all, fields(method = "GET"))]
    pub async fn get(&self, options: RequestOptions<B>) -> Result<RestCollectorResult<E>> {
        self.send_retried_request(HttpMethod::Get, options).await
    }

    #[instrument(skip_all, fields(method = "POST"))]
    pub async fn post(&self, options: RequestOptions<B>) -> Result<RestCollectorResult<E>> {
        self.send_retried_request(HttpMethod::Post, options).await
    }

    #[instrument(skip_all, fields(method = "PUT"))]
    pub async fn put(&self, options: RequestOptions<B>) -> Result<RestCollectorResult<E>> {
        self.send_retried_request(HttpMethod::Put, options).await
    }

    #[instrument(skip_all, fields(method = "DELETE"))]
    pub async fn delete(&self, options: RequestOptions<B>) -> Result<RestCollectorResult<E>> {
        self.send_retried_request(HttpMethod::Delete, options).await
    }

    #[instrument(skip_all, fields(method = "PATCH"))]
    pub async fn patch(&self, options: RequestOptions<B>) -> Result<RestCollectorResult<E>> {
        self.send_retried_request(HttpMethod::Patch, options).await
    }

    /// Run `send_request`, mapper fan-out included, under the request's
    /// retry policy, falling back to the client default.
    async fn send_retried_request(
        &self,
        method: HttpMethod,
        options: RequestOptions<B>,
    ) -> Result<RestCollectorResult<E>> {
        match options.retry.as_ref().or(self.default_retry.as_ref()) {
            Some(retry) => retry_with_config(retry, || self.send_request(method, &options)).await,
            None => self.send_request(method, &options).await,
        }
    }

    /// Issue the primary request once and enrich its entities.
    pub async fn send_request(
        &self,
        method: HttpMethod,
        options: &RequestOptions<B>,
    ) -> Result<RestCollectorResult<E>> {
        let url = self.resolve_url(options)?;
        let ctx = self.context(options.bag.clone());

        let request = OutgoingRequest::new(method, url.as_str())
            .with_query(options.query.clone())
            .with_body(options.data.clone())
            .with_headers(ctx.decorated_headers())
            .with_timeout(options.timeout);

        debug!(%method, url = %url, "sending primary request");

        let response = self.executor.execute(request).await.map_err(|failure| {
            RequestError::transport(url.as_str(), &failure, options.query.clone(), options.data.clone())
        })?;

        debug!(url = %url, status = response.status, "received primary response");

        if !response.is_success() {
            return Err(RequestError::http(
                url,
                response.status,
                response.body,
                options.query.clone(),
                options.data.clone(),
            )
            .into());
        }

        let RestResponse { status, headers, body } = response;
        let is_array = body.is_array();
        let mut entities = decode_entities::<E>(&url, body)?;

        self.run_mappers(&mut entities, &ctx).await?;

        let data = if is_array {
            Fetched::Many(entities)
        } else {
            let entity = entities.pop().ok_or_else(|| {
                RestCollectorError::Internal("single entity vanished during merge".into())
            })?;
            Fetched::One(entity)
        };

        Ok(RestCollectorResult { data, headers, status })
    }

    /// Enrich `entities` in place through every registered mapper.
    pub async fn fill_data(&self, entities: &mut [E], options: &RequestOptions<B>) -> Result<()> {
        let ctx = self.context(options.bag.clone());
        self.run_mappers(entities, &ctx).await
    }

    fn resolve_url(&self, options: &RequestOptions<B>) -> Result<String> {
        if let Some(url) = &options.url {
            return Ok(url.clone());
        }
        match &self.entity_rest_api {
            Some(template) => Ok(fill_params(template, options.params.as_ref())),
            None => Err(RestCollectorError::InvalidInput(
                "no url given and no entity_rest_api configured".into(),
            )),
        }
    }

    fn context(&self, bag: Option<Arc<B>>) -> QueryContext<B> {
        QueryContext { executor: Arc::clone(&self.executor), decorator: self.decorator.clone(), bag }
    }

    async fn run_mappers(&self, entities: &mut [E], ctx: &QueryContext<B>) -> Result<()> {
        if self.mappers.is_empty() {
            return Ok(());
        }

        let mut mappers: Vec<Box<dyn MapperTask<E, B>>> =
            self.mappers.iter().map(|factory| Arc::clone(factory).instantiate()).collect();

        for entity in entities.iter() {
            for mapper in mappers.iter_mut() {
                mapper.collect_data(entity);
            }
        }

        let mappers = query_all(mappers, ctx).await?;

        for entity in entities.iter_mut() {
            for mapper in &mappers {
                mapper.merge_data(entity);
            }
        }
        Ok(())
    }
}

/// Run every mapper query concurrently and return the mappers in their
/// registration order.
///
/// The first failure is returned as soon as it is observed. Queries still in
/// flight keep running on their detached tasks and their results are dropped.
async fn query_all<E, B>(
    mappers: Vec<Box<dyn MapperTask<E, B>>>,
    ctx: &QueryContext<B>,
) -> Result<Vec<Box<dyn MapperTask<E, B>>>>
where
    E: Send + 'static,
    B: Send + Sync + 'static,
{
    let count = mappers.len();
    let mut pending: FuturesUnordered<_> = mappers
        .into_iter()
        .enumerate()
        .map(|(index, mut mapper)| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let result = mapper.query_data(&ctx).await;
                (index, mapper, result)
            })
        })
        .collect();

    let mut finished: Vec<Option<Box<dyn MapperTask<E, B>>>> = (0..count).map(|_| None).collect();
    while let Some(joined) = pending.next().await {
        let (index, mapper, result) = joined
            .map_err(|err| RestCollectorError::Internal(format!("mapper task failed: {err}")))?;
        if let Err(err) = result {
            debug!(error = %err, "mapper query failed, abandoning siblings");
            return Err(err);
        }
        finished[index] = Some(mapper);
    }

    Ok(finished.into_iter().flatten().collect())
}

fn decode_entities<E: DeserializeOwned>(url: &str, body: Value) -> Result<Vec<E>> {
    let decoded = match body {
        Value::Array(items) => serde_json::from_value(Value::Array(items)),
        other => serde_json::from_value(other).map(|entity| vec![entity]),
    };
    decoded.map_err(|err| RestCollectorError::Decode { url: url.to_string(), message: err.to_string() })
}
