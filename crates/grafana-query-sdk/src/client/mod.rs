/*! Querying the backend REST services.

A [`QueryClient`] combines a [`Transport`], which performs raw JSON requests,
with the [batch engine][crate::batch] and [lookup caches][crate::cache]:

- [`QueryClient::query_records`] pages through any continuation-token query
  endpoint;
- [`QueryClient::workspaces`], [`QueryClient::users`] and
  [`QueryClient::products`] fetch and cache the listings used to populate
  lookup options in query editors.

Enable the `reqwest` feature for a ready-made [`Transport`] backed by
[`reqwest`](https://docs.rs/reqwest).
*/
use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    batch::{query_until_complete, query_using_skip, BatchConfig, BatchQuery, BatchResult, Page},
    cache::{ErrorPolicy, LookupCache},
    filter::LookupOption,
};

mod error;
mod models;
#[cfg(feature = "reqwest")]
mod reqwest;

pub use error::{ClientError, ErrorSource};
pub use models::{Product, QueryRequest, QueryResponse, User, Workspace};
#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub use self::reqwest::ReqwestTransport;

/// The product query endpoint.
pub const PRODUCTS_PATH: &str = "/nitestmonitor/v2/query-products";
/// The test result query endpoint.
pub const RESULTS_PATH: &str = "/nitestmonitor/v2/query-results";
/// The user query endpoint.
pub const USERS_PATH: &str = "/niuser/v1/users/query";
/// The workspace listing endpoint.
pub const WORKSPACES_PATH: &str = "/niuser/v1/workspaces";

/// Performs raw JSON requests against a service.
///
/// Paths are relative to the service's base URL, e.g. [`PRODUCTS_PATH`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `path` and return the JSON response.
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError>;

    /// GET `path` with the given query parameters and return the JSON response.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        (**self).post(path, body).await
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        (**self).get(path, query).await
    }
}

/// The error policy of each cache held by a [`QueryClient`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachePolicies {
    /// Policy for [`QueryClient::workspaces`]. Defaults to [`ErrorPolicy::ReturnEmpty`].
    pub workspaces: ErrorPolicy,
    /// Policy for [`QueryClient::users`]. Defaults to [`ErrorPolicy::Propagate`].
    pub users: ErrorPolicy,
    /// Policy for [`QueryClient::products`]. Defaults to [`ErrorPolicy::ReturnEmpty`].
    pub products: ErrorPolicy,
}

impl Default for CachePolicies {
    fn default() -> Self {
        Self {
            workspaces: ErrorPolicy::ReturnEmpty,
            users: ErrorPolicy::Propagate,
            products: ErrorPolicy::ReturnEmpty,
        }
    }
}

type CacheResult<V> = Result<Arc<V>, Arc<ClientError>>;

/// A client for the paged query services of one data source instance.
#[derive(Debug)]
pub struct QueryClient<T> {
    transport: Arc<T>,
    config: BatchConfig,
    workspaces: LookupCache<Vec<Workspace>, ClientError>,
    users: LookupCache<Vec<User>, ClientError>,
    products: LookupCache<HashMap<String, Product>, ClientError>,
}

impl<T: Transport + 'static> QueryClient<T> {
    /// Create a client with the default cache policies.
    pub fn new(transport: T, config: BatchConfig) -> Self {
        Self::with_cache_policies(transport, config, CachePolicies::default())
    }

    /// Create a client with the given cache policies.
    pub fn with_cache_policies(transport: T, config: BatchConfig, policies: CachePolicies) -> Self {
        Self {
            transport: Arc::new(transport),
            config,
            workspaces: LookupCache::new("workspaces", policies.workspaces),
            users: LookupCache::new("users", policies.users),
            products: LookupCache::new("products", policies.products),
        }
    }

    /// The transport used by this client.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The paging limits used by this client.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Page through a continuation-token query endpoint.
    ///
    /// `request.take`, if set, limits the total number of records returned.
    pub async fn query_records<R>(&self, path: &str, request: &QueryRequest) -> Result<BatchResult<R>, ClientError>
    where
        R: DeserializeOwned,
    {
        self.query_records_with(path, request, None).await
    }

    /// Like [`query_records`][Self::query_records], stopping early if `cancellation` is cancelled.
    pub async fn query_records_with<R>(
        &self,
        path: &str,
        request: &QueryRequest,
        cancellation: Option<CancellationToken>,
    ) -> Result<BatchResult<R>, ClientError>
    where
        R: DeserializeOwned,
    {
        let mut query = BatchQuery::new(self.config);
        if let Some(take) = request.take {
            query = query.take(take);
        }
        if let Some(token) = cancellation {
            query = query.cancellation(token);
        }
        let transport = &self.transport;
        let result = query
            .until_complete(|take, continuation_token| {
                let body = QueryRequest {
                    take: Some(take),
                    continuation_token,
                    ..request.clone()
                };
                async move {
                    let body = serde_json::to_value(&body)?;
                    let response: QueryResponse<R> = serde_json::from_value(transport.post(path, &body).await?)?;
                    Ok::<_, ClientError>(Page::from(response))
                }
            })
            .await?;
        debug!(path, records = result.data.len(), "Query complete");
        Ok(result)
    }

    /// Query products matching `request`.
    pub async fn query_products(&self, request: &QueryRequest) -> Result<Vec<Product>, ClientError> {
        Ok(self.query_records(PRODUCTS_PATH, request).await?.data)
    }

    /// Query test results matching `request`.
    pub async fn query_results<R>(&self, request: &QueryRequest) -> Result<Vec<R>, ClientError>
    where
        R: DeserializeOwned,
    {
        Ok(self.query_records(RESULTS_PATH, request).await?.data)
    }

    /// Every workspace, loaded once and cached.
    pub async fn workspaces(&self) -> CacheResult<Vec<Workspace>> {
        let transport = Arc::clone(&self.transport);
        let config = self.config;
        self.workspaces
            .get_or_load(move || async move {
                let result = query_using_skip(
                    |take, skip| {
                        let transport = &transport;
                        async move {
                            let query = [("take", take.to_string()), ("skip", skip.to_string())];
                            let value = transport.get(WORKSPACES_PATH, &query).await?;
                            let response: QueryResponse<Workspace> = serde_json::from_value(value)?;
                            Ok::<_, ClientError>(Page::from(response))
                        }
                    },
                    &config,
                )
                .await?;
                Ok::<_, ClientError>(result.data)
            })
            .await
    }

    /// Every user, loaded once and cached.
    pub async fn users(&self) -> CacheResult<Vec<User>> {
        let transport = Arc::clone(&self.transport);
        let config = self.config;
        self.users
            .get_or_load(move || async move {
                let data: Vec<User> = fetch_all(&*transport, USERS_PATH, &config).await?;
                Ok::<_, ClientError>(data)
            })
            .await
    }

    /// Every product by part number, loaded once and cached.
    pub async fn products(&self) -> CacheResult<HashMap<String, Product>> {
        let transport = Arc::clone(&self.transport);
        let config = self.config;
        self.products
            .get_or_load(move || async move {
                let data: Vec<Product> = fetch_all(&*transport, PRODUCTS_PATH, &config).await?;
                Ok::<_, ClientError>(data.into_iter().map(|p| (p.part_number.clone(), p)).collect::<HashMap<_, _>>())
            })
            .await
    }

    /// Lookup options for a workspace field: labelled by name, valued by ID.
    pub async fn workspace_lookup_options(&self) -> Result<Vec<LookupOption>, Arc<ClientError>> {
        Ok(self
            .workspaces()
            .await?
            .iter()
            .map(|w| LookupOption::new(&w.name, &w.id))
            .collect())
    }

    /// Lookup options for a user field: labelled by full name, valued by ID.
    pub async fn user_lookup_options(&self) -> Result<Vec<LookupOption>, Arc<ClientError>> {
        Ok(self
            .users()
            .await?
            .iter()
            .map(|u| LookupOption::new(u.full_name(), &u.id))
            .collect())
    }

    /// Drop every cached listing so the next call reloads it.
    pub fn invalidate_caches(&self) {
        self.workspaces.invalidate();
        self.users.invalidate();
        self.products.invalidate();
    }
}

/// Fetch every record from a continuation-token endpoint with an unfiltered request.
async fn fetch_all<T, R>(transport: &T, path: &str, config: &BatchConfig) -> Result<Vec<R>, ClientError>
where
    T: Transport + ?Sized,
    R: DeserializeOwned,
{
    let result = query_until_complete(
        |take, continuation_token| async move {
            let body = serde_json::to_value(QueryRequest {
                take: Some(take),
                continuation_token,
                ..QueryRequest::default()
            })?;
            let response: QueryResponse<R> = serde_json::from_value(transport.post(path, &body).await?)?;
            Ok::<_, ClientError>(Page::from(response))
        },
        config,
    )
    .await?;
    Ok(result.data)
}
