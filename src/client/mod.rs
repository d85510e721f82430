//! Client: sends operations and keeps the normalized cache current.
//!
//! Queries honour a [`FetchPolicy`]. Mutations write their result into the
//! cache, run the caller's update hook and then refetch the listed queries.
//! Every failure is shown on the [`AlertContext`] passed to the call, logged,
//! and returned.

mod watch;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::alert::AlertContext;
use crate::cache::{InMemoryCache, NormalizedCache};
use crate::config::{ClientConfig, FetchPolicy};
use crate::document::Document;
use crate::error::{BooksError, BooksResult, ExecutionError};
use crate::ir::Request;
use crate::transport::Transport;

pub use watch::QueryWatch;

/// A query to run again after a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct RefetchQuery {
    /// Query to send again.
    pub document: Document,
    /// Its variables.
    pub variables: Value,
}

impl RefetchQuery {
    /// Refetch `document` with `variables`.
    #[must_use]
    pub fn new(document: Document, variables: Value) -> Self {
        Self { document, variables }
    }
}

/// Runs against the cache once a mutation result has been written.
pub type UpdateHook<'a> = Box<dyn FnOnce(&InMemoryCache, &Value) + 'a>;

/// What to do after a mutation succeeds.
#[derive(Default)]
pub struct MutationOptions<'a> {
    update: Option<UpdateHook<'a>>,
    refetch_queries: Vec<RefetchQuery>,
}

impl<'a> MutationOptions<'a> {
    /// No hook, no refetches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` with the cache and the mutation's `data`.
    #[must_use]
    pub fn update<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&InMemoryCache, &Value) + 'a,
    {
        self.update = Some(Box::new(hook));
        self
    }

    /// Refetch `document` from the network afterwards.
    #[must_use]
    pub fn refetch(mut self, document: Document, variables: Value) -> Self {
        self.refetch_queries.push(RefetchQuery::new(document, variables));
        self
    }

    /// The queries that will be refetched.
    #[must_use]
    pub fn refetch_queries(&self) -> &[RefetchQuery] {
        &self.refetch_queries
    }
}

impl fmt::Debug for MutationOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationOptions")
            .field("update", &self.update.is_some())
            .field("refetch_queries", &self.refetch_queries)
            .finish()
    }
}

/// Author Books client.
#[derive(Clone)]
pub struct BooksClient {
    transport: Arc<dyn Transport>,
    cache: Arc<InMemoryCache>,
    config: ClientConfig,
}

impl BooksClient {
    /// A client with a fresh cache.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let cache = Arc::new(InMemoryCache::with_config(&config.cache));
        Self::with_cache(transport, cache, config)
    }

    /// A client sharing an existing cache.
    #[must_use]
    pub fn with_cache(transport: Arc<dyn Transport>, cache: Arc<InMemoryCache>, config: ClientConfig) -> Self {
        Self {
            transport,
            cache,
            config,
        }
    }

    /// The normalized cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<InMemoryCache> {
        &self.cache
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn send(&self, document: &Document, variables: &Value) -> BooksResult<Value> {
        let request = Request::new(document, variables.clone());
        debug!(
            request_id = %request.request_id,
            operation = %document.name,
            "sending"
        );
        let response = self.transport.execute(&request)?;
        if !response.errors.is_empty() {
            return Err(ExecutionError::GraphQl {
                errors: response.errors,
            }
            .into());
        }
        response.data.ok_or_else(|| {
            ExecutionError::MissingData {
                operation: document.name.clone(),
            }
            .into()
        })
    }

    /// Show `err` on the alert channel, log it and hand it back.
    pub fn alert_on_error(&self, alerts: &AlertContext, document: &Document, err: BooksError) -> BooksError {
        let message = err.alert_message();
        alerts.show_error(message.clone());
        if self.config.log_errors {
            let kind = if document.is_mutation() { "mutation" } else { "query" };
            error!(operation = %document.name, kind, network = err.is_network(), "{message}");
        }
        err
    }

    fn fetch(&self, document: &Document, variables: &Value) -> BooksResult<Value> {
        let data = self.send(document, variables)?;
        self.cache.write_query(document, variables, &data);
        Ok(self.cache.read_query(document, variables).unwrap_or(data))
    }

    /// Run a query with the configured fetch policy.
    ///
    /// # Errors
    /// Network and GraphQL failures (also shown on `alerts`), or a cache
    /// miss under [`FetchPolicy::CacheOnly`].
    pub fn query(&self, alerts: &AlertContext, document: &Document, variables: &Value) -> BooksResult<Value> {
        self.query_with_policy(alerts, document, variables, self.config.fetch_policy)
    }

    /// Run a query with an explicit fetch policy.
    ///
    /// # Errors
    /// See [`query`](Self::query).
    pub fn query_with_policy(
        &self,
        alerts: &AlertContext,
        document: &Document,
        variables: &Value,
        policy: FetchPolicy,
    ) -> BooksResult<Value> {
        if policy != FetchPolicy::NetworkOnly {
            if let Some(cached) = self.cache.read_query(document, variables) {
                debug!(operation = %document.name, "cache hit");
                return Ok(cached);
            }
            if policy == FetchPolicy::CacheOnly {
                return Err(ExecutionError::CacheMiss {
                    operation: document.name.clone(),
                }
                .into());
            }
        }
        self.fetch(document, variables)
            .map_err(|err| self.alert_on_error(alerts, document, err))
    }

    /// Fetch `query` from the network and update the cache.
    ///
    /// # Errors
    /// See [`query`](Self::query).
    pub fn refetch(&self, alerts: &AlertContext, query: &RefetchQuery) -> BooksResult<Value> {
        self.query_with_policy(alerts, &query.document, &query.variables, FetchPolicy::NetworkOnly)
    }

    /// Run a mutation.
    ///
    /// On success the result is written to the cache, the update hook runs,
    /// and each refetch query is sent. A failing refetch is alerted but does
    /// not fail the mutation.
    ///
    /// # Errors
    /// Network and GraphQL failures; the update hook and refetches are
    /// skipped.
    pub fn mutate(
        &self,
        alerts: &AlertContext,
        document: &Document,
        variables: &Value,
        options: MutationOptions<'_>,
    ) -> BooksResult<Value> {
        let data = self
            .send(document, variables)
            .map_err(|err| self.alert_on_error(alerts, document, err))?;

        self.cache.write_query(document, variables, &data);
        if let Some(update) = options.update {
            update(self.cache.as_ref(), &data);
        }
        for query in &options.refetch_queries {
            if let Err(err) = self.refetch(alerts, query) {
                debug!(operation = %query.document.name, error = %err, "refetch failed");
            }
        }
        Ok(data)
    }

    /// Watch the cached result of `document`.
    #[must_use]
    pub fn watch_query(&self, document: &Document, variables: &Value) -> QueryWatch {
        QueryWatch::new(Arc::clone(&self.cache), document.clone(), variables.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertLevel;
    use crate::document::catalog;
    use crate::ir::GraphQlError;
    use crate::transport::{MockTransport, MockedResponse, MockedResult};
    use serde_json::json;

    fn client(mocks: Vec<MockedResponse>) -> (BooksClient, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new(mocks));
        (BooksClient::new(transport.clone(), ClientConfig::default()), transport)
    }

    fn books_data() -> Value {
        json!({ "books": [{ "__typename": "Book", "id": "b:1", "title": "Dune", "author": null }] })
    }

    #[test]
    fn cache_first_skips_the_network_on_hit() {
        let (client, transport) = client(vec![MockedResponse::data("Books", books_data())]);
        let alerts = AlertContext::new();

        let first = client.query(&alerts, &catalog::books(), &Value::Null).unwrap();
        let second = client.query(&alerts, &catalog::books(), &Value::Null).unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.operation_names(), ["Books"]);
    }

    #[test]
    fn cache_only_misses_without_alerting() {
        let (client, transport) = client(vec![]);
        let alerts = AlertContext::new();
        let err = client
            .query_with_policy(&alerts, &catalog::books(), &Value::Null, FetchPolicy::CacheOnly)
            .unwrap_err();
        assert!(matches!(err, BooksError::Execution(ExecutionError::CacheMiss { .. })));
        assert!(!alerts.is_open());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn graphql_errors_are_joined_on_the_alert() {
        let (client, _) = client(vec![MockedResponse {
            operation_name: "Books".to_string(),
            variables: None,
            result: MockedResult::Errors(vec![GraphQlError::new("one"), GraphQlError::new("two")]),
        }]);
        let alerts = AlertContext::new();
        let err = client.query(&alerts, &catalog::books(), &Value::Null).unwrap_err();
        assert!(err.is_application());
        let state = alerts.state();
        assert_eq!(state.level, AlertLevel::Error);
        assert_eq!(state.message, "one, two");
    }

    #[test]
    fn failed_mutation_skips_hook_and_refetch() {
        let (client, transport) = client(vec![MockedResponse::network_error("deleteBook", "offline")]);
        let alerts = AlertContext::new();
        let mut hook_ran = false;

        let err = client
            .mutate(
                &alerts,
                &catalog::delete_book(),
                &json!({ "input": { "id": "b:1" } }),
                MutationOptions::new()
                    .update(|_, _| hook_ran = true)
                    .refetch(catalog::books(), Value::Null),
            )
            .unwrap_err();

        assert!(err.is_network());
        assert!(!hook_ran);
        assert_eq!(transport.operation_names(), ["deleteBook"]);
        assert_eq!(alerts.state().message, "offline");
    }

    #[test]
    fn mutation_result_lands_under_root_mutation() {
        let (client, _) = client(vec![MockedResponse::data(
            "removeBookAuthor",
            json!({ "removeBookAuthor": { "__typename": "Book", "id": "b:1", "author": null } }),
        )]);
        let alerts = AlertContext::new();
        client
            .mutate(
                &alerts,
                &catalog::remove_book_author(),
                &json!({ "input": { "id": "b:1" } }),
                MutationOptions::new(),
            )
            .unwrap();
        let snapshot = client.cache().extract();
        assert_eq!(
            snapshot["ROOT_MUTATION"][r#"removeBookAuthor({"input":{"id":"b:1"}})"#],
            json!({ "__ref": "Book:b:1" })
        );
    }
}
