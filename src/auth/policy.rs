//! Route access policies
//!
//! Each route declares its requirement where it is registered. The
//! resulting table is built once at startup and shared read-only by the
//! guard middleware.

use crate::models::user::Role;
use axum::{http::Method, routing::MethodRouter, Router};
use std::collections::HashMap;
use std::fmt;

/// Declared access requirement of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    /// No credential needed
    Public,
    /// Any authenticated principal
    AuthenticatedOnly,
    /// Principal's role must equal this role exactly
    RequiresRole(Role),
}

impl RoutePolicy {
    pub fn is_public(&self) -> bool {
        matches!(self, RoutePolicy::Public)
    }
}

impl fmt::Display for RoutePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePolicy::Public => f.write_str("public"),
            RoutePolicy::AuthenticatedOnly => f.write_str("authenticated"),
            RoutePolicy::RequiresRole(role) => write!(f, "role:{}", role),
        }
    }
}

/// Route key: HTTP method plus the route template as registered
/// (`/movies/{id}`, not `/movies/42`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Immutable route → policy mapping
#[derive(Debug, Clone, Default)]
pub struct RoutePolicyTable {
    policies: HashMap<RouteKey, RoutePolicy>,
}

impl RoutePolicyTable {
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RoutePolicy> {
        self.policies
            .get(&RouteKey::new(method.clone(), path))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &RoutePolicy)> {
        self.policies.iter()
    }
}

/// Router builder that records a policy for every route it registers
///
/// ```rust,ignore
/// let (router, table) = PolicyRouter::new()
///     .route(Method::GET, "/movies", get(list_movies), RoutePolicy::AuthenticatedOnly)
///     .route(Method::POST, "/movies", post(create_movie), RoutePolicy::RequiresRole(Role::Admin))
///     .into_parts();
/// ```
pub struct PolicyRouter<S = ()> {
    router: Router<S>,
    policies: HashMap<RouteKey, RoutePolicy>,
}

impl<S> PolicyRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            policies: HashMap::new(),
        }
    }

    /// Register `handler` for `method` on `path` with the given policy.
    ///
    /// `handler` must serve `method`; routes sharing a path are merged by
    /// axum.
    pub fn route(
        mut self,
        method: Method,
        path: &'static str,
        handler: MethodRouter<S>,
        policy: RoutePolicy,
    ) -> Self {
        let key = RouteKey::new(method, path);
        if let Some(previous) = self.policies.insert(key.clone(), policy) {
            tracing::warn!(route = %key, %previous, %policy, "Route policy declared twice");
        }
        self.router = self.router.route(path, handler);
        self
    }

    pub fn into_parts(self) -> (Router<S>, RoutePolicyTable) {
        (
            self.router,
            RoutePolicyTable {
                policies: self.policies,
            },
        )
    }
}

impl<S> Default for PolicyRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};

    async fn noop() {}

    #[test]
    fn test_table_records_declared_policies() {
        let (_router, table) = PolicyRouter::<()>::new()
            .route(Method::GET, "/movies", get(noop), RoutePolicy::AuthenticatedOnly)
            .route(
                Method::POST,
                "/movies",
                post(noop),
                RoutePolicy::RequiresRole(Role::Admin),
            )
            .route(Method::GET, "/health", get(noop), RoutePolicy::Public)
            .into_parts();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.lookup(&Method::GET, "/movies"),
            Some(RoutePolicy::AuthenticatedOnly)
        );
        assert_eq!(
            table.lookup(&Method::POST, "/movies"),
            Some(RoutePolicy::RequiresRole(Role::Admin))
        );
        assert_eq!(table.lookup(&Method::GET, "/health"), Some(RoutePolicy::Public));
    }

    #[test]
    fn test_lookup_is_per_method_and_template() {
        let (_router, table) = PolicyRouter::<()>::new()
            .route(Method::GET, "/movies/{id}", get(noop), RoutePolicy::RequiresRole(Role::Regular))
            .into_parts();

        assert!(table.lookup(&Method::DELETE, "/movies/{id}").is_none());
        assert!(table.lookup(&Method::GET, "/movies/42").is_none());
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(RoutePolicy::Public.to_string(), "public");
        assert_eq!(RoutePolicy::RequiresRole(Role::Admin).to_string(), "role:admin");
        assert!(RoutePolicy::Public.is_public());
        assert!(!RoutePolicy::AuthenticatedOnly.is_public());
    }
}
