//! Request guard chain
//!
//! A request passes through an ordered list of guards. Each guard returns
//! [`Verdict::Allow`] or [`Verdict::Deny`]; the first deny ends the chain.
//! The standard chain is authentication followed by authorization.

use crate::{
    auth::{
        jwt::{Claims, TokenCodec},
        middleware::extract_token,
        policy::RoutePolicy,
    },
    config::RoleSource,
    error::{AppError, AuthFailure},
    models::user::Role,
    repository::CredentialRepository,
};
use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// The authenticated caller for one request.
///
/// Only [`AuthenticationGuard`] can build one, after the bearer token has
/// been verified and its subject re-resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Principal {
    id: Uuid,
    username: String,
    role: Role,
}

impl Principal {
    fn from_claims(claims: Claims, role: Role) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            role,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Outcome of a single guard
#[derive(Debug)]
pub enum Verdict {
    Allow,
    Deny(AppError),
}

/// Per-request state threaded through the chain
pub struct GuardRequest<'a> {
    pub policy: RoutePolicy,
    pub headers: &'a HeaderMap,
    pub principal: Option<Principal>,
}

#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, request: &mut GuardRequest<'_>) -> Verdict;
}

/// Verifies the bearer token and establishes the principal
pub struct AuthenticationGuard {
    codec: Arc<TokenCodec>,
    credentials: Arc<dyn CredentialRepository>,
    role_source: RoleSource,
}

impl AuthenticationGuard {
    pub fn new(
        codec: Arc<TokenCodec>,
        credentials: Arc<dyn CredentialRepository>,
        role_source: RoleSource,
    ) -> Self {
        Self {
            codec,
            credentials,
            role_source,
        }
    }
}

#[async_trait]
impl Guard for AuthenticationGuard {
    fn name(&self) -> &'static str {
        "authentication"
    }

    async fn check(&self, request: &mut GuardRequest<'_>) -> Verdict {
        if request.policy.is_public() {
            return Verdict::Allow;
        }

        let Some(token) = extract_token(request.headers) else {
            return Verdict::Deny(AppError::Unauthenticated(AuthFailure::MissingCredential));
        };

        // 签名错误与过期对外一致，仅在 debug 日志中区分
        let claims = match self.codec.verify(token) {
            Ok(claims) => claims,
            Err(reason) => {
                tracing::debug!(%reason, "Bearer token rejected");
                return Verdict::Deny(AppError::Unauthenticated(AuthFailure::InvalidCredential));
            }
        };

        // 账户在签发后被删除时令牌不再可用
        let identity = match self.credentials.find_by_id(claims.sub).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::debug!(subject = %claims.sub, "Token subject no longer exists");
                return Verdict::Deny(AppError::Unauthenticated(AuthFailure::SubjectNotFound));
            }
            Err(e) => return Verdict::Deny(e),
        };

        let role = match self.role_source {
            RoleSource::Token => claims.role,
            RoleSource::Repository => identity.role,
        };
        if identity.role != claims.role {
            tracing::debug!(
                subject = %claims.sub,
                token_role = %claims.role,
                current_role = %identity.role,
                effective_role = %role,
                "Role changed since token issuance"
            );
        }

        request.principal = Some(Principal::from_claims(claims, role));
        Verdict::Allow
    }
}

/// Compares the principal's role against the route requirement
#[derive(Debug, Default)]
pub struct AuthorizationGuard;

#[async_trait]
impl Guard for AuthorizationGuard {
    fn name(&self) -> &'static str {
        "authorization"
    }

    async fn check(&self, request: &mut GuardRequest<'_>) -> Verdict {
        if request.policy.is_public() {
            return Verdict::Allow;
        }

        // 正常情况下认证守卫已拒绝，这里不应到达
        let Some(principal) = &request.principal else {
            tracing::warn!("Authorization reached without a principal");
            return Verdict::Deny(AppError::Unauthenticated(AuthFailure::MissingCredential));
        };

        match request.policy {
            RoutePolicy::RequiresRole(required) if principal.role != required => {
                tracing::debug!(
                    principal = %principal.id,
                    role = %principal.role,
                    required = %required,
                    "Role mismatch"
                );
                Verdict::Deny(AppError::Forbidden)
            }
            _ => Verdict::Allow,
        }
    }
}

/// Result of running the whole chain
#[derive(Debug)]
pub enum Decision {
    Allow { principal: Option<Principal> },
    Deny(AppError),
}

/// Ordered guard list
#[derive(Clone)]
pub struct GuardChain {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardChain {
    pub fn new(guards: Vec<Arc<dyn Guard>>) -> Self {
        Self { guards }
    }

    /// Authentication, then authorization
    pub fn standard(
        codec: Arc<TokenCodec>,
        credentials: Arc<dyn CredentialRepository>,
        role_source: RoleSource,
    ) -> Self {
        Self::new(vec![
            Arc::new(AuthenticationGuard::new(codec, credentials, role_source)),
            Arc::new(AuthorizationGuard),
        ])
    }

    pub async fn evaluate(&self, policy: RoutePolicy, headers: &HeaderMap) -> Decision {
        let mut request = GuardRequest {
            policy,
            headers,
            principal: None,
        };

        for guard in &self.guards {
            if let Verdict::Deny(error) = guard.check(&mut request).await {
                metrics::counter!(
                    "guard_denials_total",
                    "guard" => guard.name(),
                    "status" => error.status_code().as_str().to_owned()
                )
                .increment(1);
                return Decision::Deny(error);
            }
        }

        Decision::Allow {
            principal: request.principal,
        }
    }
}
