//! 访问控制中间件
//!
//! 以 route_layer 方式挂载，只对已匹配的路由生效（未知路径仍返回 404）。

use crate::{
    auth::{
        guard::{Decision, GuardChain, Principal},
        policy::RoutePolicyTable,
    },
    error::{AppError, AuthFailure},
};
use axum::{
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 路由策略表与守卫链
pub struct Gatekeeper {
    policies: RoutePolicyTable,
    chain: GuardChain,
}

impl Gatekeeper {
    pub fn new(policies: RoutePolicyTable, chain: GuardChain) -> Self {
        Self { policies, chain }
    }
}

// 在 handler 中直接提取 Principal
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AppError::Unauthenticated(AuthFailure::MissingCredential))
    }
}

/// 从 Authorization 头提取 Bearer 令牌
///
/// scheme 不区分大小写，空令牌视为缺失。
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// 访问控制中间件
///
/// 查表得到路由策略后运行守卫链；通过时把 Principal 附加到请求扩展。
/// 没有声明策略的路由一律拒绝。
pub async fn guard_middleware(
    State(gatekeeper): State<Arc<Gatekeeper>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let template = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned());

    // axum 的 get 同时响应 HEAD
    let method = if req.method() == Method::HEAD {
        Method::GET
    } else {
        req.method().clone()
    };

    let policy = match template
        .as_deref()
        .and_then(|path| gatekeeper.policies.lookup(&method, path))
    {
        Some(policy) => policy,
        None => {
            tracing::error!(
                method = %req.method(),
                route = template.as_deref().unwrap_or("<unmatched>"),
                "No access policy declared for route"
            );
            return Err(AppError::Forbidden);
        }
    };

    match gatekeeper.chain.evaluate(policy, req.headers()).await {
        Decision::Allow { principal } => {
            if let Some(principal) = principal {
                tracing::debug!(
                    principal = %principal.id(),
                    role = %principal.role(),
                    %policy,
                    "Access granted"
                );
                req.extensions_mut().insert(principal);
            }
            Ok(next.run(req).await)
        }
        Decision::Deny(error) => Err(error),
    }
}
