//! 认证服务：注册、登录、管理员引导

use crate::{
    auth::{jwt::ClaimSet, password::PasswordHasher, TokenCodec},
    error::{AppError, AuthFailure},
    models::{auth::*, user::*},
    repository::{credential_repo::USERNAME_TAKEN, CredentialRepository},
};
use std::sync::Arc;
use validator::Validate;

pub struct AuthService {
    credentials: Arc<dyn CredentialRepository>,
    hasher: Arc<PasswordHasher>,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        hasher: Arc<PasswordHasher>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            credentials,
            hasher,
            codec,
        }
    }

    /// 注册新账户，角色固定为 regular
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        req.validate()?;
        let (Some(username), Some(password)) = (req.username, req.password) else {
            return Err(AppError::validation("username and password are required"));
        };

        // 提前检查避免无谓的哈希计算；唯一约束仍以仓储写入为准
        if self.credentials.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let password_hash = self.hash_password(password).await?;
        let identity = self
            .credentials
            .insert(NewIdentity {
                username,
                password_hash,
                role: Role::Regular,
            })
            .await?;

        tracing::info!(user_id = %identity.id, username = %identity.username, "User registered");
        metrics::counter!("registrations_total").increment(1);

        Ok(UserResponse::from(identity))
    }

    /// 用户登录
    ///
    /// 用户不存在与密码错误返回同一个错误，耗时也一致。
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        req.validate()?;
        let (Some(username), Some(password)) = (req.username, req.password) else {
            return Err(AppError::validation("username and password are required"));
        };

        let identity = self.credentials.find_by_username(&username).await?;

        let hasher = self.hasher.clone();
        let (identity, verified) = tokio::task::spawn_blocking(move || match identity {
            Some(identity) => {
                let verified = hasher.verify(&password, &identity.password_hash);
                (Some(identity), verified)
            }
            None => (None, hasher.verify_dummy(&password)),
        })
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

        let identity = match identity {
            Some(identity) if verified => identity,
            _ => {
                tracing::info!(username = %username, "Login failed");
                metrics::counter!("login_attempts_total", "outcome" => "failure").increment(1);
                return Err(AppError::Unauthenticated(AuthFailure::InvalidCredentials));
            }
        };

        let access_token = self.codec.issue_access_token(&ClaimSet {
            subject: identity.id,
            username: identity.username.clone(),
            role: identity.role,
        })?;

        tracing::info!(user_id = %identity.id, role = %identity.role, "User logged in");
        metrics::counter!("login_attempts_total", "outcome" => "success").increment(1);

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer",
            expires_in: self.codec.access_token_exp_secs(),
        })
    }

    /// 确保引导管理员账户存在；用户名已存在时不做任何修改
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<(), AppError> {
        if let Some(existing) = self.credentials.find_by_username(username).await? {
            if existing.role != Role::Admin {
                tracing::warn!(
                    username = %username,
                    role = %existing.role,
                    "Bootstrap admin username exists without admin role; leaving unchanged"
                );
            }
            return Ok(());
        }

        let password_hash = self.hash_password(password.to_string()).await?;
        match self
            .credentials
            .insert(NewIdentity {
                username: username.to_string(),
                password_hash,
                role: Role::Admin,
            })
            .await
        {
            Ok(identity) => {
                tracing::info!(user_id = %identity.id, username = %username, "Bootstrap admin created");
                Ok(())
            }
            // 并发启动的另一个实例已创建
            Err(AppError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }
}
