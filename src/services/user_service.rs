//! 用户管理服务

use crate::{error::AppError, models::user::*, repository::CredentialRepository};
use std::sync::Arc;
use uuid::Uuid;

const USER_NOT_FOUND: &str = "User not found";

pub struct UserService {
    credentials: Arc<dyn CredentialRepository>,
}

impl UserService {
    pub fn new(credentials: Arc<dyn CredentialRepository>) -> Self {
        Self { credentials }
    }

    /// 列出所有用户
    pub async fn list(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.credentials.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// 获取用户详情
    pub async fn get(&self, id: Uuid) -> Result<UserResponse, AppError> {
        self.credentials
            .find_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))
    }

    /// 修改用户角色
    ///
    /// 已签发的令牌仍携带旧角色，是否立即生效取决于 `security.role_source`。
    pub async fn update_role(
        &self,
        actor: Uuid,
        id: Uuid,
        req: UpdateRoleRequest,
    ) -> Result<UserResponse, AppError> {
        let role: Role = req
            .role
            .as_deref()
            .ok_or(UnknownRole)
            .and_then(|raw| raw.parse::<Role>())
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let updated = self
            .credentials
            .update_role(id, role)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;

        tracing::info!(
            actor = %actor,
            user_id = %updated.id,
            role = %updated.role,
            "User role updated"
        );

        Ok(UserResponse::from(updated))
    }

    /// 删除用户；不允许删除自己
    pub async fn delete(&self, actor: Uuid, id: Uuid) -> Result<(), AppError> {
        if actor == id {
            return Err(AppError::validation("You cannot delete your own account"));
        }

        if !self.credentials.delete(id).await? {
            return Err(AppError::not_found(USER_NOT_FOUND));
        }

        tracing::info!(actor = %actor, user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCredentialRepository;

    async fn seeded() -> (UserService, Identity, Identity) {
        let repo = Arc::new(InMemoryCredentialRepository::new());
        let admin = repo
            .insert(NewIdentity {
                username: "root".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();
        let alice = repo
            .insert(NewIdentity {
                username: "alice".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Regular,
            })
            .await
            .unwrap();

        (UserService::new(repo), admin, alice)
    }

    #[tokio::test]
    async fn test_update_role_rejects_unknown_role() {
        let (service, admin, alice) = seeded().await;

        let req = UpdateRoleRequest {
            role: Some("superuser".to_string()),
        };
        let err = service.update_role(admin.id, alice.id, req).await.unwrap_err();
        assert_eq!(err.code(), 400);
        assert_eq!(err.user_message(), "Invalid role. Valid roles are: admin, regular");

        let err = service
            .update_role(admin.id, alice.id, UpdateRoleRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), 400);
    }

    #[tokio::test]
    async fn test_update_role_promotes_user() {
        let (service, admin, alice) = seeded().await;

        let req = UpdateRoleRequest {
            role: Some("admin".to_string()),
        };
        let updated = service.update_role(admin.id, alice.id, req).await.unwrap();
        assert_eq!(updated.role, Role::Admin);

        let req = UpdateRoleRequest {
            role: Some("admin".to_string()),
        };
        let err = service.update_role(admin.id, Uuid::new_v4(), req).await.unwrap_err();
        assert_eq!(err.code(), 404);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let (service, admin, alice) = seeded().await;

        assert_eq!(service.delete(admin.id, admin.id).await.unwrap_err().code(), 400);
        service.delete(admin.id, alice.id).await.unwrap();
        assert_eq!(service.delete(admin.id, alice.id).await.unwrap_err().code(), 404);
        assert_eq!(service.get(alice.id).await.unwrap_err().code(), 404);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }
}
