use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<UserResponse> {
        Ok(UserResponse::from(self.get_user(user_id).await?))
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateUserRequest,
    ) -> AppResult<UserResponse> {
        let user = self.get_user(user_id).await?;

        let mut am = user.into_active_model();
        if let Some(username) = request.username {
            let username = username.trim().to_string();
            if username.is_empty() || username.len() > 64 {
                return Err(AppError::ValidationError(
                    "用户名长度必须在1-64字符之间".to_string(),
                ));
            }
            am.username = Set(username);
        }
        let user = am.update(&self.pool).await?;

        Ok(UserResponse::from(user))
    }

    /// 管理端角色白名单检查，不在白名单内直接 403
    pub async fn require_admin(&self, user_id: i64) -> AppResult<users::Model> {
        let user = self.get_user(user_id).await?;
        if !user.role.is_admin() {
            return Err(AppError::PermissionDenied);
        }
        Ok(user)
    }
}
