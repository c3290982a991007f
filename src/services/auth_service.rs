use crate::entities::{UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{JwtService, hash_password, validate_email, validate_password, verify_password};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        validate_email(&request.email)?;
        validate_password(&request.password)?;
        let username = request.username.trim();
        if username.is_empty() || username.len() > 64 {
            return Err(AppError::ValidationError(
                "用户名长度必须在1-64字符之间".to_string(),
            ));
        }

        let email = request.email.to_lowercase();
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email.clone()))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError("邮箱已被注册".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let user = users::ActiveModel {
            email: Set(email),
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            role: Set(UserRole::Customer),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("User registered: {} ({})", user.id, user.email);
        self.issue_tokens(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = request.email.to_lowercase();
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        self.issue_tokens(user)
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;

        // 重新读库，令牌有效期内角色变化也能生效
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;

        self.issue_tokens(user)
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let role = user.role.to_string();
        let access_token = self.jwt_service.generate_access_token(user.id, &role)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user.id, &role)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user: UserResponse::from(user),
        })
    }
}
