use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{User, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::create_token;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub tenant_id: Uuid,
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    /// Corporate accounts get the tenant's markup applied to their fares.
    #[serde(default)]
    pub corporate: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct TenantSummary {
    pub id: Uuid,
    pub name: String,
}

/// Tenant directory for the registration form
pub async fn list_tenants(State(state): State<AppState>) -> AppResult<Json<Vec<TenantSummary>>> {
    let mut tenants: Vec<TenantSummary> = state
        .store
        .tenants
        .read()
        .await
        .values()
        .map(|tenant| TenantSummary {
            id: tenant.id,
            name: tenant.name.clone(),
        })
        .collect();
    tenants.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(tenants))
}

fn auth_response(user: &User, state: &AppState) -> AppResult<AuthResponse> {
    let token = create_token(
        user.id,
        user.tenant_id,
        &user.email,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        },
    })
}

/// Register a new customer account with a tenant
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    // The tenant must exist before anyone can join it.
    state.store.tenant(payload.tenant_id).await?;

    let existing = state
        .store
        .users
        .find(|user| user.email == payload.email)
        .await;
    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    let role = if payload.corporate {
        UserRole::CorporateCustomer
    } else {
        UserRole::Customer
    };

    let user = User {
        id: Uuid::new_v4(),
        tenant_id: payload.tenant_id,
        email: payload.email,
        password_hash,
        name: payload.name,
        phone: payload.phone,
        role,
        created_at: Utc::now(),
    };
    state.store.users.put(user.clone()).await;

    Ok(Json(auth_response(&user, &state)?))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = state
        .store
        .users
        .find(|user| user.email == payload.email)
        .await
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid email or password".to_string()))?;

    Ok(Json(auth_response(&user, &state)?))
}
