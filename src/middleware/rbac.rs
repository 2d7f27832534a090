// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::Role,
};

/// 1. O Trait que define quem pode entrar numa área
pub trait RoleDef: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
    fn area() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

pub fn role_allowed<T: RoleDef>(role: Role) -> bool {
    T::allowed().contains(&role)
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // O papel já veio do banco no auth_guard; não há consulta aqui
        let AuthenticatedUser(user) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        if !role_allowed::<T>(user.role) {
            tracing::debug!(user = %user.id, role = user.role.as_str(), area = T::area(), "acesso negado");
            return Err(AppError::Forbidden(format!(
                "Seu perfil não tem acesso a {}.",
                T::area()
            )));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PERFIS (TIPOS)
// ---

pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn allowed() -> &'static [Role] { &[Role::Admin] }
    fn area() -> &'static str { "administração" }
}

pub struct FinanceAccess;
impl RoleDef for FinanceAccess {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Treasurer] }
    fn area() -> &'static str { "tesouraria" }
}

pub struct AnyStaff;
impl RoleDef for AnyStaff {
    fn allowed() -> &'static [Role] { &[Role::Admin, Role::Secretary, Role::Treasurer] }
    fn area() -> &'static str { "secretaria" }
}
