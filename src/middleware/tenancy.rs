// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    config::AppState,
    db::{
        context::{Actor, OperationContext},
        session::Session,
    },
    middleware::auth::AuthenticatedUser,
};

// Uma Session por requisição. O contexto (quem é o usuário, qual a igreja)
// é capturado aqui, uma vez, a partir do usuário que o auth_guard carregou.
// Os handlers nunca escrevem filtro de tenant: só usam esta Session.
pub struct ScopedSession(pub Session);

impl ScopedSession {
    pub fn context_for(parts: &Parts) -> OperationContext {
        match parts.extensions.get::<AuthenticatedUser>() {
            Some(AuthenticatedUser(user)) => OperationContext::for_actor(Actor {
                user_id: user.id,
                tenant_id: user.tenant_id,
                role: user.role,
            }),
            None => {
                tracing::debug!("requisição sem usuário autenticado: contexto anônimo");
                OperationContext::anonymous()
            }
        }
    }
}

impl FromRequestParts<AppState> for ScopedSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(ScopedSession(state.session(Self::context_for(parts))))
    }
}
