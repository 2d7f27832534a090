use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("CPF já cadastrado")]
    CpfAlreadyExists,

    // O CPF pertence a um membro arquivado desta mesma igreja
    #[error("CPF pertence ao membro arquivado {name}")]
    MemberArchived { id: Uuid, name: String },

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Igreja não encontrada")]
    OrganizationNotFound,

    #[error("Membro não encontrado")]
    MemberNotFound,

    #[error("Acesso restrito: {0}")]
    Forbidden(String),

    #[error("Operação exige um usuário vinculado a uma igreja")]
    TenantRequired,

    #[error("Tentativa de gravar {entity} para outra igreja")]
    TenantMismatch { entity: &'static str },

    #[error("Registro de isolamento incompleto: {0}")]
    RegistryIncomplete(String),

    #[error("Imagem inválida: {0}")]
    InvalidImage(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists
            | AppError::CpfAlreadyExists
            | AppError::MemberArchived { .. } => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::OrganizationNotFound | AppError::MemberNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::Forbidden(_) | AppError::TenantRequired | AppError::TenantMismatch { .. } => {
                StatusCode::FORBIDDEN
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }
            AppError::EmailAlreadyExists => json!({ "error": "Este e-mail já está em uso." }),
            AppError::CpfAlreadyExists => json!({ "error": "CPF já existente." }),
            AppError::MemberArchived { id, name } => json!({
                "error": format!("CPF de {} (Arquivado). Reative o cadastro existente.", name),
                "archivedMemberId": id,
            }),
            AppError::InvalidCredentials => json!({ "error": "E-mail ou senha inválidos." }),
            AppError::InvalidToken => {
                json!({ "error": "Token de autenticação inválido ou ausente." })
            }
            AppError::UserNotFound => json!({ "error": "Usuário não encontrado." }),
            AppError::OrganizationNotFound => json!({ "error": "Igreja não encontrada." }),
            AppError::MemberNotFound => json!({ "error": "Membro não encontrado." }),
            AppError::InvalidImage(_) => json!({ "error": "Envie uma foto em PNG ou JPEG." }),
            AppError::Forbidden(reason) => json!({ "error": format!("🚫 Acesso restrito: {}", reason) }),
            AppError::TenantRequired => {
                json!({ "error": "Operação exige um usuário vinculado a uma igreja." })
            }
            AppError::TenantMismatch { entity } => {
                tracing::warn!("Gravação bloqueada em {}: tenant divergente", entity);
                json!({ "error": "Operação não permitida para esta igreja." })
            }

            // Todos os outros erros (DatabaseError, InternalServerError...) viram 500.
            // O `tracing` loga a mensagem detalhada, o cliente recebe uma genérica.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                json!({ "error": "Ocorreu um erro inesperado." })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_http_status() {
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::MemberNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::CpfAlreadyExists.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::TenantMismatch { entity: "members" }.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Forbidden("admin".into()).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn internal_errors_are_hidden_behind_500() {
        let response = AppError::DatabaseError(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::RegistryIncomplete("members".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
