// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{query::Entity, AuditRepository, OrganizationRepository, UserRepository},
    models::{
        audit::AuditAction,
        auth::{Claims, Role, User},
    },
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    org_repo: OrganizationRepository,
    audit_repo: AuditRepository,
    jwt_secret: String,
    pool: PgPool,
}

/// Hash em uma thread separada (bcrypt é caro e bloqueante).
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        org_repo: OrganizationRepository,
        audit_repo: AuditRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, org_repo, audit_repo, jwt_secret, pool }
    }

    /// Cadastro: cria a igreja e o seu administrador (tudo ou nada).
    pub async fn register_church(
        &self,
        church_name: &str,
        admin_name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AppError> {
        // 1. E-mail é único no sistema inteiro
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        // 2. Hashing (fora da transação, pois não toca no banco)
        let hashed_password = hash_password(password).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 3. Cria a Organização (Igreja)
        let church = self.org_repo.create_organization(&mut *tx, church_name).await?;

        // 4. Cria o dono da conta, admin da própria igreja
        let admin = self
            .user_repo
            .create_user(&mut *tx, church.id, admin_name, email, &hashed_password, Role::Admin)
            .await?;

        // 5. Auditoria inicial
        self.audit_repo
            .record(
                &mut *tx,
                Some(admin.id),
                AuditAction::Signup,
                Entity::Organization,
                Some(church.id.0),
                &format!("Nova organização criada: {}", church.name),
            )
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!(tenant = %church.id, "⛪ Nova igreja cadastrada");
        self.create_token(&admin)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(&user)
    }

    /// Valida o token e recarrega o usuário. A linha de `users` é a fonte da
    /// verdade para o tenant; as claims só servem para achar o usuário.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if user.tenant_id != claims.tid {
            tracing::warn!(user = %user.id, "token com tenant divergente do cadastro");
            return Err(AppError::InvalidToken);
        }

        Ok(user)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user.id,
            tid: user.tenant_id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tenancy::TenantId;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn service(secret: &str) -> AuthService {
        // Pool preguiçoso: nenhum destes testes toca no banco
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/ekklesia_test")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            OrganizationRepository::new(pool.clone()),
            AuditRepository::new(),
            secret.to_string(),
            pool,
        )
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            tenant_id: TenantId::new(),
            name: "Tesoureiro".into(),
            email: "tesouraria@igreja.com".into(),
            password_hash: String::new(),
            role: Role::Treasurer,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_carries_user_tenant_and_role() {
        let service = service("segredo");
        let user = user();

        let token = service.create_token(&user).unwrap();
        let claims = service.decode_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.tid, user.tenant_id);
        assert_eq!(claims.role, Role::Treasurer);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service("segredo-a").create_token(&user()).unwrap();
        let err = service("segredo-b").decode_token(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("admin123").await.unwrap();
        assert_ne!(hashed, "admin123");
        assert!(verify("admin123", &hashed).unwrap());
    }
}
