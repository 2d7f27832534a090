// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        context::OperationContext,
        interceptor::{FallbackPolicy, InterceptorChain},
        registry::ScopedEntityRegistry,
        session::Session,
        store::Store,
        AuditRepository, LedgerRepository, MemberRepository, OrganizationRepository,
        UserRepository,
    },
    services::{
        auth::AuthService, church_service::ChurchService, dashboard_service::DashboardService,
        document_service::DocumentService, ledger_service::LedgerService,
        member_service::MemberService,
    },
};

#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub tenant_fallback: FallbackPolicy,
    pub upload_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub seed_admin: Option<SeedAdmin>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Separado de `from_env` para os testes não mexerem no ambiente do processo.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {raw}"))?,
            None => 5,
        };

        let tenant_fallback = match get("TENANT_FALLBACK") {
            Some(raw) => raw.parse()?,
            None => FallbackPolicy::default(),
        };

        let seed_admin = match (get("SEED_ADMIN_EMAIL"), get("SEED_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            max_connections,
            tenant_fallback,
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./static/uploads")),
            fonts_dir: get("FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./fonts")),
            seed_admin,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: PgPool,
    // Cadeia de interceptores: montada uma única vez aqui
    pub chain: Arc<InterceptorChain>,
    pub user_repo: UserRepository,
    pub org_repo: OrganizationRepository,
    pub audit_repo: AuditRepository,
    pub auth_service: AuthService,
    pub member_service: MemberService,
    pub ledger_service: LedgerService,
    pub church_service: ChurchService,
    pub dashboard_service: DashboardService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::with_pool(config, db_pool)
    }

    pub fn with_pool(config: Config, db_pool: PgPool) -> anyhow::Result<Self> {
        // O registro precisa cobrir toda entidade com tenant_id; senão, não sobe.
        let registry = Arc::new(ScopedEntityRegistry::standard());
        registry.verify_complete()?;
        let chain = Arc::new(InterceptorChain::standard(registry, config.tenant_fallback));

        tracing::info!(fallback = ?config.tenant_fallback, "🛡️ Isolamento de tenants ativo");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let org_repo = OrganizationRepository::new(db_pool.clone());
        let member_repo = MemberRepository::new();
        let ledger_repo = LedgerRepository::new();
        let audit_repo = AuditRepository::new();

        let auth_service = AuthService::new(
            user_repo.clone(),
            org_repo.clone(),
            audit_repo.clone(),
            config.jwt_secret.clone(),
            db_pool.clone(),
        );
        let member_service =
            MemberService::new(member_repo.clone(), audit_repo.clone(), db_pool.clone());
        let ledger_service = LedgerService::new(
            ledger_repo,
            member_repo.clone(),
            audit_repo.clone(),
            db_pool.clone(),
        );
        let church_service = ChurchService::new(
            user_repo.clone(),
            org_repo.clone(),
            audit_repo.clone(),
            db_pool.clone(),
        );
        let dashboard_service = DashboardService::new(member_repo);
        let document_service = DocumentService::new(
            org_repo.clone(),
            config.fonts_dir.clone(),
            config.upload_dir.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            chain,
            user_repo,
            org_repo,
            audit_repo,
            auth_service,
            member_service,
            ledger_service,
            church_service,
            dashboard_service,
            document_service,
        })
    }

    /// Uma Session por operação, com o contexto de quem está executando.
    pub fn session(&self, ctx: OperationContext) -> Session {
        Session::new(Store::Postgres(self.db_pool.clone()), self.chain.clone(), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/ekklesia"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.tenant_fallback, FallbackPolicy::Open);
        assert!(config.seed_admin.is_none());
    }

    #[test]
    fn reads_fallback_policy_and_seed() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/ekklesia"),
            ("JWT_SECRET", "segredo"),
            ("TENANT_FALLBACK", "closed"),
            ("SEED_ADMIN_EMAIL", "admin@ekklesia.com"),
            ("SEED_ADMIN_PASSWORD", "admin123"),
        ]))
        .unwrap();

        assert_eq!(config.tenant_fallback, FallbackPolicy::Closed);
        assert_eq!(config.seed_admin.unwrap().email, "admin@ekklesia.com");
    }

    #[test]
    fn missing_required_vars_fail() {
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "x")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/ekklesia"),
            ("JWT_SECRET", "x"),
            ("TENANT_FALLBACK", "sometimes"),
        ]))
        .is_err());
    }
}
