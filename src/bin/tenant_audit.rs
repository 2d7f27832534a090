// src/bin/tenant_audit.rs
//
// Mostra o que está fisicamente gravado em cada igreja, sem filtro de tenant.
// Usa o contexto de sistema: é o único caminho que enxerga todas as igrejas.

use std::collections::BTreeMap;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use ekklesia::{
    config::{AppState, Config},
    db::{
        context::OperationContext,
        query::{Direction, Entity, Select},
    },
    models::{member::Member, tenancy::{Organization, TenantId}},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await
        .context("Falha ao conectar no banco")?;
    let state = AppState::with_pool(config, pool)?;

    let session = state.session(OperationContext::system());

    let orgs: Vec<Organization> = session
        .fetch_all(Select::new(Entity::Organization).order_by("name", Direction::Asc))
        .await?;
    let members: Vec<Member> = session
        .fetch_all(Select::new(Entity::Member).order_by("name", Direction::Asc))
        .await?;

    let mut by_tenant: BTreeMap<TenantId, Vec<&Member>> = BTreeMap::new();
    for member in &members {
        by_tenant.entry(member.tenant_id).or_default().push(member);
    }

    println!("=== AUDITORIA DE ISOLAMENTO ({} igrejas) ===", orgs.len());
    for org in &orgs {
        let rows = by_tenant.remove(&org.id).unwrap_or_default();
        println!("\n⛪ {} [{}] - {} membro(s)", org.name, org.id, rows.len());
        for m in rows {
            let status = if m.is_archived() { "arquivado" } else { "ativo" };
            println!("   - {} (CPF: {}) [{}]", m.name, m.cpf.as_deref().unwrap_or("-"), status);
        }
    }

    // Membro apontando para uma igreja que não existe mais é inconsistência
    for (tenant, rows) in by_tenant {
        println!("\n⚠️  {} membro(s) com tenant desconhecido {}", rows.len(), tenant);
    }

    Ok(())
}
