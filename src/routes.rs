// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};

use crate::{config::AppState, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Equipe da igreja (o /me vale para qualquer perfil)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        );

    let member_routes = Router::new()
        .route(
            "/",
            get(handlers::members::list_members).post(handlers::members::create_member),
        )
        .route(
            "/{id}",
            get(handlers::members::get_member).put(handlers::members::update_member),
        )
        .route("/{id}/archive", post(handlers::members::archive_member))
        .route("/{id}/reactivate", post(handlers::members::reactivate_member))
        .route("/{id}/declaration", get(handlers::documents::member_declaration))
        .route("/{id}/card", get(handlers::documents::member_card))
        .route("/{id}/photo", put(handlers::documents::upload_member_photo));

    let ledger_routes = Router::new().route(
        "/",
        get(handlers::ledger::get_overview).post(handlers::ledger::create_entry),
    );

    let settings_routes = Router::new().route(
        "/",
        get(handlers::settings::get_settings).put(handlers::settings::update_settings),
    );

    // Tudo abaixo exige token válido
    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/members", member_routes)
        .nest("/api/ledger", ledger_routes)
        .nest("/api/settings", settings_routes)
        .route("/api/dashboard", get(handlers::dashboard::get_dashboard))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .with_state(app_state)
}
