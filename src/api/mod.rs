// Copyright 2023 Remi Bernotavicius

//! The JSON HTTP API, mounted under `/api`.

use crate::config::Config;
use crate::database::Database;
use crate::validation::Limits;
use crate::Result;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::path::PathBuf;
use tokio::net::TcpListener;

mod auth;
mod catalog;
mod extract;
mod recipes;
mod users;
mod views;


#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub limits: Limits,
}

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/tags/", get(catalog::list_tags))
        .route("/tags/{id}/", get(catalog::get_tag))
        .route("/ingredients/", get(catalog::list_ingredients))
        .route("/ingredients/{id}/", get(catalog::get_ingredient))
        .route("/recipes/", get(recipes::list).post(recipes::create))
        .route(
            "/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/recipes/{id}/",
            get(recipes::get)
                .patch(recipes::update)
                .delete(recipes::delete),
        )
        .route(
            "/recipes/{id}/favorite/",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .route("/users/me/", get(users::me))
        .route("/users/subscriptions/", get(users::subscriptions))
        .route("/users/{id}/", get(users::get))
        .route(
            "/users/{id}/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .with_state(state);

    Router::new().nest("/api", routes).fallback(handler_404)
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "not found" })))
}

pub async fn serve(config: Config, path: PathBuf) -> Result<()> {
    log::info!("opening database {}", path.display());
    let state = AppState {
        db: Database::open(&path, config.pool_size)?,
        limits: config.limits(),
    };

    let listener = TcpListener::bind(config.bind).await?;
    log::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("received Ctrl+C, shutting down"),
            Err(e) => {
                log::error!("failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
