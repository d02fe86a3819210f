use crate::config::{AccountsConfig, CorsConfig};
use crate::credentials::{PasswordHasher, TokenIssuer};
use crate::uploads::UploadStore;
use crate::user::{configure, AccountService, AccountState, UserRepository};
use actix_cors::Cors;
use actix_web::{
    get, http::header, middleware::Logger, web, App, HttpResponse, HttpServer, Responder,
};
use std::sync::Arc;

#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "accounts-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Assemble the handler state from configuration and a store
pub fn build_state(
    config: &AccountsConfig,
    repository: Arc<dyn UserRepository>,
) -> anyhow::Result<web::Data<AccountState>> {
    let tokens = TokenIssuer::new(config.secrets.jwt_secret.as_bytes(), config.secrets.jwt_ttl)?;
    let uploads = UploadStore::new(config.uploads.dir.clone(), config.uploads.max_bytes);

    let service = AccountService::new(
        repository,
        Arc::new(PasswordHasher::new()),
        Arc::new(tokens),
        Arc::new(uploads),
    );

    Ok(web::Data::new(AccountState::new(
        service,
        config.expose_error_details,
    )))
}

/// CORS policy: configured origins with credentials and a narrow
/// method/header set
pub fn cors(config: &CorsConfig) -> Cors {
    let cors = config
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin));

    cors.allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allowed_header(header::ORIGIN)
        .expose_headers(vec![header::CONTENT_LENGTH])
        .supports_credentials()
        .max_age(config.max_age.as_secs() as usize)
}

pub async fn start_server(
    config: AccountsConfig,
    repository: Arc<dyn UserRepository>,
) -> anyhow::Result<()> {
    let state = build_state(&config, repository)?;
    let bind_address = config.server.bind_address();
    let cors_config = config.cors.clone();

    tracing::info!(
        address = %bind_address,
        origins = ?cors_config.allowed_origins,
        upload_dir = %config.uploads.dir.display(),
        "Starting accounts service"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&cors_config))
            .wrap(Logger::default())
            .service(health_check)
            .configure(configure(state.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().service(health_check)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "accounts-service");
    }

    #[actix_web::test]
    async fn test_cors_allows_configured_origin() {
        let app = test::init_service(
            App::new()
                .wrap(cors(&CorsConfig::default()))
                .service(health_check),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/health")
            .insert_header((header::ORIGIN, "http://localhost:3000"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }
}
