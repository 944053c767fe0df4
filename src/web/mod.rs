pub mod auth;
pub mod complaints;
pub mod response;
pub mod users;

use crate::app_config::AppConfig;
use crate::auth::AuthService;
use crate::complaint::ComplaintService;
use crate::db::Store;
use crate::session::TokenKeys;
use crate::user::UserService;
use actix_web::{error, get, web, HttpRequest, HttpResponse};
use response::ApiResponse;

/// Services shared by every worker. Built once in `main` (or a test) and
/// registered on each `App` through [`AppState::register`].
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub keys: TokenKeys,
    pub complaints: ComplaintService,
    pub users: UserService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(store: Store, keys: TokenKeys, config: &AppConfig) -> Self {
        Self {
            complaints: ComplaintService::new(store.clone(), config.complaints.clone()),
            users: UserService::new(store.clone(), config.users.clone()),
            auth: AuthService::new(store.clone(), keys.clone(), config.auth.allow_role_selection),
            store,
            keys,
        }
    }

    /// Adds shared data, extractor settings and every route.
    pub fn register(&self, conf: &mut web::ServiceConfig) {
        conf.app_data(web::Data::new(self.store.clone()))
            .app_data(web::Data::new(self.keys.clone()))
            .app_data(web::Data::new(self.complaints.clone()))
            .app_data(web::Data::new(self.users.clone()))
            .app_data(web::Data::new(self.auth.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, req| bad_request(err, req)))
            .app_data(web::QueryConfig::default().error_handler(|err, req| bad_request(err, req)))
            .app_data(web::PathConfig::default().error_handler(|err, req| bad_request(err, req)));

        configure(conf);
    }
}

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut web::ServiceConfig) {
    // Route resolution stops at the first match; fixed segments such as
    // `/users/stats/overview` are registered before `/users/{id}`.
    conf.service(health);
    auth::configure(conf);
    complaints::configure(conf);
    users::configure(conf);
}

/// Malformed JSON bodies, query strings and path segments become 400 envelopes.
fn bad_request<E: std::fmt::Debug + std::fmt::Display + 'static>(
    err: E,
    req: &HttpRequest,
) -> actix_web::Error {
    let detail = err.to_string();
    log::debug!("Rejected request to {}: {}", req.path(), detail);

    let response = HttpResponse::BadRequest().json(ApiResponse::failure("Validation error", Some(detail)));
    error::InternalError::from_response(err, response).into()
}

#[get("/health")]
async fn health() -> HttpResponse {
    response::ok(
        "Service is healthy",
        serde_json::json!({ "status": "ok", "timestamp": chrono::Utc::now() }),
    )
}
