use super::response::{self, ApiResponse};
use crate::auth::{AuthService, Credentials, ProfileChanges, Registration};
use crate::error::ServiceError;
use crate::middleware::ClientCtx;
use actix_web::{get, post, put, web, HttpResponse};

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(register)
        .service(login)
        .service(view_profile)
        .service(update_profile)
        .service(logout);
}

#[post("/auth/register")]
async fn register(
    auth: web::Data<AuthService>,
    form: web::Json<Registration>,
) -> Result<HttpResponse, ServiceError> {
    let grant = auth.register(form.into_inner()).await?;
    Ok(response::created("User registered successfully", grant))
}

#[post("/auth/login")]
async fn login(
    auth: web::Data<AuthService>,
    form: web::Json<Credentials>,
) -> Result<HttpResponse, ServiceError> {
    let grant = auth.login(form.into_inner()).await?;
    Ok(response::ok("Login successful", grant))
}

#[get("/auth/profile")]
async fn view_profile(
    client: ClientCtx,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, ServiceError> {
    let profile = auth.profile(client.actor()).await?;
    Ok(response::ok("Profile retrieved successfully", profile))
}

#[put("/auth/profile")]
async fn update_profile(
    client: ClientCtx,
    auth: web::Data<AuthService>,
    form: web::Json<ProfileChanges>,
) -> Result<HttpResponse, ServiceError> {
    let user = auth.update_profile(client.actor(), form.into_inner()).await?;
    Ok(response::ok("Profile updated successfully", user))
}

/// Tokens are stateless; the client simply discards its copy.
#[post("/auth/logout")]
async fn logout(client: ClientCtx) -> HttpResponse {
    log::info!("User {} logged out", client.get_id());
    HttpResponse::Ok().json(ApiResponse::message("Logged out successfully"))
}
