use super::response::{self, ApiResponse};
use crate::error::ServiceError;
use crate::middleware::ClientCtx;
use crate::permission::{authorize_user_admin, authorize_user_directory};
use crate::user::{UserChanges, UserQuery, UserService};
use actix_web::{delete, get, put, web, HttpResponse};

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    // `/users/stats/overview` must resolve before `/users/{user_id}`.
    conf.service(view_stats)
        .service(list_users)
        .service(view_user)
        .service(update_user)
        .service(deactivate_user);
}

#[get("/users/stats/overview")]
async fn view_stats(
    client: ClientCtx,
    users: web::Data<UserService>,
) -> Result<HttpResponse, ServiceError> {
    client.require(authorize_user_directory)?;
    let stats = users.stats().await?;
    Ok(response::ok("User statistics retrieved successfully", stats))
}

#[get("/users")]
async fn list_users(
    client: ClientCtx,
    users: web::Data<UserService>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, ServiceError> {
    client.require(authorize_user_directory)?;
    let page = users.list(query.into_inner()).await?;
    Ok(response::ok("Users retrieved successfully", page))
}

#[get("/users/{user_id}")]
async fn view_user(
    client: ClientCtx,
    users: web::Data<UserService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    client.require(authorize_user_directory)?;
    let user = users.get(path.into_inner()).await?;
    Ok(response::ok("User retrieved successfully", user))
}

#[put("/users/{user_id}")]
async fn update_user(
    client: ClientCtx,
    users: web::Data<UserService>,
    path: web::Path<i32>,
    form: web::Json<UserChanges>,
) -> Result<HttpResponse, ServiceError> {
    client.require(authorize_user_admin)?;
    let user = users.update(path.into_inner(), form.into_inner()).await?;
    Ok(response::ok("User updated successfully", user))
}

#[delete("/users/{user_id}")]
async fn deactivate_user(
    client: ClientCtx,
    users: web::Data<UserService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    client.require(authorize_user_admin)?;
    users.deactivate(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("User deleted successfully")))
}
