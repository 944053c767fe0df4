use super::response::{self, ApiResponse};
use crate::complaint::{ComplaintChanges, ComplaintQuery, ComplaintService, NewComplaint};
use crate::error::ServiceError;
use crate::middleware::ClientCtx;
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(create_complaint)
        .service(list_complaints)
        .service(assign_complaint)
        .service(add_comment)
        .service(view_complaint)
        .service(update_complaint)
        .service(delete_complaint);
}

#[derive(Deserialize)]
struct CommentForm {
    #[serde(default)]
    content: String,
}

#[post("/complaints")]
async fn create_complaint(
    client: ClientCtx,
    complaints: web::Data<ComplaintService>,
    form: web::Json<NewComplaint>,
) -> Result<HttpResponse, ServiceError> {
    let complaint = complaints.create(client.actor(), form.into_inner()).await?;
    Ok(response::created("Complaint created successfully", complaint))
}

#[get("/complaints")]
async fn list_complaints(
    client: ClientCtx,
    complaints: web::Data<ComplaintService>,
    query: web::Query<ComplaintQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = complaints.list(client.actor(), query.into_inner()).await?;
    Ok(response::ok("Complaints retrieved successfully", page))
}

#[get("/complaints/{complaint_id}")]
async fn view_complaint(
    client: ClientCtx,
    complaints: web::Data<ComplaintService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let complaint = complaints
        .get_by_id(client.actor(), path.into_inner())
        .await?;
    Ok(response::ok("Complaint retrieved successfully", complaint))
}

#[put("/complaints/{complaint_id}")]
async fn update_complaint(
    client: ClientCtx,
    complaints: web::Data<ComplaintService>,
    path: web::Path<i32>,
    form: web::Json<ComplaintChanges>,
) -> Result<HttpResponse, ServiceError> {
    let complaint = complaints
        .update(client.actor(), path.into_inner(), form.into_inner())
        .await?;
    Ok(response::ok("Complaint updated successfully", complaint))
}

#[put("/complaints/{complaint_id}/assign")]
async fn assign_complaint(
    client: ClientCtx,
    complaints: web::Data<ComplaintService>,
    path: web::Path<i32>,
    form: web::Json<ComplaintChanges>,
) -> Result<HttpResponse, ServiceError> {
    let complaint = complaints
        .assign(client.actor(), path.into_inner(), form.into_inner())
        .await?;
    Ok(response::ok("Complaint updated successfully", complaint))
}

#[delete("/complaints/{complaint_id}")]
async fn delete_complaint(
    client: ClientCtx,
    complaints: web::Data<ComplaintService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    complaints.delete(client.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Complaint deleted successfully")))
}

#[post("/complaints/{complaint_id}/comments")]
async fn add_comment(
    client: ClientCtx,
    complaints: web::Data<ComplaintService>,
    path: web::Path<i32>,
    form: web::Json<CommentForm>,
) -> Result<HttpResponse, ServiceError> {
    let comment = complaints
        .add_comment(client.actor(), path.into_inner(), &form.content)
        .await?;
    Ok(response::created("Comment added successfully", comment))
}
