use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::{ContentService, CourseService, UserService};
use crate::utils::PaginationParams;

#[derive(Debug, serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/user/profile",
    tag = "user",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "当前用户信息", body = User),
        (status = 401, description = "未登录")
    )
)]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    match user_service.get_user_by_id(user.id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(ApiResponse::ok(profile))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/user/profile",
    tag = "user",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "更新后的用户信息", body = User),
        (status = 401, description = "未登录")
    )
)]
pub async fn update_profile(
    user_service: web::Data<UserService>,
    user: AuthUser,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    match user_service
        .update_profile(user.id, request.into_inner())
        .await
    {
        Ok(profile) => Ok(HttpResponse::Ok().json(ApiResponse::ok(profile))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/hpa/history",
    tag = "user",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "浏览记录，按时间倒序"),
        (status = 401, description = "未登录")
    )
)]
pub async fn get_browse_history(
    content_service: web::Data<ContentService>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let params = PaginationParams::new(query.page, query.page_size);
    match content_service.get_browse_history(user.id, &params).await {
        Ok(history) => Ok(HttpResponse::Ok().json(ApiResponse::ok(history))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/hpa/orders",
    tag = "user",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "订单列表，含课程标题"),
        (status = 401, description = "未登录")
    )
)]
pub async fn get_orders(
    course_service: web::Data<CourseService>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let params = PaginationParams::new(query.page, query.page_size);
    match course_service.get_user_orders(user.id, &params).await {
        Ok(orders) => Ok(HttpResponse::Ok().json(ApiResponse::ok(orders))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile)),
    );
}
