use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::middlewares::AdminUser;
use crate::models::*;
use crate::services::{ContentService, CourseService, FileService};
use crate::utils::PaginationParams;

use super::user::PageQuery;

// ========== 分类 ==========

#[utoipa::path(
    post,
    path = "/api/v1/admin/categories",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateCategoryRequest,
    responses((status = 200, body = Category), (status = 403, description = "需要管理员权限"))
)]
pub async fn create_category(
    content_service: web::Data<ContentService>,
    _admin: AdminUser,
    request: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse> {
    match content_service.create_category(request.into_inner()).await {
        Ok(category) => Ok(HttpResponse::Ok().json(ApiResponse::ok(category))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/categories/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateCategoryRequest,
    responses((status = 200, body = Category), (status = 404, description = "分类不存在"))
)]
pub async fn update_category(
    content_service: web::Data<ContentService>,
    _admin: AdminUser,
    id: web::Path<i64>,
    request: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse> {
    match content_service
        .update_category(*id, request.into_inner())
        .await
    {
        Ok(category) => Ok(HttpResponse::Ok().json(ApiResponse::ok(category))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/categories/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "删除成功"))
)]
pub async fn delete_category(
    content_service: web::Data<ContentService>,
    _admin: AdminUser,
    id: web::Path<i64>,
) -> Result<HttpResponse> {
    match content_service.delete_category(*id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::ok(()))),
        Err(e) => Ok(e.error_response()),
    }
}

// ========== 笔记 ==========

#[utoipa::path(
    post,
    path = "/api/v1/admin/notes",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateNoteRequest,
    responses((status = 200, body = Note))
)]
pub async fn create_note(
    content_service: web::Data<ContentService>,
    _admin: AdminUser,
    request: web::Json<CreateNoteRequest>,
) -> Result<HttpResponse> {
    match content_service.create_note(request.into_inner()).await {
        Ok(note) => Ok(HttpResponse::Ok().json(ApiResponse::ok(note))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/notes/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateNoteRequest,
    responses((status = 200, body = Note), (status = 404, description = "笔记不存在"))
)]
pub async fn update_note(
    content_service: web::Data<ContentService>,
    _admin: AdminUser,
    id: web::Path<i64>,
    request: web::Json<CreateNoteRequest>,
) -> Result<HttpResponse> {
    match content_service.update_note(*id, request.into_inner()).await {
        Ok(note) => Ok(HttpResponse::Ok().json(ApiResponse::ok(note))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/notes/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "删除成功"))
)]
pub async fn delete_note(
    content_service: web::Data<ContentService>,
    _admin: AdminUser,
    id: web::Path<i64>,
) -> Result<HttpResponse> {
    match content_service.delete_note(*id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::ok(()))),
        Err(e) => Ok(e.error_response()),
    }
}

// ========== 课程 ==========

#[utoipa::path(
    get,
    path = "/api/v1/admin/courses",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "全部课程，含未公开"))
)]
pub async fn get_all_courses(
    course_service: web::Data<CourseService>,
    _admin: AdminUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let params = PaginationParams::new(query.page, query.page_size);
    match course_service.get_all_courses(&params).await {
        Ok(courses) => Ok(HttpResponse::Ok().json(ApiResponse::ok(courses))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/courses",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateCourseRequest,
    responses((status = 200, body = Course))
)]
pub async fn create_course(
    course_service: web::Data<CourseService>,
    _admin: AdminUser,
    request: web::Json<CreateCourseRequest>,
) -> Result<HttpResponse> {
    match course_service.create_course(request.into_inner()).await {
        Ok(course) => Ok(HttpResponse::Ok().json(ApiResponse::ok(course))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/courses/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateCourseRequest,
    responses((status = 200, body = Course), (status = 404, description = "课程不存在"))
)]
pub async fn update_course(
    course_service: web::Data<CourseService>,
    _admin: AdminUser,
    id: web::Path<i64>,
    request: web::Json<CreateCourseRequest>,
) -> Result<HttpResponse> {
    match course_service.update_course(*id, request.into_inner()).await {
        Ok(course) => Ok(HttpResponse::Ok().json(ApiResponse::ok(course))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/courses/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "删除成功"))
)]
pub async fn delete_course(
    course_service: web::Data<CourseService>,
    _admin: AdminUser,
    id: web::Path<i64>,
) -> Result<HttpResponse> {
    match course_service.delete_course(*id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::ok(()))),
        Err(e) => Ok(e.error_response()),
    }
}

// ========== 课程文件 ==========

#[utoipa::path(
    get,
    path = "/api/v1/admin/courses/{id}/files",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "课程文件列表，含 intro 与 resource"))
)]
pub async fn get_course_files(
    file_service: web::Data<FileService>,
    _admin: AdminUser,
    id: web::Path<i64>,
) -> Result<HttpResponse> {
    match file_service.get_course_files(*id).await {
        Ok(files) => Ok(HttpResponse::Ok().json(ApiResponse::ok(files))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/courses/{id}/upload-url",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = UploadUrlRequest,
    responses((status = 200, description = "预签名上传地址", body = UploadUrlResponse))
)]
pub async fn create_upload_url(
    course_service: web::Data<CourseService>,
    file_service: web::Data<FileService>,
    _admin: AdminUser,
    id: web::Path<i64>,
    request: web::Json<UploadUrlRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = course_service.get_course_by_id(*id).await {
        return Ok(e.error_response());
    }
    match file_service.create_upload_url(*id, request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::ok(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/courses/{id}/files",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = RegisterCourseFileRequest,
    responses((status = 200, description = "文件已登记", body = CourseFile))
)]
pub async fn register_course_file(
    course_service: web::Data<CourseService>,
    file_service: web::Data<FileService>,
    _admin: AdminUser,
    id: web::Path<i64>,
    request: web::Json<RegisterCourseFileRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = course_service.get_course_by_id(*id).await {
        return Ok(e.error_response());
    }
    match file_service.register_file(*id, request.into_inner()).await {
        Ok(file) => Ok(HttpResponse::Ok().json(ApiResponse::ok(file))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/files/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "删除成功"), (status = 404, description = "文件不存在"))
)]
pub async fn delete_course_file(
    file_service: web::Data<FileService>,
    _admin: AdminUser,
    id: web::Path<i64>,
) -> Result<HttpResponse> {
    match file_service.delete_file(*id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::ok(()))),
        Err(e) => Ok(e.error_response()),
    }
}

// ========== 邀请码 ==========

#[utoipa::path(
    get,
    path = "/api/v1/admin/invite-codes",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "邀请码列表"))
)]
pub async fn get_invite_codes(
    course_service: web::Data<CourseService>,
    _admin: AdminUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let params = PaginationParams::new(query.page, query.page_size);
    match course_service.get_all_invite_codes(&params).await {
        Ok(codes) => Ok(HttpResponse::Ok().json(ApiResponse::ok(codes))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/invite-codes",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateInviteCodeRequest,
    responses((status = 200, body = InviteCode), (status = 404, description = "课程不存在"))
)]
pub async fn create_invite_code(
    course_service: web::Data<CourseService>,
    _admin: AdminUser,
    request: web::Json<CreateInviteCodeRequest>,
) -> Result<HttpResponse> {
    let expire_at = match &request.expire_at {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(_) => {
                return Ok(AppError::InvalidParam("expire_at 格式不正确".to_string())
                    .error_response());
            }
        },
        None => None,
    };

    match course_service
        .create_invite_code(request.course_id, request.max_uses.unwrap_or(1), expire_at)
        .await
    {
        Ok(code) => Ok(HttpResponse::Ok().json(ApiResponse::ok(code))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/categories", web::post().to(create_category))
            .route("/categories/{id}", web::put().to(update_category))
            .route("/categories/{id}", web::delete().to(delete_category))
            .route("/notes", web::post().to(create_note))
            .route("/notes/{id}", web::put().to(update_note))
            .route("/notes/{id}", web::delete().to(delete_note))
            .route("/courses", web::get().to(get_all_courses))
            .route("/courses", web::post().to(create_course))
            .route("/courses/{id}", web::put().to(update_course))
            .route("/courses/{id}", web::delete().to(delete_course))
            .route("/courses/{id}/upload-url", web::post().to(create_upload_url))
            .route("/courses/{id}/files", web::get().to(get_course_files))
            .route("/courses/{id}/files", web::post().to(register_course_file))
            .route("/files/{id}", web::delete().to(delete_course_file))
            .route("/invite-codes", web::get().to(get_invite_codes))
            .route("/invite-codes", web::post().to(create_invite_code)),
    );
}
