use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::ContentService;
use crate::utils::PaginationParams;

#[utoipa::path(
    get,
    path = "/api/v1/hpa/categories",
    tag = "content",
    responses((status = 200, description = "分类树，子分类内联在 children 中"))
)]
pub async fn get_categories(content_service: web::Data<ContentService>) -> Result<HttpResponse> {
    match content_service.get_category_tree().await {
        Ok(tree) => Ok(HttpResponse::Ok().json(ApiResponse::ok(tree))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/hpa/notes",
    tag = "content",
    params(
        ("category_id" = Option<i64>, Query, description = "按分类过滤"),
        ("page" = Option<u32>, Query, description = "页码，从 1 开始"),
        ("page_size" = Option<u32>, Query, description = "每页条数，最大 50")
    ),
    responses((status = 200, description = "公开笔记列表"))
)]
pub async fn get_notes(
    content_service: web::Data<ContentService>,
    query: web::Query<NoteQuery>,
) -> Result<HttpResponse> {
    let params = PaginationParams::new(query.page, query.page_size);
    match content_service.get_notes(query.category_id, &params).await {
        Ok(notes) => Ok(HttpResponse::Ok().json(ApiResponse::ok(notes))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 登录与否都可访问；登录用户会留下浏览记录
#[utoipa::path(
    get,
    path = "/api/v1/hpa/notes/{slug}",
    tag = "content",
    params(("slug" = String, Path, description = "笔记 slug")),
    responses(
        (status = 200, description = "笔记详情，浏览计数已递增", body = Note),
        (status = 404, description = "笔记不存在或未公开")
    )
)]
pub async fn get_note(
    content_service: web::Data<ContentService>,
    slug: web::Path<String>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    match content_service
        .get_note_by_slug(&slug, user.map(|u| u.id))
        .await
    {
        Ok(note) => Ok(HttpResponse::Ok().json(ApiResponse::ok(note))),
        Err(e) => Ok(e.error_response()),
    }
}

