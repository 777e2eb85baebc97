use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::error::AppError;
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::course_service::DOWNLOAD_TTL_SECS;
use crate::services::{CourseService, FileService};
use crate::utils::PaginationParams;

#[utoipa::path(
    get,
    path = "/api/v1/hpa/courses",
    tag = "course",
    params(
        ("sort" = Option<String>, Query, description = "newest | price_asc | price_desc | sales"),
        ("page" = Option<u32>, Query, description = "页码，从 1 开始"),
        ("page_size" = Option<u32>, Query, description = "每页条数，最大 50")
    ),
    responses((status = 200, description = "公开课程列表"))
)]
pub async fn get_courses(
    course_service: web::Data<CourseService>,
    query: web::Query<CourseQuery>,
) -> Result<HttpResponse> {
    let params = PaginationParams::new(query.page, query.page_size);
    let sort = query.sort.as_deref().unwrap_or("newest");
    match course_service.get_courses(&params, sort).await {
        Ok(courses) => Ok(HttpResponse::Ok().json(ApiResponse::ok(courses))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 详情页对所有人开放；purchased 标记只对已登录用户有意义
#[utoipa::path(
    get,
    path = "/api/v1/hpa/courses/{slug}",
    tag = "course",
    params(("slug" = String, Path, description = "课程 slug")),
    responses(
        (status = 200, description = "课程详情，含介绍正文与文件清单", body = CourseDetailResponse),
        (status = 404, description = "课程不存在或未公开")
    )
)]
pub async fn get_course(
    course_service: web::Data<CourseService>,
    file_service: web::Data<FileService>,
    slug: web::Path<String>,
    user: Option<AuthUser>,
) -> Result<HttpResponse> {
    let course = match course_service.get_course_by_slug(&slug).await {
        Ok(course) => course,
        Err(e) => return Ok(e.error_response()),
    };

    let purchased = match &user {
        Some(u) => match course_service.check_purchased(u.id, course.id).await {
            Ok(purchased) => purchased,
            Err(e) => return Ok(e.error_response()),
        },
        None => false,
    };

    let intro_content = file_service.intro_content(&course).await;
    let files = match file_service.get_course_files(course.id).await {
        Ok(files) => files,
        Err(e) => return Ok(e.error_response()),
    };
    let (intro_files, resource_files): (Vec<_>, Vec<_>) = files
        .into_iter()
        .partition(|f| f.file_type == FileType::Intro);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CourseDetailResponse {
        course,
        purchased,
        intro_content,
        intro_files,
        resource_files,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/hpa/orders",
    tag = "course",
    security(("bearer_auth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "订单已创建（pending）", body = Order),
        (status = 403, description = "已购买过该课程"),
        (status = 404, description = "课程不存在")
    )
)]
pub async fn create_order(
    course_service: web::Data<CourseService>,
    user: AuthUser,
    request: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse> {
    match course_service.create_order(user.id, request.course_id).await {
        Ok(order) => Ok(HttpResponse::Ok().json(ApiResponse::ok(order))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/hpa/redeem",
    tag = "course",
    security(("bearer_auth" = [])),
    request_body = RedeemCodeRequest,
    responses(
        (status = 200, description = "兑换成功，返回已支付订单", body = Order),
        (status = 400, description = "邀请码无效、已用尽或已过期"),
        (status = 403, description = "已购买过该课程")
    )
)]
pub async fn redeem_invite_code(
    course_service: web::Data<CourseService>,
    user: AuthUser,
    request: web::Json<RedeemCodeRequest>,
) -> Result<HttpResponse> {
    match course_service.redeem_invite_code(user.id, &request.code).await {
        Ok(order) => Ok(HttpResponse::Ok().json(ApiResponse::ok(order))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/hpa/download",
    tag = "course",
    security(("bearer_auth" = [])),
    request_body = CreateDownloadRequest,
    responses(
        (status = 200, description = "下载令牌，24 小时内单次有效", body = CreateDownloadResponse),
        (status = 403, description = "未购买且无下载权限，或当日配额已用完")
    )
)]
pub async fn create_download(
    course_service: web::Data<CourseService>,
    user: AuthUser,
    request: web::Json<CreateDownloadRequest>,
) -> Result<HttpResponse> {
    match course_service
        .create_download_token(user.id, request.course_id, request.file_id)
        .await
    {
        Ok(download) => Ok(HttpResponse::Ok().json(ApiResponse::ok(CreateDownloadResponse {
            download_url: format!("/api/v1/hpa/download/{}", download.token),
            token: download.token,
            expire_in: DOWNLOAD_TTL_SECS,
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 令牌本身就是凭证，不要求登录。绑定了文件的令牌 307 跳转到
/// 预签名地址，未绑定的返回课程资源清单。
#[utoipa::path(
    get,
    path = "/api/v1/hpa/download/{token}",
    tag = "course",
    params(("token" = String, Path, description = "下载令牌")),
    responses(
        (status = 307, description = "跳转到预签名下载地址"),
        (status = 200, description = "资源文件清单", body = DownloadListingResponse),
        (status = 400, description = "令牌已过期或已使用"),
        (status = 404, description = "令牌不存在")
    )
)]
pub async fn consume_download(
    course_service: web::Data<CourseService>,
    file_service: web::Data<FileService>,
    token: web::Path<String>,
) -> Result<HttpResponse> {
    let download = match course_service.validate_download_token(&token).await {
        Ok(download) => download,
        Err(e) => return Ok(e.error_response()),
    };

    if download.file_id != 0 {
        let file = match file_service.get_file_by_id(download.file_id).await {
            Ok(file) => file,
            Err(_) => return Ok(AppError::NotFound.error_response()),
        };
        let url = file_service.download_url(&file, 3600);
        return Ok(HttpResponse::TemporaryRedirect()
            .insert_header(("Location", url))
            .finish());
    }

    let course = match course_service.get_course_by_id(download.course_id).await {
        Ok(course) => course,
        Err(e) => return Ok(e.error_response()),
    };
    let files = match file_service.get_course_files(download.course_id).await {
        Ok(files) => files,
        Err(e) => return Ok(e.error_response()),
    };
    let files = files
        .into_iter()
        .filter(|f| f.file_type == FileType::Resource)
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(DownloadListingResponse {
        course_id: course.id,
        title: course.title,
        files,
    })))
}
