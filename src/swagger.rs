use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::send_code,
        handlers::auth::login,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::get_browse_history,
        handlers::user::get_orders,
        handlers::content::get_categories,
        handlers::content::get_notes,
        handlers::content::get_note,
        handlers::course::get_courses,
        handlers::course::get_course,
        handlers::course::create_order,
        handlers::course::redeem_invite_code,
        handlers::course::create_download,
        handlers::course::consume_download,
        handlers::admin::create_category,
        handlers::admin::update_category,
        handlers::admin::delete_category,
        handlers::admin::create_note,
        handlers::admin::update_note,
        handlers::admin::delete_note,
        handlers::admin::get_all_courses,
        handlers::admin::create_course,
        handlers::admin::update_course,
        handlers::admin::delete_course,
        handlers::admin::get_course_files,
        handlers::admin::create_upload_url,
        handlers::admin::register_course_file,
        handlers::admin::delete_course_file,
        handlers::admin::get_invite_codes,
        handlers::admin::create_invite_code,
    ),
    components(
        schemas(
            User,
            Role,
            UserStatus,
            SendCodeRequest,
            SendCodeResponse,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            Category,
            Note,
            BrowseHistoryItem,
            CreateCategoryRequest,
            CreateNoteRequest,
            Course,
            CourseFile,
            FileType,
            Order,
            OrderListItem,
            OrderStatus,
            PayMethod,
            InviteCode,
            CourseDetailResponse,
            CreateOrderRequest,
            RedeemCodeRequest,
            CreateDownloadRequest,
            CreateDownloadResponse,
            DownloadListingResponse,
            CreateCourseRequest,
            CreateInviteCodeRequest,
            RegisterCourseFileRequest,
            UploadUrlRequest,
            UploadUrlResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "手机验证码登录"),
        (name = "user", description = "用户资料、浏览记录与订单"),
        (name = "content", description = "分类与笔记"),
        (name = "course", description = "课程、订单、邀请码与下载"),
        (name = "admin", description = "管理后台"),
    ),
    info(
        title = "HPA Backend API",
        version = "1.0.0",
        description = "HPA 会员课程平台 REST API 文档"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
