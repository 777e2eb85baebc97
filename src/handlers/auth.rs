use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::models::*;
use crate::services::AuthService;

#[utoipa::path(
    post,
    path = "/api/v1/auth/send-code",
    tag = "auth",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "验证码已发送"),
        (status = 400, description = "手机号格式不正确"),
        (status = 429, description = "发送过于频繁")
    )
)]
pub async fn send_code(
    auth_service: web::Data<AuthService>,
    request: web::Json<SendCodeRequest>,
) -> Result<HttpResponse> {
    match auth_service.send_code(&request.phone).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::ok(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功，首次登录自动注册", body = LoginResponse),
        (status = 400, description = "验证码错误或已过期"),
        (status = 403, description = "账号已被封禁")
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.login(&request.phone, &request.code).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::ok(response))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/send-code", web::post().to(send_code))
            .route("/login", web::post().to(login)),
    );
}
