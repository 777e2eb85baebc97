use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("参数错误: {0}")]
    InvalidParam(String),

    #[error("未登录或登录已过期")]
    Unauthorized,

    #[error("验证码错误或已过期")]
    InvalidCode,

    #[error("请求过于频繁，请稍后再试")]
    RateLimited,

    #[error("邀请码无效或已失效")]
    InvalidInvite,

    #[error("邀请码已用完")]
    InviteExhausted,

    #[error("邀请码已过期")]
    InviteExpired,

    #[error("下载链接已过期")]
    DownloadExpired,

    #[error("下载链接已使用")]
    DownloadUsed,

    #[error("今日下载次数已用完，请联系客服")]
    DownloadQuotaExceeded,

    #[error("无权限")]
    Forbidden,

    #[error("需要管理员权限")]
    AdminRequired,

    #[error("未购买该课程")]
    NotPurchased,

    #[error("您已购买该课程")]
    AlreadyPurchased,

    #[error("资源不存在")]
    NotFound,

    #[error("用户不存在")]
    UserNotFound,

    #[error("课程不存在")]
    CourseNotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// 业务错误码，4xxyy：前三位对应 HTTP 状态段，后两位为具体错误
    pub fn business_code(&self) -> i32 {
        match self {
            AppError::InvalidParam(_) => 40001,
            AppError::DownloadExpired => 40003,
            AppError::DownloadQuotaExceeded => 40004,
            AppError::DownloadUsed => 40004,
            AppError::Unauthorized | AppError::JwtError(_) => 40005,
            AppError::InvalidCode => 40007,
            AppError::InvalidInvite | AppError::InviteExhausted | AppError::InviteExpired => 40009,
            AppError::RateLimited => 40010,
            AppError::Forbidden => 40301,
            AppError::AdminRequired => 40302,
            AppError::NotPurchased => 40303,
            AppError::AlreadyPurchased => 40304,
            AppError::NotFound => 40401,
            AppError::UserNotFound => 40402,
            AppError::CourseNotFound => 40403,
            _ => 50000,
        }
    }

    fn status(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::Unauthorized | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Forbidden
            | AppError::AdminRequired
            | AppError::NotPurchased
            | AppError::AlreadyPurchased => StatusCode::FORBIDDEN,
            AppError::NotFound | AppError::UserNotFound | AppError::CourseNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::MigrateError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// 对外响应消息，基础设施错误不向客户端透出细节
    fn public_message(&self) -> String {
        match self {
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "服务器内部错误".to_string()
            }
            AppError::MigrateError(err) => {
                log::error!("Migration error: {err}");
                "服务器内部错误".to_string()
            }
            AppError::InternalError(msg) => {
                log::error!("Internal error: {msg}");
                "服务器内部错误".to_string()
            }
            AppError::ReqwestError(err) => {
                log::error!("Upstream request error: {err}");
                "外部服务暂不可用".to_string()
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                "外部服务暂不可用".to_string()
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                "未登录或登录已过期".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status()).json(json!({
            "code": self.business_code(),
            "message": self.public_message(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_business_code_ranges() {
        assert_eq!(AppError::InvalidParam("x".into()).business_code(), 40001);
        assert_eq!(AppError::InvalidCode.business_code(), 40007);
        assert_eq!(AppError::InviteExhausted.business_code(), 40009);
        assert_eq!(AppError::AdminRequired.business_code(), 40302);
        assert_eq!(AppError::CourseNotFound.business_code(), 40403);
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(AppError::InvalidCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AdminRequired.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::AlreadyPurchased.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::InternalError("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_do_not_leak() {
        let err = AppError::InternalError("secret detail".into());
        assert!(!err.public_message().contains("secret"));
    }
}
