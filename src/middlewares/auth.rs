use crate::error::AppError;
use crate::models::Role;
use crate::utils::JwtService;
use actix_web::dev::Payload;
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// 已认证用户，由中间件写入请求扩展。
/// 处理函数通过提取器声明认证要求：
///   - `AuthUser`          必须登录，否则 401
///   - `Option<AuthUser>`  可选登录，缺失或无效 token 不报错
///   - `AdminUser`         必须为管理员，否则 403
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub phone: String,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthUser>().cloned();
        ready(user.ok_or_else(|| AppError::Unauthorized.into()))
    }
}

#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.extensions().get::<AuthUser>().cloned() {
            None => Err(AppError::Unauthorized.into()),
            Some(user) if user.is_admin() => Ok(AdminUser(user)),
            Some(_) => Err(AppError::AdminRequired.into()),
        };
        ready(result)
    }
}

/// 全局认证中间件：有合法 Bearer token 时解析并写入上下文，本身从不拒绝请求。
/// 强制认证由各处理函数的提取器完成。
pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        if let Some(token) = token
            && let Ok(claims) = self.jwt_service.verify_token(token)
        {
            req.extensions_mut().insert(AuthUser {
                id: claims.user_id(),
                phone: claims.phone.clone(),
                username: claims.username.clone(),
                role: claims.role.clone(),
            });
        }

        Box::pin(self.service.call(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn auth_user(role: Role) -> AuthUser {
        AuthUser {
            id: 1,
            phone: "13800001111".to_string(),
            username: "u".to_string(),
            role,
        }
    }

    #[actix_web::test]
    async fn test_auth_user_extractor_requires_context() {
        let req = TestRequest::default().to_http_request();
        let result = AuthUser::from_request(&req, &mut Payload::None).await;
        assert!(result.is_err());

        req.extensions_mut().insert(auth_user(Role::User));
        let user = AuthUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(user.id, 1);
    }

    #[actix_web::test]
    async fn test_optional_auth_user_never_fails() {
        let req = TestRequest::default().to_http_request();
        let user = Option::<AuthUser>::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert!(user.is_none());
    }

    #[actix_web::test]
    async fn test_admin_gate() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(auth_user(Role::Vip));
        assert!(
            AdminUser::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );

        req.extensions_mut().insert(auth_user(Role::Admin));
        assert!(
            AdminUser::from_request(&req, &mut Payload::None)
                .await
                .is_ok()
        );
    }
}
