use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::external::SmsService;
use crate::models::*;
use crate::utils::*;
use chrono::{Duration, Utc};

const CODE_PURPOSE_LOGIN: &str = "login";
const CODE_TTL_SECS: i64 = 300;
const SEND_WINDOW_SECS: i64 = 60;

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    jwt_service: JwtService,
    sms_service: SmsService,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt_service: JwtService, sms_service: SmsService) -> Self {
        Self {
            pool,
            jwt_service,
            sms_service,
        }
    }

    /// 发送登录验证码。60 秒内同一手机号只允许一次（按窗口内落库条数判断）
    pub async fn send_code(&self, phone: &str) -> AppResult<SendCodeResponse> {
        validate_cn_phone(phone)?;

        let window_start = Utc::now() - Duration::seconds(SEND_WINDOW_SECS);
        let recent: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM verification_codes WHERE phone = ? AND created_at > ?",
        )
        .bind(phone)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await?;

        if recent > 0 {
            return Err(AppError::RateLimited);
        }

        let code = generate_six_digit_code();
        let now = Utc::now();
        let expire_at = now + Duration::seconds(CODE_TTL_SECS);

        sqlx::query(
            r#"
            INSERT INTO verification_codes (phone, code, purpose, expire_at, used, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(phone)
        .bind(&code)
        .bind(CODE_PURPOSE_LOGIN)
        .bind(expire_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.sms_service.send_verification_code(phone, &code).await?;

        Ok(SendCodeResponse {
            expires_in: CODE_TTL_SECS,
        })
    }

    /// 验证码登录。首次登录即注册：查不到用户时自动建档
    pub async fn login(&self, phone: &str, code: &str) -> AppResult<LoginResponse> {
        validate_cn_phone(phone)?;
        if code.len() != 6 {
            return Err(AppError::InvalidParam("验证码格式不正确".to_string()));
        }

        // 精确匹配未使用且未过期的验证码，而不是取最近一条
        let vc = sqlx::query_as::<_, VerificationCode>(
            r#"
            SELECT id, phone, code, purpose, expire_at, used, created_at
            FROM verification_codes
            WHERE phone = ? AND code = ? AND purpose = ? AND used = 0 AND expire_at > ?
            "#,
        )
        .bind(phone)
        .bind(code)
        .bind(CODE_PURPOSE_LOGIN)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::InvalidCode)?;

        sqlx::query("UPDATE verification_codes SET used = 1 WHERE id = ?")
            .bind(vc.id)
            .execute(&self.pool)
            .await?;

        let user = match self.find_by_phone(phone).await? {
            Some(user) => user,
            None => self.provision_user(phone).await?,
        };

        if user.status == UserStatus::Banned {
            return Err(AppError::Forbidden);
        }

        let token = self.jwt_service.generate_token(&user)?;
        Ok(LoginResponse { token, user })
    }

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, phone, username, nickname, avatar, role, status,
                   vip_expire_at, yearly_spend, can_download, created_at, updated_at
            FROM users
            WHERE phone = ?
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn provision_user(&self, phone: &str) -> AppResult<User> {
        let username = generate_username();
        let nickname = format!("用户{}", &phone[phone.len().saturating_sub(4)..]);
        let now = Utc::now();

        let user_id = sqlx::query(
            r#"
            INSERT INTO users (phone, username, nickname, avatar, role, status,
                               yearly_spend, can_download, created_at, updated_at)
            VALUES (?, ?, ?, '', 'user', 'active', 0, 0, ?, ?)
            "#,
        )
        .bind(phone)
        .bind(&username)
        .bind(&nickname)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        log::info!("Auto-provisioned user {user_id} for phone {phone}");

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, phone, username, nickname, avatar, role, status,
                   vip_expire_at, yearly_spend, can_download, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or(AppError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmsConfig;
    use crate::database::connection::test_pool;

    async fn service() -> AuthService {
        let pool = test_pool().await;
        AuthService::new(
            pool,
            JwtService::new("test-secret", 604_800),
            SmsService::new(SmsConfig::default()),
        )
    }

    async fn latest_code(service: &AuthService, phone: &str) -> String {
        sqlx::query_scalar::<_, String>(
            "SELECT code FROM verification_codes WHERE phone = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(phone)
        .fetch_one(&service.pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_code_then_login_registers_user() {
        let service = service().await;
        service.send_code("13800001111").await.unwrap();
        let code = latest_code(&service, "13800001111").await;

        let resp = service.login("13800001111", &code).await.unwrap();
        assert_eq!(resp.user.phone, "13800001111");
        assert_eq!(resp.user.role, Role::User);
        assert_eq!(resp.user.nickname, "用户1111");
        assert!(resp.user.username.starts_with("user_"));

        let claims = JwtService::new("test-secret", 604_800)
            .verify_token(&resp.token)
            .unwrap();
        assert_eq!(claims.user_id(), resp.user.id);
        assert_eq!(claims.role, Role::User);
    }

    #[tokio::test]
    async fn test_second_login_reuses_user() {
        let service = service().await;
        service.send_code("13800002222").await.unwrap();
        let code = latest_code(&service, "13800002222").await;
        let first = service.login("13800002222", &code).await.unwrap();

        // 绕过 60 秒限制直接插入第二个验证码
        sqlx::query(
            r#"
            INSERT INTO verification_codes (phone, code, purpose, expire_at, used, created_at)
            VALUES ('13800002222', '654321', 'login', ?, 0, ?)
            "#,
        )
        .bind(Utc::now() + Duration::minutes(5))
        .bind(Utc::now())
        .execute(&service.pool)
        .await
        .unwrap();

        let second = service.login("13800002222", "654321").await.unwrap();
        assert_eq!(first.user.id, second.user.id);

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&service.pool)
            .await
            .unwrap();
        assert_eq!(users, 1);
    }

    #[tokio::test]
    async fn test_used_code_rejected() {
        let service = service().await;
        service.send_code("13800003333").await.unwrap();
        let code = latest_code(&service, "13800003333").await;

        service.login("13800003333", &code).await.unwrap();
        let err = service.login("13800003333", &code).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCode));
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let service = service().await;
        sqlx::query(
            r#"
            INSERT INTO verification_codes (phone, code, purpose, expire_at, used, created_at)
            VALUES ('13800004444', '111111', 'login', ?, 0, ?)
            "#,
        )
        .bind(Utc::now() - Duration::minutes(1))
        .bind(Utc::now() - Duration::minutes(6))
        .execute(&service.pool)
        .await
        .unwrap();

        let err = service.login("13800004444", "111111").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCode));
    }

    #[tokio::test]
    async fn test_send_code_rate_limited() {
        let service = service().await;
        service.send_code("13800005555").await.unwrap();
        let err = service.send_code("13800005555").await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited));
    }

    #[tokio::test]
    async fn test_banned_user_cannot_login() {
        let service = service().await;
        service.send_code("13800006666").await.unwrap();
        let code = latest_code(&service, "13800006666").await;
        service.login("13800006666", &code).await.unwrap();

        sqlx::query("UPDATE users SET status = 'banned' WHERE phone = '13800006666'")
            .execute(&service.pool)
            .await
            .unwrap();
        sqlx::query(
            r#"
            INSERT INTO verification_codes (phone, code, purpose, expire_at, used, created_at)
            VALUES ('13800006666', '222222', 'login', ?, 0, ?)
            "#,
        )
        .bind(Utc::now() + Duration::minutes(5))
        .bind(Utc::now())
        .execute(&service.pool)
        .await
        .unwrap();

        let err = service.login("13800006666", "222222").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_invalid_phone_rejected() {
        let service = service().await;
        assert!(service.send_code("12345").await.is_err());
        assert!(service.login("12345", "123456").await.is_err());
    }
}
