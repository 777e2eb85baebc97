use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};

const COURSE_COLUMNS: &str = "id, title, slug, description, cover_image, price, orig_price, \
                              intro_path, sales_count, is_public, sort, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, order_no, user_id, course_id, amount, status, pay_method, \
                             pay_time, invite_code, created_at, updated_at";
const INVITE_COLUMNS: &str =
    "id, code, course_id, max_uses, used_count, expire_at, is_active, created_at, updated_at";
const DOWNLOAD_COLUMNS: &str =
    "id, user_id, course_id, file_id, token, expire_at, used, created_at";

pub const DOWNLOAD_TTL_SECS: i64 = 86_400;
const DAILY_DOWNLOAD_QUOTA: i64 = 3;

#[derive(Clone)]
pub struct CourseService {
    pool: DbPool,
}

impl CourseService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // ========== 课程 ==========

    pub async fn get_courses(
        &self,
        params: &PaginationParams,
        sort: &str,
    ) -> AppResult<PaginatedResponse<Course>> {
        let order_by = match sort {
            "price_asc" => "price ASC",
            "price_desc" => "price DESC",
            "sales" => "sales_count DESC",
            _ => "created_at DESC", // newest
        };

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hpa_courses WHERE is_public = 1")
            .fetch_one(&self.pool)
            .await?;

        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM hpa_courses WHERE is_public = 1 \
             ORDER BY {order_by} LIMIT ? OFFSET ?"
        ))
        .bind(params.get_limit() as i64)
        .bind(params.get_offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedResponse::new(courses, params, total))
    }

    pub async fn get_course_by_slug(&self, slug: &str) -> AppResult<Course> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM hpa_courses WHERE slug = ? AND is_public = 1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        course.ok_or(AppError::CourseNotFound)
    }

    pub async fn get_course_by_id(&self, id: i64) -> AppResult<Course> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM hpa_courses WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        course.ok_or(AppError::CourseNotFound)
    }

    // ========== 订单 ==========

    pub async fn check_purchased(&self, user_id: i64, course_id: i64) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM hpa_orders WHERE user_id = ? AND course_id = ? AND status = 'paid'",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// 下单（pending）。结算为 paid 由外部支付流程完成
    pub async fn create_order(&self, user_id: i64, course_id: i64) -> AppResult<Order> {
        let course = self.get_course_by_id(course_id).await?;

        if self.check_purchased(user_id, course_id).await? {
            return Err(AppError::AlreadyPurchased);
        }

        let now = Utc::now();
        let order_no = generate_order_no();
        let id = sqlx::query(
            r#"
            INSERT INTO hpa_orders (order_no, user_id, course_id, amount, status,
                                    invite_code, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'pending', '', ?, ?)
            "#,
        )
        .bind(&order_no)
        .bind(user_id)
        .bind(course_id)
        .bind(course.price)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_order_by_id(id).await
    }

    pub async fn get_user_orders(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<OrderListItem>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hpa_orders WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let orders = sqlx::query_as::<_, OrderListItem>(
            r#"
            SELECT o.id, o.order_no, o.course_id, c.title AS course_title, o.amount,
                   o.status, o.pay_method, o.pay_time, o.created_at
            FROM hpa_orders o
            JOIN hpa_courses c ON c.id = o.course_id
            WHERE o.user_id = ?
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(params.get_limit() as i64)
        .bind(params.get_offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedResponse::new(orders, params, total))
    }

    async fn get_order_by_id(&self, id: i64) -> AppResult<Order> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM hpa_orders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        order.ok_or(AppError::NotFound)
    }

    // ========== 邀请码 ==========

    /// 兑换在单个事务内完成；次数递增是带守卫的条件更新，
    /// 并发兑换临界码时最多只有 max_uses 次成功。
    pub async fn redeem_invite_code(&self, user_id: i64, code: &str) -> AppResult<Order> {
        let mut tx = self.pool.begin().await?;

        let invite = sqlx::query_as::<_, InviteCode>(&format!(
            "SELECT {INVITE_COLUMNS} FROM hpa_invite_codes WHERE code = ?"
        ))
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::InvalidInvite)?;

        if !invite.is_active {
            return Err(AppError::InvalidInvite);
        }
        if invite.used_count >= invite.max_uses {
            return Err(AppError::InviteExhausted);
        }
        if let Some(expire_at) = invite.expire_at
            && expire_at < Utc::now()
        {
            return Err(AppError::InviteExpired);
        }

        let purchased: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM hpa_orders WHERE user_id = ? AND course_id = ? AND status = 'paid'",
        )
        .bind(user_id)
        .bind(invite.course_id)
        .fetch_one(&mut *tx)
        .await?;
        if purchased > 0 {
            return Err(AppError::AlreadyPurchased);
        }

        let now = Utc::now();
        let affected = sqlx::query(
            r#"
            UPDATE hpa_invite_codes
            SET used_count = used_count + 1, updated_at = ?
            WHERE id = ? AND used_count < max_uses
            "#,
        )
        .bind(now)
        .bind(invite.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(AppError::InviteExhausted);
        }

        let order_no = generate_order_no();
        let order_id = sqlx::query(
            r#"
            INSERT INTO hpa_orders (order_no, user_id, course_id, amount, status, pay_method,
                                    pay_time, invite_code, created_at, updated_at)
            VALUES (?, ?, ?, 0, 'paid', 'invite_code', ?, ?, ?, ?)
            "#,
        )
        .bind(&order_no)
        .bind(user_id)
        .bind(invite.course_id)
        .bind(now)
        .bind(code)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query("UPDATE hpa_courses SET sales_count = sales_count + 1 WHERE id = ?")
            .bind(invite.course_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        log::info!("Invite code {code} redeemed by user {user_id}, order {order_no}");
        self.get_order_by_id(order_id).await
    }

    pub async fn create_invite_code(
        &self,
        course_id: i64,
        max_uses: i64,
        expire_at: Option<DateTime<Utc>>,
    ) -> AppResult<InviteCode> {
        self.get_course_by_id(course_id).await?;

        let code = generate_invite_code();
        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO hpa_invite_codes (code, course_id, max_uses, used_count, expire_at,
                                          is_active, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, 1, ?, ?)
            "#,
        )
        .bind(&code)
        .bind(course_id)
        .bind(max_uses.max(1))
        .bind(expire_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let invite = sqlx::query_as::<_, InviteCode>(&format!(
            "SELECT {INVITE_COLUMNS} FROM hpa_invite_codes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        invite.ok_or(AppError::NotFound)
    }

    // ========== 下载令牌 ==========

    /// 签发下载令牌：已购或持有下载权限，且当日（本地零点起）配额未用完
    pub async fn create_download_token(
        &self,
        user_id: i64,
        course_id: i64,
        file_id: Option<i64>,
    ) -> AppResult<Download> {
        self.get_course_by_id(course_id).await?;

        if !self.check_purchased(user_id, course_id).await? {
            let can_download: Option<bool> =
                sqlx::query_scalar("SELECT can_download FROM users WHERE id = ?")
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if !can_download.unwrap_or(false) {
                return Err(AppError::NotPurchased);
            }
        }

        if let Some(file_id) = file_id {
            let belongs: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM hpa_course_files WHERE id = ? AND course_id = ?",
            )
            .bind(file_id)
            .bind(course_id)
            .fetch_one(&self.pool)
            .await?;
            if belongs == 0 {
                return Err(AppError::NotFound);
            }
        }

        let today: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM hpa_downloads WHERE user_id = ? AND created_at >= ?",
        )
        .bind(user_id)
        .bind(local_midnight_utc())
        .fetch_one(&self.pool)
        .await?;
        if today >= DAILY_DOWNLOAD_QUOTA {
            return Err(AppError::DownloadQuotaExceeded);
        }

        let token = generate_download_token();
        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO hpa_downloads (user_id, course_id, file_id, token, expire_at, used, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(file_id.unwrap_or(0))
        .bind(&token)
        .bind(now + Duration::seconds(DOWNLOAD_TTL_SECS))
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let download = sqlx::query_as::<_, Download>(&format!(
            "SELECT {DOWNLOAD_COLUMNS} FROM hpa_downloads WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        download.ok_or(AppError::NotFound)
    }

    /// 单次有效：带守卫的条件更新保证同一令牌只有首个调用方成功
    pub async fn validate_download_token(&self, token: &str) -> AppResult<Download> {
        let download = sqlx::query_as::<_, Download>(&format!(
            "SELECT {DOWNLOAD_COLUMNS} FROM hpa_downloads WHERE token = ?"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)?;

        if download.expire_at < Utc::now() {
            return Err(AppError::DownloadExpired);
        }

        let affected = sqlx::query("UPDATE hpa_downloads SET used = 1 WHERE token = ? AND used = 0")
            .bind(token)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(AppError::DownloadUsed);
        }

        Ok(download)
    }

    // ========== 管理后台 ==========

    pub async fn get_all_courses(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<Course>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hpa_courses")
            .fetch_one(&self.pool)
            .await?;

        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM hpa_courses ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(params.get_limit() as i64)
        .bind(params.get_offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedResponse::new(courses, params, total))
    }

    pub async fn get_all_invite_codes(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<InviteCode>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hpa_invite_codes")
            .fetch_one(&self.pool)
            .await?;

        let codes = sqlx::query_as::<_, InviteCode>(&format!(
            "SELECT {INVITE_COLUMNS} FROM hpa_invite_codes ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(params.get_limit() as i64)
        .bind(params.get_offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedResponse::new(codes, params, total))
    }

    pub async fn create_course(&self, request: CreateCourseRequest) -> AppResult<Course> {
        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO hpa_courses (title, slug, description, cover_image, price, orig_price,
                                     intro_path, sales_count, is_public, sort, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, '', 0, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.cover_image)
        .bind(request.price)
        .bind(request.orig_price)
        .bind(request.is_public)
        .bind(request.sort)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_course_by_id(id).await
    }

    pub async fn update_course(&self, id: i64, request: CreateCourseRequest) -> AppResult<Course> {
        let affected = sqlx::query(
            r#"
            UPDATE hpa_courses
            SET title = ?, slug = ?, description = ?, cover_image = ?, price = ?,
                orig_price = ?, is_public = ?, sort = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.cover_image)
        .bind(request.price)
        .bind(request.orig_price)
        .bind(request.is_public)
        .bind(request.sort)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::CourseNotFound);
        }
        self.get_course_by_id(id).await
    }

    pub async fn delete_course(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM hpa_courses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// 下载配额按本地日历日计算
fn local_midnight_utc() -> DateTime<Utc> {
    let now = Local::now();
    let midnight = now.date_naive().and_hms_opt(0, 0, 0).unwrap();
    match Local.from_local_datetime(&midnight).earliest() {
        Some(t) => t.with_timezone(&Utc),
        None => Utc::now() - Duration::hours(24),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;

    async fn seed_user(pool: &DbPool, phone: &str) -> i64 {
        sqlx::query(
            r#"
            INSERT INTO users (phone, username, nickname, avatar, role, status,
                               yearly_spend, can_download, created_at, updated_at)
            VALUES (?, ?, '', '', 'user', 'active', 0, 0, ?, ?)
            "#,
        )
        .bind(phone)
        .bind(format!("user_{phone}"))
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn seed_course(service: &CourseService, slug: &str, price: f64) -> Course {
        service
            .create_course(CreateCourseRequest {
                title: format!("课程 {slug}"),
                slug: slug.to_string(),
                description: String::new(),
                cover_image: String::new(),
                price,
                orig_price: price,
                is_public: true,
                sort: 0,
            })
            .await
            .unwrap()
    }

    async fn mark_paid(pool: &DbPool, order_id: i64) {
        sqlx::query("UPDATE hpa_orders SET status = 'paid', pay_time = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(order_id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_order_then_already_purchased() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        let user = seed_user(&pool, "13800001111").await;
        let course = seed_course(&service, "rust-course", 99.0).await;

        let order = service.create_order(user, course.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.amount, 99.0);
        assert!(order.order_no.starts_with("ORD"));

        // pending 订单不拦截再次下单
        service.create_order(user, course.id).await.unwrap();

        mark_paid(&pool, order.id).await;
        let err = service.create_order(user, course.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyPurchased));
    }

    #[tokio::test]
    async fn test_order_missing_course() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        let user = seed_user(&pool, "13800001111").await;
        let err = service.create_order(user, 999).await.unwrap_err();
        assert!(matches!(err, AppError::CourseNotFound));
    }

    #[tokio::test]
    async fn test_redeem_succeeds_exactly_max_uses_times() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        let course = seed_course(&service, "rust-course", 99.0).await;
        let invite = service
            .create_invite_code(course.id, 2, None)
            .await
            .unwrap();

        for i in 0..2 {
            let user = seed_user(&pool, &format!("1380000{:04}", i)).await;
            let order = service.redeem_invite_code(user, &invite.code).await.unwrap();
            assert_eq!(order.status, OrderStatus::Paid);
            assert_eq!(order.amount, 0.0);
            assert_eq!(order.pay_method, Some(PayMethod::InviteCode));
        }

        let loser = seed_user(&pool, "13800009999").await;
        let err = service
            .redeem_invite_code(loser, &invite.code)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InviteExhausted));

        let course = service.get_course_by_id(course.id).await.unwrap();
        assert_eq!(course.sales_count, 2);
    }

    #[tokio::test]
    async fn test_redeem_rejects_bad_codes() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        let user = seed_user(&pool, "13800001111").await;
        let course = seed_course(&service, "rust-course", 99.0).await;

        let err = service.redeem_invite_code(user, "INVNOPE").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInvite));

        let inactive = service
            .create_invite_code(course.id, 5, None)
            .await
            .unwrap();
        sqlx::query("UPDATE hpa_invite_codes SET is_active = 0 WHERE id = ?")
            .bind(inactive.id)
            .execute(&pool)
            .await
            .unwrap();
        let err = service
            .redeem_invite_code(user, &inactive.code)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInvite));

        let expired = service
            .create_invite_code(course.id, 5, Some(Utc::now() - Duration::hours(1)))
            .await
            .unwrap();
        let err = service
            .redeem_invite_code(user, &expired.code)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InviteExpired));
    }

    #[tokio::test]
    async fn test_redeem_rejects_already_purchased() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        let user = seed_user(&pool, "13800001111").await;
        let course = seed_course(&service, "rust-course", 99.0).await;
        let invite = service
            .create_invite_code(course.id, 10, None)
            .await
            .unwrap();

        service.redeem_invite_code(user, &invite.code).await.unwrap();
        let err = service
            .redeem_invite_code(user, &invite.code)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyPurchased));

        // 失败的兑换不消耗使用次数
        let used: i64 =
            sqlx::query_scalar("SELECT used_count FROM hpa_invite_codes WHERE id = ?")
                .bind(invite.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(used, 1);
    }

    #[tokio::test]
    async fn test_download_requires_entitlement() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        let user = seed_user(&pool, "13800001111").await;
        let course = seed_course(&service, "rust-course", 99.0).await;

        let err = service
            .create_download_token(user, course.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotPurchased));

        // can_download 权限即可，无需购买
        sqlx::query("UPDATE users SET can_download = 1 WHERE id = ?")
            .bind(user)
            .execute(&pool)
            .await
            .unwrap();
        let download = service
            .create_download_token(user, course.id, None)
            .await
            .unwrap();
        assert_eq!(download.token.len(), 32);
        assert!(!download.used);
    }

    #[tokio::test]
    async fn test_download_token_single_use() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        let user = seed_user(&pool, "13800001111").await;
        let course = seed_course(&service, "rust-course", 99.0).await;
        let order = service.create_order(user, course.id).await.unwrap();
        mark_paid(&pool, order.id).await;

        let download = service
            .create_download_token(user, course.id, None)
            .await
            .unwrap();

        let validated = service
            .validate_download_token(&download.token)
            .await
            .unwrap();
        assert_eq!(validated.course_id, course.id);

        let err = service
            .validate_download_token(&download.token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DownloadUsed));

        let err = service.validate_download_token("deadbeef").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn test_expired_download_token() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        let user = seed_user(&pool, "13800001111").await;
        let course = seed_course(&service, "rust-course", 99.0).await;

        sqlx::query(
            r#"
            INSERT INTO hpa_downloads (user_id, course_id, file_id, token, expire_at, used, created_at)
            VALUES (?, ?, 0, 'expiredtoken', ?, 0, ?)
            "#,
        )
        .bind(user)
        .bind(course.id)
        .bind(Utc::now() - Duration::hours(1))
        .bind(Utc::now() - Duration::hours(25))
        .execute(&pool)
        .await
        .unwrap();

        let err = service
            .validate_download_token("expiredtoken")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DownloadExpired));
    }

    #[tokio::test]
    async fn test_daily_download_quota() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        let user = seed_user(&pool, "13800001111").await;
        let course = seed_course(&service, "rust-course", 99.0).await;
        let order = service.create_order(user, course.id).await.unwrap();
        mark_paid(&pool, order.id).await;

        for _ in 0..3 {
            service
                .create_download_token(user, course.id, None)
                .await
                .unwrap();
        }
        let err = service
            .create_download_token(user, course.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DownloadQuotaExceeded));

        // 昨天签发的令牌不占今日配额
        sqlx::query("UPDATE hpa_downloads SET created_at = ? WHERE user_id = ?")
            .bind(Utc::now() - Duration::hours(24))
            .bind(user)
            .execute(&pool)
            .await
            .unwrap();
        service
            .create_download_token(user, course.id, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_download_file_must_belong_to_course() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        let user = seed_user(&pool, "13800001111").await;
        let course = seed_course(&service, "rust-course", 99.0).await;
        let other = seed_course(&service, "go-course", 59.0).await;
        let order = service.create_order(user, course.id).await.unwrap();
        mark_paid(&pool, order.id).await;

        let file_id = sqlx::query(
            r#"
            INSERT INTO hpa_course_files (course_id, file_type, file_name, file_path, file_size, sort, created_at)
            VALUES (?, 'resource', 'a.zip', 'courses/x/a.zip', 1, 1, ?)
            "#,
        )
        .bind(other.id)
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        let err = service
            .create_download_token(user, course.id, Some(file_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn test_course_sorting_and_visibility() {
        let pool = test_pool().await;
        let service = CourseService::new(pool.clone());
        seed_course(&service, "cheap", 10.0).await;
        seed_course(&service, "pricey", 100.0).await;
        let hidden = seed_course(&service, "hidden", 50.0).await;
        sqlx::query("UPDATE hpa_courses SET is_public = 0 WHERE id = ?")
            .bind(hidden.id)
            .execute(&pool)
            .await
            .unwrap();

        let params = PaginationParams::new(None, None);
        let by_price = service.get_courses(&params, "price_asc").await.unwrap();
        assert_eq!(by_price.total, 2);
        assert_eq!(by_price.list[0].slug, "cheap");

        // 管理端可见全部
        let all = service.get_all_courses(&params).await.unwrap();
        assert_eq!(all.total, 3);
    }
}
