use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
}

impl UserService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> AppResult<User> {
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

    /// 空字段不更新
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> AppResult<User> {
        let mut user = self.get_user_by_id(user_id).await?;

        if let Some(nickname) = request.nickname
            && !nickname.is_empty()
        {
            user.nickname = nickname;
        }
        if let Some(avatar) = request.avatar
            && !avatar.is_empty()
        {
            user.avatar = avatar;
        }
        user.updated_at = Utc::now();

        sqlx::query("UPDATE users SET nickname = ?, avatar = ?, updated_at = ? WHERE id = ?")
            .bind(&user.nickname)
            .bind(&user.avatar)
            .bind(user.updated_at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(user)
    }
}
