use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{PaginatedResponse, PaginationParams};
use chrono::Utc;

const CATEGORY_COLUMNS: &str = "id, name, slug, parent_id, sort, created_at, updated_at";
const NOTE_COLUMNS: &str = "id, category_id, title, slug, summary, content, cover_image, \
                            view_count, is_public, sort, created_at, updated_at";

#[derive(Clone)]
pub struct ContentService {
    pool: DbPool,
}

impl ContentService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // ========== 分类 ==========

    /// 一次取全量后在内存组装一层树（根分类 + 子分类）
    pub async fn get_category_tree(&self) -> AppResult<Vec<Category>> {
        let all = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM hpa_categories ORDER BY sort ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let (mut roots, children): (Vec<Category>, Vec<Category>) =
            all.into_iter().partition(|c| c.parent_id.is_none());

        for child in children {
            if let Some(parent) = roots.iter_mut().find(|r| Some(r.id) == child.parent_id) {
                parent.children.push(child);
            }
        }

        Ok(roots)
    }

    pub async fn create_category(&self, request: CreateCategoryRequest) -> AppResult<Category> {
        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO hpa_categories (name, slug, parent_id, sort, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.name)
        .bind(&request.slug)
        .bind(request.parent_id)
        .bind(request.sort)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_category_by_id(id).await
    }

    pub async fn update_category(
        &self,
        id: i64,
        request: CreateCategoryRequest,
    ) -> AppResult<Category> {
        let affected = sqlx::query(
            r#"
            UPDATE hpa_categories
            SET name = ?, slug = ?, parent_id = ?, sort = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&request.name)
        .bind(&request.slug)
        .bind(request.parent_id)
        .bind(request.sort)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::NotFound);
        }
        self.get_category_by_id(id).await
    }

    pub async fn delete_category(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM hpa_categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_category_by_id(&self, id: i64) -> AppResult<Category> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM hpa_categories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        category.ok_or(AppError::NotFound)
    }

    // ========== 笔记 ==========

    pub async fn get_notes(
        &self,
        category_id: Option<i64>,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<Note>> {
        let (total, notes) = match category_id {
            Some(cid) => {
                let total: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM hpa_notes WHERE is_public = 1 AND category_id = ?",
                )
                .bind(cid)
                .fetch_one(&self.pool)
                .await?;

                let notes = sqlx::query_as::<_, Note>(&format!(
                    "SELECT {NOTE_COLUMNS} FROM hpa_notes \
                     WHERE is_public = 1 AND category_id = ? \
                     ORDER BY sort DESC, created_at DESC LIMIT ? OFFSET ?"
                ))
                .bind(cid)
                .bind(params.get_limit() as i64)
                .bind(params.get_offset() as i64)
                .fetch_all(&self.pool)
                .await?;

                (total, notes)
            }
            None => {
                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM hpa_notes WHERE is_public = 1")
                        .fetch_one(&self.pool)
                        .await?;

                let notes = sqlx::query_as::<_, Note>(&format!(
                    "SELECT {NOTE_COLUMNS} FROM hpa_notes WHERE is_public = 1 \
                     ORDER BY sort DESC, created_at DESC LIMIT ? OFFSET ?"
                ))
                .bind(params.get_limit() as i64)
                .bind(params.get_offset() as i64)
                .fetch_all(&self.pool)
                .await?;

                (total, notes)
            }
        };

        Ok(PaginatedResponse::new(notes, params, total))
    }

    /// 详情页：浏览计数单调递增；已登录用户追加浏览记录
    pub async fn get_note_by_slug(
        &self,
        slug: &str,
        user_id: Option<i64>,
    ) -> AppResult<Note> {
        let mut note = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM hpa_notes WHERE slug = ? AND is_public = 1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)?;

        sqlx::query("UPDATE hpa_notes SET view_count = view_count + 1 WHERE id = ?")
            .bind(note.id)
            .execute(&self.pool)
            .await?;
        note.view_count += 1;

        if let Some(user_id) = user_id {
            sqlx::query(
                "INSERT INTO hpa_browse_history (user_id, note_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(note.id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        }

        Ok(note)
    }

    pub async fn get_note_by_id(&self, id: i64) -> AppResult<Note> {
        let note = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM hpa_notes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        note.ok_or(AppError::NotFound)
    }

    pub async fn create_note(&self, request: CreateNoteRequest) -> AppResult<Note> {
        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO hpa_notes (category_id, title, slug, summary, content, cover_image,
                                   view_count, is_public, sort, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(request.category_id)
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.summary)
        .bind(&request.content)
        .bind(&request.cover_image)
        .bind(request.is_public)
        .bind(request.sort)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_note_by_id(id).await
    }

    pub async fn update_note(&self, id: i64, request: CreateNoteRequest) -> AppResult<Note> {
        let affected = sqlx::query(
            r#"
            UPDATE hpa_notes
            SET category_id = ?, title = ?, slug = ?, summary = ?, content = ?,
                cover_image = ?, is_public = ?, sort = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.category_id)
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.summary)
        .bind(&request.content)
        .bind(&request.cover_image)
        .bind(request.is_public)
        .bind(request.sort)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::NotFound);
        }
        self.get_note_by_id(id).await
    }

    pub async fn delete_note(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM hpa_notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========== 浏览记录 ==========

    pub async fn get_browse_history(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<BrowseHistoryItem>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM hpa_browse_history WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let items = sqlx::query_as::<_, BrowseHistoryItem>(
            r#"
            SELECT h.id, h.note_id, n.title, n.slug, n.cover_image, h.created_at
            FROM hpa_browse_history h
            JOIN hpa_notes n ON n.id = h.note_id
            WHERE h.user_id = ?
            ORDER BY h.created_at DESC, h.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(params.get_limit() as i64)
        .bind(params.get_offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedResponse::new(items, params, total))
    }
}
