use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub sort: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 树形结构的子分类，仅在列表接口填充
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Note {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub cover_image: String,
    pub view_count: i64,
    pub is_public: bool,
    pub sort: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 浏览记录，关联查询笔记标题
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BrowseHistoryItem {
    pub id: i64,
    pub note_id: i64,
    pub title: String,
    pub slug: String,
    pub cover_image: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub sort: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    pub category_id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub sort: i64,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct NoteQuery {
    pub category_id: Option<i64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
