use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub cover_image: String,
    pub price: f64,
    pub orig_price: f64,
    pub intro_path: String,
    pub sales_count: i64,
    pub is_public: bool,
    pub sort: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Intro,
    Resource,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Intro => write!(f, "intro"),
            FileType::Resource => write!(f, "resource"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseFile {
    pub id: i64,
    pub course_id: i64,
    pub file_type: FileType,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub sort: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Refunded,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Paid => write!(f, "paid"),
            OrderStatus::Refunded => write!(f, "refunded"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayMethod {
    Wechat,
    Alipay,
    InviteCode,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: i64,
    pub order_no: String,
    pub user_id: i64,
    pub course_id: i64,
    pub amount: f64,
    pub status: OrderStatus,
    pub pay_method: Option<PayMethod>,
    pub pay_time: Option<DateTime<Utc>>,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 订单列表项，关联课程标题
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrderListItem {
    pub id: i64,
    pub order_no: String,
    pub course_id: i64,
    pub course_title: String,
    pub amount: f64,
    pub status: OrderStatus,
    pub pay_method: Option<PayMethod>,
    pub pay_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InviteCode {
    pub id: i64,
    pub code: String,
    pub course_id: i64,
    pub max_uses: i64,
    pub used_count: i64,
    pub expire_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Download {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub file_id: i64,
    pub token: String,
    pub expire_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

// ========== 请求 / 响应 ==========

#[derive(Debug, Deserialize)]
pub struct CourseQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// newest | price_asc | price_desc | sales
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseDetailResponse {
    pub course: Course,
    pub purchased: bool,
    pub intro_content: String,
    pub intro_files: Vec<CourseFile>,
    pub resource_files: Vec<CourseFile>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub course_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemCodeRequest {
    #[schema(example = "INVA1B2C3D4")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDownloadRequest {
    pub course_id: i64,
    pub file_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDownloadResponse {
    pub token: String,
    pub expire_in: i64,
    pub download_url: String,
}

/// 无指定文件时下载端点返回的资源文件列表
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadListingResponse {
    pub course_id: i64,
    pub title: String,
    pub files: Vec<CourseFile>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: String,
    pub price: f64,
    #[serde(default)]
    pub orig_price: f64,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub sort: i64,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateInviteCodeRequest {
    pub course_id: i64,
    pub max_uses: Option<i64>,
    /// RFC3339 格式，可选
    pub expire_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterCourseFileRequest {
    pub file_type: FileType,
    pub file_name: String,
    pub file_path: String,
    #[serde(default)]
    pub file_size: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadUrlRequest {
    pub file_type: FileType,
    pub file_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub file_path: String,
    pub expire_in: i64,
}
