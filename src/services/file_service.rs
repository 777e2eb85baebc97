use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::external::StorageService;
use crate::models::*;
use chrono::Utc;

const FILE_COLUMNS: &str =
    "id, course_id, file_type, file_name, file_path, file_size, sort, created_at";

const UPLOAD_URL_TTL_SECS: i64 = 900;

#[derive(Clone)]
pub struct FileService {
    pool: DbPool,
    storage: StorageService,
}

impl FileService {
    pub fn new(pool: DbPool, storage: StorageService) -> Self {
        Self { pool, storage }
    }

    pub async fn get_course_files(&self, course_id: i64) -> AppResult<Vec<CourseFile>> {
        let files = sqlx::query_as::<_, CourseFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM hpa_course_files WHERE course_id = ? ORDER BY sort ASC, id ASC"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(files)
    }

    pub async fn get_file_by_id(&self, id: i64) -> AppResult<CourseFile> {
        let file = sqlx::query_as::<_, CourseFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM hpa_course_files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        file.ok_or(AppError::NotFound)
    }

    /// 课程介绍正文。读取失败只记日志，详情页不因存储故障而 500
    pub async fn intro_content(&self, course: &Course) -> String {
        if course.intro_path.is_empty() {
            return String::new();
        }
        match self.storage.fetch_text(&course.intro_path).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to fetch intro {}: {e}", course.intro_path);
                String::new()
            }
        }
    }

    pub fn download_url(&self, file: &CourseFile, expires_secs: i64) -> String {
        self.storage.presign_get(&file.file_path, expires_secs)
    }

    // ========== 管理后台 ==========

    pub async fn create_upload_url(
        &self,
        course_id: i64,
        request: UploadUrlRequest,
    ) -> AppResult<UploadUrlResponse> {
        if request.file_name.trim().is_empty() {
            return Err(AppError::InvalidParam("文件名不能为空".to_string()));
        }

        let file_path =
            self.storage
                .object_key(course_id, &request.file_type.to_string(), &request.file_name);
        let upload_url = self.storage.presign_put(&file_path, UPLOAD_URL_TTL_SECS);
        Ok(UploadUrlResponse {
            upload_url,
            file_path,
            expire_in: UPLOAD_URL_TTL_SECS,
        })
    }

    /// 上传完成后登记文件元数据；intro 类型同时回写课程的 intro_path
    pub async fn register_file(
        &self,
        course_id: i64,
        request: RegisterCourseFileRequest,
    ) -> AppResult<CourseFile> {
        let max_sort: Option<i64> =
            sqlx::query_scalar("SELECT MAX(sort) FROM hpa_course_files WHERE course_id = ?")
                .bind(course_id)
                .fetch_one(&self.pool)
                .await?;

        let id = sqlx::query(
            r#"
            INSERT INTO hpa_course_files (course_id, file_type, file_name, file_path, file_size, sort, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(course_id)
        .bind(&request.file_type)
        .bind(&request.file_name)
        .bind(&request.file_path)
        .bind(request.file_size)
        .bind(max_sort.unwrap_or(0) + 1)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        if request.file_type == FileType::Intro {
            sqlx::query("UPDATE hpa_courses SET intro_path = ?, updated_at = ? WHERE id = ?")
                .bind(&request.file_path)
                .bind(Utc::now())
                .bind(course_id)
                .execute(&self.pool)
                .await?;
        }

        self.get_file_by_id(id).await
    }

    pub async fn delete_file(&self, id: i64) -> AppResult<()> {
        let affected = sqlx::query("DELETE FROM hpa_course_files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::database::connection::test_pool;

    fn test_storage() -> StorageService {
        StorageService::new(StorageConfig {
            endpoint: "localhost:9000".to_string(),
            access_key: "hpa".to_string(),
            secret_key: "hpa-secret".to_string(),
            bucket: "hpa".to_string(),
            region: "us-east-1".to_string(),
            use_ssl: false,
        })
    }

    async fn seed_course(pool: &DbPool, slug: &str) -> i64 {
        sqlx::query(
            r#"
            INSERT INTO hpa_courses (title, slug, description, cover_image, price, orig_price,
                                     intro_path, sales_count, is_public, sort, created_at, updated_at)
            VALUES ('课程', ?, '', '', 99, 99, '', 0, 1, 0, ?, ?)
            "#,
        )
        .bind(slug)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_register_file_assigns_next_sort() {
        let pool = test_pool().await;
        let service = FileService::new(pool.clone(), test_storage());
        let course_id = seed_course(&pool, "rust-course").await;

        let first = service
            .register_file(
                course_id,
                RegisterCourseFileRequest {
                    file_type: FileType::Resource,
                    file_name: "a.zip".to_string(),
                    file_path: "courses/1/resource/a_1.zip".to_string(),
                    file_size: 1024,
                },
            )
            .await
            .unwrap();
        let second = service
            .register_file(
                course_id,
                RegisterCourseFileRequest {
                    file_type: FileType::Resource,
                    file_name: "b.zip".to_string(),
                    file_path: "courses/1/resource/b_2.zip".to_string(),
                    file_size: 2048,
                },
            )
            .await
            .unwrap();

        assert_eq!(first.sort, 1);
        assert_eq!(second.sort, 2);

        let files = service.get_course_files(course_id).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name, "a.zip");
    }

    #[tokio::test]
    async fn test_register_intro_updates_course_path() {
        let pool = test_pool().await;
        let service = FileService::new(pool.clone(), test_storage());
        let course_id = seed_course(&pool, "rust-course").await;

        service
            .register_file(
                course_id,
                RegisterCourseFileRequest {
                    file_type: FileType::Intro,
                    file_name: "intro.md".to_string(),
                    file_path: "courses/1/intro/intro_1.md".to_string(),
                    file_size: 256,
                },
            )
            .await
            .unwrap();

        let intro_path: String =
            sqlx::query_scalar("SELECT intro_path FROM hpa_courses WHERE id = ?")
                .bind(course_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(intro_path, "courses/1/intro/intro_1.md");
    }

    #[tokio::test]
    async fn test_upload_url_rejects_empty_name() {
        let pool = test_pool().await;
        let service = FileService::new(pool, test_storage());
        let err = service
            .create_upload_url(
                1,
                UploadUrlRequest {
                    file_type: FileType::Resource,
                    file_name: "  ".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidParam(_)));

        let ok = service
            .create_upload_url(
                1,
                UploadUrlRequest {
                    file_type: FileType::Resource,
                    file_name: "lesson.zip".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(ok.file_path.starts_with("courses/1/resource/lesson_"));
        assert!(ok.upload_url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn test_delete_file() {
        let pool = test_pool().await;
        let service = FileService::new(pool.clone(), test_storage());
        let course_id = seed_course(&pool, "rust-course").await;
        let file = service
            .register_file(
                course_id,
                RegisterCourseFileRequest {
                    file_type: FileType::Resource,
                    file_name: "a.zip".to_string(),
                    file_path: "courses/1/resource/a_1.zip".to_string(),
                    file_size: 1,
                },
            )
            .await
            .unwrap();

        service.delete_file(file.id).await.unwrap();
        let err = service.get_file_by_id(file.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
        let err = service.delete_file(file.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
