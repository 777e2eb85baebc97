pub mod auth_service;
pub mod content_service;
pub mod course_service;
pub mod file_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use content_service::ContentService;
pub use course_service::CourseService;
pub use file_service::FileService;
pub use user_service::UserService;
