use actix_web::web;

pub mod admin;
pub mod auth;
pub mod content;
pub mod course;
pub mod user;

pub use admin::admin_config;
pub use auth::auth_config;
pub use user::user_config;

/// 内容与课程共用 /hpa 前缀，注册在同一个 scope 下
pub fn hpa_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/hpa")
            .route("/categories", web::get().to(content::get_categories))
            .route("/notes", web::get().to(content::get_notes))
            .route("/notes/{slug}", web::get().to(content::get_note))
            .route("/courses", web::get().to(course::get_courses))
            .route("/courses/{slug}", web::get().to(course::get_course))
            .route("/history", web::get().to(user::get_browse_history))
            .route("/orders", web::get().to(user::get_orders))
            .route("/orders", web::post().to(course::create_order))
            .route("/redeem", web::post().to(course::redeem_invite_code))
            .route("/download", web::post().to(course::create_download))
            .route("/download/{token}", web::get().to(course::consume_download)),
    );
}
