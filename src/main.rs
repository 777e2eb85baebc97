use actix_web::{App, HttpResponse, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write; // env_logger 自定义格式

use hpa_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{SmsService, StorageService},
    handlers,
    middlewares::{AuthMiddleware, RateLimitMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.expires_in);
    let sms_service = SmsService::new(config.sms.clone());
    let storage_service = StorageService::new(config.storage.clone());

    let rate_limit = RateLimitMiddleware::new();

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone(), sms_service);
    let user_service = UserService::new(pool.clone());
    let content_service = ContentService::new(pool.clone());
    let course_service = CourseService::new(pool.clone());
    let file_service = FileService::new(pool.clone(), storage_service);

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(rate_limit.clone())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(content_service.clone()))
            .app_data(web::Data::new(course_service.clone()))
            .app_data(web::Data::new(file_service.clone()))
            .configure(swagger_config)
            .route("/health", web::get().to(health))
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::hpa_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
