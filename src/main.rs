use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use stagepass_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{EmailService, StripeService},
    handlers,
    middlewares::{AuthMiddleware, RateLimitMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

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

    // 创建JWT服务
    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // 创建外部服务
    let stripe_service = StripeService::new(config.stripe.clone());
    let email_service = EmailService::new(config.email.clone());
    if !email_service.is_configured() {
        log::warn!("Email service is not configured, waitlist notifications will be skipped");
    }

    // 创建服务
    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    let user_service = UserService::new(pool.clone());
    let event_service = EventService::new(pool.clone());
    let product_service = ProductService::new(pool.clone());
    let order_service = OrderService::new(pool.clone(), stripe_service.clone());
    let ticket_service = TicketService::new(pool.clone());
    let membership_service = MembershipService::new(pool.clone(), stripe_service.clone());
    let waitlist_service = WaitlistService::new(
        pool.clone(),
        stripe_service.clone(),
        email_service.clone(),
    );

    // 启动后台定时任务（超时订单、候补资格过期、会员到期）
    tasks::spawn_all(
        order_service.clone(),
        waitlist_service.clone(),
        membership_service.clone(),
    );

    // 限流状态在所有 worker 间共享
    let rate_limit = RateLimitMiddleware::new();

    // 启动HTTP服务器
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
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(email_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(event_service.clone()))
            .app_data(web::Data::new(product_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(ticket_service.clone()))
            .app_data(web::Data::new(membership_service.clone()))
            .app_data(web::Data::new(waitlist_service.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::event_config)
                    .configure(handlers::order_config)
                    .configure(handlers::ticket_config)
                    .configure(handlers::membership_config)
                    .configure(handlers::waitlist_config),
            )
            .service(web::scope("/api").configure(handlers::admin_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
