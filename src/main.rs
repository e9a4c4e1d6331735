//! 电影 API 网关主入口

use movies_gateway::{
    auth::PasswordHasher,
    config::AppConfig,
    db,
    routes::{self, Storage},
    telemetry,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("movies-gateway {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 按优先级加载：.env.{MOVIES_ENV} 或 .env.local > .env
    // 生产环境应该直接设置环境变量，不依赖 .env 文件
    if let Ok(env) = std::env::var("MOVIES_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "movies-gateway starting...");

    // 3. 存储后端；表结构由部署环境维护
    let storage = match &config.database.url {
        Some(url) => {
            let pool = db::create_pool(&config.database, url).await?;
            tracing::info!("Using PostgreSQL storage");
            Storage::postgres(pool)
        }
        None => {
            tracing::warn!("MOVIES_DATABASE__URL not set, using in-memory storage (data is lost on exit)");
            Storage::in_memory()
        }
    }
    .bounded(Duration::from_secs(config.database.query_timeout_secs));

    // 4. 构建应用状态
    let hasher = Arc::new(PasswordHasher::from_config(&config.security)?);
    let app_state = routes::build_state(config.clone(), storage, hasher)?;

    // 5. 引导管理员账户
    if let (Some(username), Some(password)) = (
        &config.security.bootstrap_admin_username,
        &config.security.bootstrap_admin_password,
    ) {
        app_state
            .auth_service
            .ensure_admin(username, password.expose_secret())
            .await?;
    }

    // 6. 构建路由
    let app = routes::create_router(app_state);

    // 7. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        role_source = ?config.security.role_source,
        "Server listening"
    );

    // 8. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
///
/// 收到信号后停止接受新连接；超过超时时间仍未结束则强制退出。
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    // 超时后强制退出
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(1);
    });
}

/// 打印帮助信息
fn print_help() {
    println!("movies-gateway {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: movies-gateway [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过 MOVIES_ 前缀的环境变量完成，例如:");
    println!("  MOVIES_SECURITY__JWT_SECRET     令牌签名密钥（必填，至少 32 字符）");
    println!("  MOVIES_DATABASE__URL            PostgreSQL 连接串（未设置时使用内存存储）");
    println!("  MOVIES_SECURITY__ROLE_SOURCE    token | repository");
}
