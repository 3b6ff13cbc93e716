//! 认证服务主入口

use card_auth::{
    auth::PasswordHasher, config::AppConfig, handlers::health, middleware::AppState, routes,
    telemetry,
};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    let mut hash_mode = false;
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("card-auth {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            // 明文只从标准输入读取
            "--hash-password" if args.len() == 2 => hash_mode = true,
            "--hash-password" => {
                eprintln!("--hash-password 不接受参数，请通过标准输入提供明文");
                std::process::exit(1);
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 按优先级加载：.env.local > .env.development > .env
    if let Ok(env) = std::env::var("CARD_AUTH_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 生成 PHC 哈希后退出（用于填写预置用户）
    if hash_mode {
        let plaintext = read_plaintext(BufReader::new(tokio::io::stdin())).await?;
        let hasher = PasswordHasher::from_config(&config.security)?;
        println!("{}", hasher.hash(&plaintext)?);
        return Ok(());
    }

    health::set_start_time();

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "card-auth starting...");

    // 3. 组装组件（签名密钥在此加载，之后不再变化）
    let graceful_timeout = config.server.graceful_shutdown_timeout_secs;
    let addr = config.server.addr.clone();
    let app_state = Arc::new(AppState::from_config(&config)?);

    // 4. 构建路由
    let app = routes::create_router(app_state);

    // 5. 启动服务器
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 6. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(graceful_timeout))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
        tokio::time::sleep(tokio::time::Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(1);
    });
}

/// 读取一行明文（去掉行尾换行符）
async fn read_plaintext<R: AsyncBufRead + Unpin>(mut reader: R) -> anyhow::Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let plaintext = line.trim_end_matches(['\r', '\n']);
    if plaintext.is_empty() {
        anyhow::bail!("No password read from stdin");
    }
    Ok(plaintext.to_string())
}

/// 打印帮助信息
fn print_help() {
    println!("card-auth {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: card-auth [选项]");
    println!();
    println!("选项:");
    println!("  --version                  打印版本信息并退出");
    println!("  --help                     打印此帮助信息并退出");
    println!("  --hash-password            从标准输入读取明文，输出 Argon2id PHC 哈希并退出");
    println!();
    println!("配置:");
    println!("  可选配置文件 card-auth.toml（或 CARD_AUTH_CONFIG 指定的路径）");
    println!("  环境变量前缀 CARD_AUTH_，层级分隔符 __，例如 CARD_AUTH_SECURITY__JWT_SECRET");
}
