use clap::Parser;
use quizshim::config::Settings;
use quizshim::hardening::RetryPolicy;
use quizshim::main_helper::{read_event, Command};
use quizshim::pipeline::handle_event;
use quizshim::server::build_router;
use quizshim::upstream::AnthropicBackend;
use quizshim::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let _log_guard = quizshim::logging::init_tracing(&args);
    quizshim::logging::setup_panic_hook();

    let settings = match Settings::from_process_env().with_args(&args) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if settings.anthropic_api_key.is_none() {
        tracing::warn!("ANTHROPIC_API_KEY is not set; every invocation will return a configuration error");
    }
    if settings.require_auth && !settings.basic_auth.is_complete() {
        tracing::warn!("Basic auth is enabled but BASIC_AUTH_USERNAME/BASIC_AUTH_PASSWORD are not set");
    }

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(args.request_timeout_secs))
        .connect_timeout(Duration::from_secs(args.connect_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let backend = Arc::new(AnthropicBackend::new(client, args.anthropic_base_url.clone()));
    let state = AppState::new(settings, backend, RetryPolicy::new(args.max_attempts, 200));

    match args.command.clone() {
        Command::Invoke { event } => {
            let event = match read_event(&event) {
                Ok(v) => v,
                Err(e) => {
                    tracing::error!("Failed to read event {}: {}", event.display(), e.inner);
                    std::process::exit(1);
                }
            };

            let envelope = handle_event(&state, event).await;
            match serde_json::to_string_pretty(&envelope) {
                Ok(out) => println!("{}", out),
                Err(e) => {
                    tracing::error!("Failed to render envelope: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Serve {
            port,
            host,
            max_body_size,
        } => {
            let app = build_router(state, max_body_size);

            let addr = format!("{}:{}", host, port);
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Failed to bind to {}: {}", addr, e);
                    std::process::exit(1);
                }
            };

            tracing::info!("quizshim listening on {}", addr);
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
