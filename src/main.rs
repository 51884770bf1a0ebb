use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;

use axum::{Router, middleware};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tokio::net::TcpListener;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use anyhow::anyhow;

use voicebridge::{
    ServerConfig, middleware::connection_limit_middleware, routes, state::AppState,
};

/// VoiceBridge - Real-time voice interaction server
#[derive(Parser, Debug)]
#[command(name = "voicebridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        println!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let address = config.address();
    let tls_config = config.tls.clone();
    let is_tls_enabled = config.is_tls_enabled();
    let rate_limit_rps = config.rate_limit_requests_per_second;
    let rate_limit_burst = config.rate_limit_burst_size;
    let cors_origins = config.cors_allowed_origins.clone();
    println!("Starting server on {address}");

    // Create application state (fails fast on missing provider keys)
    let app_state = AppState::new(config)?;

    // Voice WebSocket routes with connection limit middleware
    let voice_routes = routes::create_voice_router().layer(middleware::from_fn_with_state(
        app_state.clone(),
        connection_limit_middleware,
    ));

    // Public health check route
    let public_routes = Router::new().route(
        "/",
        axum::routing::get(voicebridge::handlers::api::health_check),
    );

    // Configure rate limiting (disabled when rate >= 100000 for performance testing)
    let governor_layer = if rate_limit_rps < 100000 {
        let governor_config = GovernorConfigBuilder::default()
            .per_second(rate_limit_rps as u64)
            .burst_size(rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("Failed to build rate limiter config");
        Some(GovernorLayer::new(governor_config))
    } else {
        println!("Rate limiting disabled (rate >= 100000/s)");
        None
    };

    // Configure CORS
    let cors_layer = if let Some(ref origins) = cors_origins {
        if origins == "*" {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_credentials(false)
        } else {
            // Parse comma-separated origins
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_credentials(true)
        }
    } else {
        // No CORS configured - strict same-origin only for production security
        // Cross-origin requests will be blocked. To enable CORS, set CORS_ALLOWED_ORIGINS
        // environment variable or configure security.cors_allowed_origins in YAML.
        info!(
            "CORS not configured, defaulting to same-origin only. \
             Set CORS_ALLOWED_ORIGINS to enable cross-origin access."
        );
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(false)
        // No allow_origin = same-origin only (browsers block cross-origin requests)
    };

    // Security headers
    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ));

    // Combine all routes: public health + voice websocket
    let app = public_routes
        .merge(voice_routes)
        .with_state(app_state)
        .layer(cors_layer)
        .layer(tower::util::option_layer(governor_layer))
        .layer(security_headers);

    // Parse socket address
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    // Start server with or without TLS
    if is_tls_enabled {
        let tls = tls_config.expect("TLS config must be present when TLS is enabled");

        // Load TLS configuration from certificate and key files
        let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to load TLS certificates from {} and {}: {}",
                    tls.cert_path.display(),
                    tls.key_path.display(),
                    e
                )
            })?;

        println!("Server listening on https://{} (TLS enabled)", socket_addr);

        axum_server::bind_rustls(socket_addr, rustls_config)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|e| anyhow!("TLS server error: {}", e))?;
    } else {
        println!("Server listening on http://{}", socket_addr);

        let listener = TcpListener::bind(&socket_addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
    }

    Ok(())
}
