use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use dje_watcher::{
    app::{ComponentRegistry, build_router},
    config::Config,
    keepalive::spawn_keepalive_pinger,
    scheduler::daemon::spawn_watch_daemon,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(|s| s.as_str())
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                thread = thread_name,
                file = location.file(),
                line = location.line(),
                column = location.column(),
                message,
                "panic occurred"
            );
        } else {
            error!(
                thread = thread_name,
                message, "panic occurred without location information"
            );
        }
    }));

    // Tracing initialization is handled by Telemetry::new()
    let config = Config::from_env().context("failed to load configuration")?;
    let bind_addr = config.http_bind();
    let registry =
        ComponentRegistry::build(config.clone()).context("failed to build component registry")?;

    let _watch_daemon = spawn_watch_daemon(registry.runner(), &config);

    if let Some(url) = config.keepalive_url() {
        let _pinger = spawn_keepalive_pinger(url.to_string(), config.keepalive_interval());
    } else {
        info!("keepalive pinger disabled, KEEPALIVE_URL not set");
    }

    let router = build_router(registry);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {bind_addr}"))?;

    info!(%bind_addr, "listening");

    if let Err(error) = axum::serve(listener, router).await {
        warn!(error = %error, "server exited with error");
    }

    Ok(())
}
