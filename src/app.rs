use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;

use crate::{
    api,
    clients::{search::SearchClient, webhook::WebhookClient},
    config::Config,
    observability::Telemetry,
    pipeline::CycleRunner,
    pipeline::gate::DailyGate,
    util::retry::RetryPolicy,
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    runner: Arc<CycleRunner>,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn runner(&self) -> Arc<CycleRunner> {
        Arc::clone(&self.registry.runner)
    }
}

impl ComponentRegistry {
    /// 構成情報と依存をまとめて初期化し、アプリケーションの共有レジストリを構築する。
    ///
    /// # Errors
    /// Telemetry の初期化や HTTP クライアント構築が失敗した場合はエラーを返す。
    pub fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let telemetry = Telemetry::new()?;
        let search = SearchClient::new(
            config.search_base_url(),
            config.tribunal_alias(),
            config.search_api_key().to_string(),
            config.search_timeout(),
            config.search_page_size(),
            config.search_max_pages(),
        )
        .context("failed to build search client")?;
        let webhook = WebhookClient::new(
            config.webhook_url(),
            config.relay_timeout(),
            RetryPolicy::new(config.relay_max_attempts(), config.relay_backoff_step_ms()),
            config.relay_pacing(),
        )
        .context("failed to build webhook client")?;
        let runner = Arc::new(CycleRunner::new(
            Arc::clone(&config),
            search,
            webhook,
            DailyGate::default(),
            telemetry.metrics_arc(),
        ));

        Ok(Self {
            config,
            telemetry,
            runner,
        })
    }

    #[must_use]
    pub fn runner(&self) -> Arc<CycleRunner> {
        Arc::clone(&self.runner)
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}
