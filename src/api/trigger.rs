use axum::{Json, extract::State};
use serde::Serialize;
use tracing::info;

use crate::{app::AppState, model::Publication};

#[derive(Debug, Serialize)]
pub(crate) struct TriggerResponse {
    status: &'static str,
    count: usize,
    gate_completed: bool,
    skipped: bool,
    publications: Vec<Publication>,
}

/// 手動トリガー。デーモンのタイマーを待たずにサイクルを即時実行し、
/// 結果をそのままレスポンスで返す。実行中のサイクルがある場合は
/// ゲートに触れずno-opとして返る。
pub(crate) async fn run_cycle_now(State(state): State<AppState>) -> Json<TriggerResponse> {
    state.telemetry().record_manual_trigger();

    let outcome = state.runner().run_cycle().await;
    let status = if outcome.skipped {
        "skipped"
    } else {
        "completed"
    };
    info!(
        status,
        count = outcome.count,
        gate_completed = outcome.gate_completed,
        "manual cycle finished"
    );

    Json(TriggerResponse {
        status,
        count: outcome.count,
        gate_completed: outcome.gate_completed,
        skipped: outcome.skipped,
        publications: outcome.publications,
    })
}
