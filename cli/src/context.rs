//! State context initialization and task management utilities.

use anyhow::{Context as _, Result};
use examscan_business::{BusinessConfig, SessionState, build_scanning_ctx};
use examscan_states::StateCtx;
use tracing::instrument;

/// Resolve backend configuration: environment first, then `--api-url`.
pub fn load_config(api_url: Option<String>) -> Result<BusinessConfig> {
    let mut config =
        BusinessConfig::from_env().context("Failed to read EXAMSCAN_* environment variables")?;
    if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
        config.api_base_url = url.trim_end_matches('/').to_owned();
    }
    Ok(config)
}

/// Initialize `StateCtx` with the scanning states, computes, and commands.
pub fn build_state_ctx(config: BusinessConfig, token: Option<String>) -> StateCtx {
    let mut session = SessionState::default();
    session.set_token(token);
    if !session.is_authenticated() {
        log::warn!("No token given; the backend may reject requests");
    }
    build_scanning_ctx(config, session)
}

/// Flush commands and await every spawned task, including follow-ups the
/// tasks enqueue. `on_sync` runs after each batch of updates is applied.
#[instrument(skip_all, name = "flush")]
pub async fn flush_and_await_with(ctx: &mut StateCtx, mut on_sync: impl FnMut(&StateCtx)) {
    loop {
        ctx.sync_computes();
        on_sync(ctx);
        ctx.flush_commands();

        if ctx.task_count() == 0 {
            break;
        }
        ctx.join_next_task().await;
    }
}

pub async fn flush_and_await(ctx: &mut StateCtx) {
    flush_and_await_with(ctx, |_| {}).await;
}
