use axum::{extract::State, http::StatusCode};

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::onboarding::{self, OnboardingResult, StartSubscription};

/// POST /api/onboarding/start
pub async fn start_onboarding(
    State(state): State<AppState>,
    Json(request): Json<StartSubscription>,
) -> Result<(StatusCode, Json<OnboardingResult>)> {
    let result = onboarding::start(&state, &request).await?;

    tracing::info!(
        "Onboarding started: tenant={}, license={}, status={}",
        result.tenant_id,
        result.license_id,
        result.status.as_ref()
    );

    Ok((StatusCode::CREATED, Json(result)))
}
