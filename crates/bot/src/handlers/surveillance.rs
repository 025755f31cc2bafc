//! `/pause` and `/unpause`.

use super::Response;
use crate::error::AppError;
use crate::state::AppState;

pub(super) async fn set_paused(state: &AppState, paused: bool) -> Result<Response, AppError> {
    state.recorder().set_paused(paused).await?;
    Ok(Response::text(if paused {
        "Surveillance paused. A recording in progress will finish normally."
    } else {
        "Surveillance resumed."
    }))
}
