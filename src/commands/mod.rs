pub mod plan;

use crate::db::{AppState, StoredModificationRequest};

/// Modification requests recorded against a plan, oldest first
pub async fn get_modification_requests(
  state: &AppState,
  plan_id: String,
) -> Result<Vec<StoredModificationRequest>, String> {
  crate::db::list_modification_requests(&state.db, &plan_id)
    .await
    .map_err(|e| format!("Failed to fetch modification requests: {}", e))
}
