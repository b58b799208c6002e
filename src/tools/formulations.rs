//! Saved formulation tools
//!
//! Save, list, open and delete formulations through a [`FormulationStore`].
//! The session lock is never held across a store call.

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::formulation::{FormulationView, Workbench};
use crate::api::{FormulationPayload, FormulationStore, FormulationSummary};

/// Outcome of a persistence call
#[derive(Debug, Serialize)]
pub struct PersistOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PersistOutcome {
    fn ok(id: Option<String>, message: String) -> Self {
        Self { success: true, id, message: Some(message), error: None }
    }

    fn failed(error: String) -> Self {
        Self { success: false, id: None, message: None, error: Some(error) }
    }
}

#[derive(Debug, Serialize)]
pub struct FormulationListResponse {
    pub formulations: Vec<FormulationSummary>,
    pub count: usize,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct OpenResponse {
    pub message: String,
    pub formulation: FormulationView,
}

/// Save the current formulation under `name`. Validation failures are
/// reported without contacting the store. If the session is reset or
/// replaced while the save is in flight, the new session is left alone.
pub async fn save_formulation<S: FormulationStore + ?Sized>(
    bench: &Mutex<Workbench>,
    store: &S,
    name: &str,
    created_by: &str,
) -> Result<PersistOutcome, String> {
    let (payload, epoch) = {
        let bench = bench.lock().await;
        let name = match bench.validate_for_save(name) {
            Ok(name) => name,
            Err(e) => return Ok(PersistOutcome::failed(e.to_string())),
        };
        (
            FormulationPayload::from_formulation(bench.formulation(), &name, created_by),
            bench.epoch(),
        )
    };

    match store.save(&payload).await {
        Ok(resp) if resp.success => {
            if !bench.lock().await.mark_saved(epoch, resp.id.clone(), &payload.name) {
                warn!("Session changed while saving {}; not linking it to {:?}", payload.name, resp.id);
            }
            info!("Saved formulation {} ({:?})", payload.name, resp.id);
            Ok(PersistOutcome::ok(
                resp.id,
                format!("Formulation \"{}\" saved successfully!", payload.name),
            ))
        }
        Ok(resp) => Ok(PersistOutcome::failed(
            resp.message.unwrap_or_else(|| "Failed to save formulation".to_string()),
        )),
        Err(e) => {
            warn!("Saving formulation {} failed: {}", payload.name, e);
            Ok(PersistOutcome::failed(e.to_string()))
        }
    }
}

pub async fn list_formulations<S: FormulationStore + ?Sized>(
    store: &S,
    skip: usize,
    limit: usize,
) -> Result<FormulationListResponse, String> {
    let list = store
        .list(skip, limit)
        .await
        .map_err(|e| format!("Failed to load saved formulations: {}", e))?;

    Ok(FormulationListResponse {
        count: list.formulations.len(),
        total: list.total,
        formulations: list.formulations,
    })
}

/// Load a saved formulation, replacing the current session
pub async fn open_formulation<S: FormulationStore + ?Sized>(
    bench: &Mutex<Workbench>,
    store: &S,
    id: &str,
    default_serve_size: f64,
) -> Result<OpenResponse, String> {
    let stored = store
        .load(id)
        .await
        .map_err(|e| format!("Failed to load formulation: {}", e))?;
    let formulation = stored.into_formulation(default_serve_size);
    let message = format!("Loaded formulation: {}", formulation.name);

    let mut bench = bench.lock().await;
    bench.load(formulation);
    info!("{}", message);
    Ok(OpenResponse {
        message,
        formulation: FormulationView::of(&bench),
    })
}

/// Delete a saved formulation. The session keeps its contents but forgets
/// the deleted store id.
pub async fn delete_formulation<S: FormulationStore + ?Sized>(
    bench: &Mutex<Workbench>,
    store: &S,
    id: &str,
) -> Result<PersistOutcome, String> {
    if let Err(e) = store.delete(id).await {
        return Ok(PersistOutcome::failed(format!("Failed to delete formulation: {}", e)));
    }

    let mut bench = bench.lock().await;
    if bench.formulation().id.as_deref() == Some(id) {
        bench.forget_store_id();
    }
    Ok(PersistOutcome::ok(
        Some(id.to_string()),
        "Formulation deleted successfully".to_string(),
    ))
}
