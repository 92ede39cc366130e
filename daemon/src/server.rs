//! HTTP control surface.
//!
//! Deliberately thin: validate, record, fire one datagram, answer. The
//! whole interface is a GET with query parameters so a vision mixer's
//! tally output or a curl one-liner can drive it, for example
//! `/?state=rouge&band=1&id=2`. Response bodies are in French for the
//! operators on the other end.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use log::{error, info, warn};
use serde::Deserialize;
use tallybridge::{Screen, TallyState};

use crate::state::StateStore;
use crate::transport::TallyTransport;

/// Handles the handlers share, cloned per request.
#[derive(Clone)]
pub struct BridgeState {
    pub store: Arc<StateStore>,
    pub transport: Arc<TallyTransport>,
}

/// Query parameters of a tally request. Missing parameters take the
/// deployment's historical defaults: off, screen 1, bandeau 1.
#[derive(Debug, Default, Deserialize)]
pub struct TallyQuery {
    pub state: Option<String>,
    pub id: Option<u8>,
    pub band: Option<u8>,
}

/// The whole surface is GET-only, the fallback included: any other method
/// is answered with 405 before a handler can touch the table.
pub fn router(bridge: BridgeState) -> Router {
    Router::new()
        .route("/", get(set_tally))
        .route("/status", get(status))
        .fallback_service(get(fallback).with_state(bridge.clone()))
        .with_state(bridge)
}

/// `GET /` with `state`, `id` and `band` query parameters.
pub async fn set_tally(
    State(bridge): State<BridgeState>,
    Query(query): Query<TallyQuery>,
) -> (StatusCode, String) {
    apply_tally(&bridge, &query).await
}

/// `GET /status`: the commanded-state table as JSON, bandeau by bandeau.
pub async fn status(
    State(bridge): State<BridgeState>,
) -> Json<BTreeMap<u8, BTreeMap<u8, TallyState>>> {
    let mut bands: BTreeMap<u8, BTreeMap<u8, TallyState>> = BTreeMap::new();
    for ((band, screen), state) in bridge.store.snapshot().await {
        bands.entry(band).or_default().insert(u8::from(screen), state);
    }
    Json(bands)
}

/// Every unrouted path. Browsers asking for favicons get an empty 204;
/// anything else is treated as a tally request with the path ignored, as
/// switcher integrations are loose about the path they call.
pub async fn fallback(
    State(bridge): State<BridgeState>,
    uri: Uri,
    Query(query): Query<TallyQuery>,
) -> Response {
    if uri.path().starts_with("/favicon") {
        return StatusCode::NO_CONTENT.into_response();
    }
    apply_tally(&bridge, &query).await.into_response()
}

async fn apply_tally(bridge: &BridgeState, query: &TallyQuery) -> (StatusCode, String) {
    let raw_state = query.state.as_deref().unwrap_or("off");
    let state = match raw_state.parse::<TallyState>() {
        Ok(state) => state,
        Err(e) => {
            warn!("rejected request: {e}");
            return (
                StatusCode::BAD_REQUEST,
                format!("État invalide. Valeurs: {}\n", state_names()),
            );
        }
    };

    let id = query.id.unwrap_or(1);
    let screen = match Screen::from_id(id) {
        Ok(screen) => screen,
        Err(e) => {
            warn!("rejected request: {e}");
            return (
                StatusCode::BAD_REQUEST,
                "ID écran invalide. Valeurs: 1 ou 2\n".to_string(),
            );
        }
    };

    let band = query.band.unwrap_or(1);
    if !bridge.transport.contains(band) {
        warn!("rejected request: bandeau {band} is not configured");
        return (
            StatusCode::BAD_REQUEST,
            format!("Bandeau invalide. Valeurs: {}\n", band_names(&bridge.transport)),
        );
    }

    let previous = bridge.store.set(band, screen, state).await;
    info!("bandeau {band} screen {screen}: {previous} -> {state}");

    // Immediate send so the panel reacts ahead of the next refresh pass.
    match bridge.transport.send(band, screen, state).await {
        Ok(()) => (
            StatusCode::OK,
            format!("OK - bandeau {band} écran {screen} : {state}\n"),
        ),
        Err(e) => {
            error!("send to bandeau {band} screen {screen} failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Erreur envoi UDP\n".to_string(),
            )
        }
    }
}

fn state_names() -> String {
    TallyState::ALL.map(TallyState::name).join(", ")
}

fn band_names(transport: &TallyTransport) -> String {
    transport
        .bands()
        .map(|band| band.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
