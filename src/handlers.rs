use crate::aggregator::{
    append_history_entry, on_install_or_startup, query, record_snapshot, reset_lifetime_counter,
    total_tabs,
};
use crate::badge::refresh_badge;
use crate::errors::AppError;
use crate::models::{
    BadgeResponse, ConfirmRequest, CurrentCounts, DailyParams, DailySeriesResponse, DataResponse,
    EventResponse, ImportResponse, Range, Request, ResetResponse, Response, Settings,
    SettingsPatch, StartupRequest, TabDataParams, TabDataResponse, TabEvent, WindowInfo,
};
use crate::settings::{apply_patch, load_settings};
use crate::source::TabSource;
use crate::state::{AppState, Background};
use crate::stats::daily_series;
use crate::transfer::{export_store, import_store, parse_import};
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::info;

pub async fn message(
    State(state): State<AppState>,
    Json(request): Json<Request>,
) -> Result<Json<Response>, AppError> {
    let response = match request {
        Request::GetData => Response::Data(collect_data(&state).await?),
        Request::GetTabData { range } => {
            Response::TabData(collect_tab_data(&state, range.as_deref()).await)
        }
        Request::ResetTotalTabs { confirm } => Response::Reset(apply_reset(&state, confirm).await?),
    };
    Ok(Json(response))
}

pub async fn get_data(State(state): State<AppState>) -> Result<Json<DataResponse>, AppError> {
    Ok(Json(collect_data(&state).await?))
}

pub async fn get_tab_data(
    State(state): State<AppState>,
    Query(params): Query<TabDataParams>,
) -> Json<TabDataResponse> {
    Json(collect_tab_data(&state, params.range.as_deref()).await)
}

pub async fn get_daily(
    State(state): State<AppState>,
    Query(params): Query<DailyParams>,
) -> Json<DailySeriesResponse> {
    let background = state.background.lock().await;
    let settings = load_settings(&background.store);
    let days = daily_series(
        &background.store,
        params.days.unwrap_or(settings.num_of_days),
        &state.config.date_key_format,
        settings.use_gb_date_format,
    );
    Json(DailySeriesResponse { days })
}

pub async fn post_event(
    State(state): State<AppState>,
    Json(event): Json<TabEvent>,
) -> Result<Json<EventResponse>, AppError> {
    let mut guard = state.background.lock().await;
    let Background {
        store,
        browser,
        badge,
    } = &mut *guard;

    browser.apply(&event);
    append_history_entry(store, browser, &state.config)?;
    let counts = record_snapshot(store, browser, &state.config)?;
    let text = refresh_badge(store, browser, badge);
    let response = event_response(counts, total_tabs(store), text);

    state.persist(&guard).await?;
    Ok(Json(response))
}

pub async fn startup(
    State(state): State<AppState>,
    Json(payload): Json<StartupRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let mut guard = state.background.lock().await;
    let Background {
        store,
        browser,
        badge,
    } = &mut *guard;

    if let Some(windows) = payload.windows {
        browser.replace(windows);
    }
    let counts = on_install_or_startup(store, browser, badge, &state.config)?;
    let response = event_response(counts, total_tabs(store), badge.text().to_string());

    state.persist(&guard).await?;
    Ok(Json(response))
}

// Resync only; the next event compares against the last recorded count.
pub async fn put_windows(
    State(state): State<AppState>,
    Json(windows): Json<Vec<WindowInfo>>,
) -> Json<CurrentCounts> {
    let mut guard = state.background.lock().await;
    let Background {
        store,
        browser,
        badge,
    } = &mut *guard;

    browser.replace(windows);
    refresh_badge(store, browser, badge);
    Json(browser.counts())
}

pub async fn reset(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<ResetResponse>, AppError> {
    Ok(Json(apply_reset(&state, payload.confirm).await?))
}

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    let background = state.background.lock().await;
    Json(load_settings(&background.store))
}

pub async fn post_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<Settings>, AppError> {
    let mut guard = state.background.lock().await;
    let Background {
        store,
        browser,
        badge,
    } = &mut *guard;

    let settings = apply_patch(store, &patch);
    refresh_badge(store, browser, badge);

    state.persist(&guard).await?;
    Ok(Json(settings))
}

pub async fn get_badge(State(state): State<AppState>) -> Json<BadgeResponse> {
    let background = state.background.lock().await;
    Json(BadgeResponse {
        text: background.badge.text().to_string(),
    })
}

pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let background = state.background.lock().await;
    let body = export_store(&background.store)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

pub async fn import(
    State(state): State<AppState>,
    Query(params): Query<ConfirmRequest>,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    if !params.confirm {
        return Err(AppError::bad_request("import replaces all data; pass confirm=true"));
    }
    let entries = parse_import(&body)?;

    let mut guard = state.background.lock().await;
    let Background {
        store,
        browser,
        badge,
    } = &mut *guard;

    let keys = import_store(store, entries);
    refresh_badge(store, browser, badge);
    info!(keys, "store replaced by import");

    state.persist(&guard).await?;
    Ok(Json(ImportResponse { keys }))
}

async fn collect_data(state: &AppState) -> Result<DataResponse, AppError> {
    let mut guard = state.background.lock().await;
    let Background { store, browser, .. } = &mut *guard;

    let counts = record_snapshot(store, browser, &state.config)?;
    let result = store.snapshot();

    state.persist(&guard).await?;
    Ok(DataResponse {
        tab_count: counts.tab_count,
        window_count: counts.window_count,
        result,
    })
}

async fn collect_tab_data(state: &AppState, range: Option<&str>) -> TabDataResponse {
    let range = range.map(Range::parse).unwrap_or_default();
    let background = state.background.lock().await;
    TabDataResponse {
        data: query(&background.store, range),
    }
}

async fn apply_reset(state: &AppState, confirm: bool) -> Result<ResetResponse, AppError> {
    if !confirm {
        return Err(AppError::bad_request("reset requires confirm=true"));
    }

    let mut background = state.background.lock().await;
    reset_lifetime_counter(&mut background.store);
    state.persist(&background).await?;

    Ok(ResetResponse {
        total_tabs: total_tabs(&background.store),
    })
}

fn event_response(counts: CurrentCounts, total_tabs: u64, badge: String) -> EventResponse {
    EventResponse {
        tab_count: counts.tab_count,
        window_count: counts.window_count,
        total_tabs,
        badge,
    }
}
