use crate::errors::AppError;
use crate::models::{
    parse_date, BetInput, BulkImportResponse, EntryForm, EntryView, LedgerData, Prediction,
    PredictionRequest, RecoveryRateQuery, RecoveryRateResponse, RecoverySeriesQuery, SeriesQuery,
    SummaryStats, TimeSeriesPoint,
};
use crate::state::AppState;
use crate::stats::{
    average_recovery_rate, bucket_profit_by_period, compute_summary, cumulative_profit_by_period,
    recovery_by_race,
};
use crate::storage::persist_data;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
    Form, Json,
};
use tracing::{info, warn};

const DEFAULT_RECOVERY_LIMIT: usize = 10;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    let summary = compute_summary(data.records());
    Html(render_index(&summary, data.records()))
}

pub async fn list_entries(State(state): State<AppState>) -> Json<Vec<EntryView>> {
    let data = state.data.lock().await;
    Json(data.records().iter().cloned().map(EntryView::from).collect())
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(payload): Json<BetInput>,
) -> Result<(StatusCode, Json<EntryView>), AppError> {
    let input = validated(payload)?;
    let record = commit(&state, |data| Ok(data.append(input))).await?;

    info!(id = %record.id, date = %record.date, "entry added");
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<BetInput>,
) -> Result<Json<EntryView>, AppError> {
    let input = validated(payload)?;
    let record = commit(&state, |data| {
        data.update(&id, input)
            .ok_or_else(|| AppError::not_found(format!("no entry with id '{id}'")))
    })
    .await?;

    info!(id = %record.id, "entry updated");
    Ok(Json(record.into()))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    remove_entry(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_import(
    State(state): State<AppState>,
    Json(payload): Json<Vec<BetInput>>,
) -> Result<Json<BulkImportResponse>, AppError> {
    let inputs = payload
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            input.validate().map_err(|err| {
                AppError::bad_request(format!("entry {index}: {}", err.message))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .inspect_err(|err| warn!("rejected bulk import: {}", err.message))?;

    let imported = commit(&state, |data| Ok(data.append_many(inputs))).await?;

    info!(imported, "bulk import finished");
    Ok(Json(BulkImportResponse { imported }))
}

pub async fn form_create_entry(
    State(state): State<AppState>,
    Form(form): Form<EntryForm>,
) -> Result<Redirect, AppError> {
    let input = validated(form_input(form)?)?;
    let record = commit(&state, |data| Ok(data.append(input))).await?;

    info!(id = %record.id, date = %record.date, "entry added from form");
    Ok(Redirect::to("/"))
}

pub async fn form_delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    remove_entry(&state, &id).await?;
    Ok(Redirect::to("/"))
}

pub async fn get_stats(State(state): State<AppState>) -> Json<SummaryStats> {
    let data = state.data.lock().await;
    Json(compute_summary(data.records()))
}

pub async fn profit_series(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
) -> Json<Vec<TimeSeriesPoint>> {
    let data = state.data.lock().await;
    Json(bucket_profit_by_period(data.records(), query.granularity))
}

pub async fn cumulative_series(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
) -> Json<Vec<TimeSeriesPoint>> {
    let data = state.data.lock().await;
    Json(cumulative_profit_by_period(data.records(), query.granularity))
}

pub async fn recovery_series(
    State(state): State<AppState>,
    Query(query): Query<RecoverySeriesQuery>,
) -> Json<Vec<TimeSeriesPoint>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECOVERY_LIMIT);
    let data = state.data.lock().await;
    Json(recovery_by_race(data.records(), limit))
}

pub async fn recovery_rate(
    State(state): State<AppState>,
    Query(query): Query<RecoveryRateQuery>,
) -> Result<Json<RecoveryRateResponse>, AppError> {
    let from = query.from.as_deref().map(bound).transpose()?;
    let to = query.to.as_deref().map(bound).transpose()?;

    let data = state.data.lock().await;
    let subset: Vec<_> = data
        .records()
        .iter()
        .filter(|record| {
            if from.is_none() && to.is_none() {
                return true;
            }
            record.parsed_date().is_some_and(|date| {
                from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
            })
        })
        .collect();

    Ok(Json(RecoveryRateResponse {
        from: query.from,
        to: query.to,
        count: subset.len(),
        recovery_rate: average_recovery_rate(subset),
    }))
}

pub async fn predict(
    State(state): State<AppState>,
    Json(payload): Json<PredictionRequest>,
) -> Result<Json<Prediction>, AppError> {
    let Some(predictor) = state.predictor.as_ref() else {
        return Err(AppError::service_unavailable("race predictor is not configured"));
    };
    if payload.race_name.trim().is_empty() {
        return Err(AppError::bad_request("race_name is required"));
    }
    if parse_date(&payload.date).is_none() {
        return Err(AppError::bad_request("date must be YYYY-MM-DD"));
    }

    Ok(Json(predictor.predict(&payload).await?))
}

async fn remove_entry(state: &AppState, id: &str) -> Result<(), AppError> {
    commit(state, |data| {
        if data.remove(id) {
            Ok(())
        } else {
            Err(AppError::not_found(format!("no entry with id '{id}'")))
        }
    })
    .await?;

    info!(id, "entry removed");
    Ok(())
}

/// Applies `change` to a copy of the ledger and only swaps it in once the
/// copy is on disk. A failed write leaves the in-memory ledger untouched.
async fn commit<T>(
    state: &AppState,
    change: impl FnOnce(&mut LedgerData) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let outcome = change(&mut next)?;
    persist_data(&state.data_path, &next).await?;
    *data = next;
    Ok(outcome)
}

fn validated(input: BetInput) -> Result<BetInput, AppError> {
    input.validate().inspect_err(|err| warn!("rejected entry: {}", err.message))
}

fn form_input(form: EntryForm) -> Result<BetInput, AppError> {
    let stake = form
        .stake
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::bad_request("stake must be a number"))?;
    let payout = match form.payout.trim() {
        "" => None,
        value => Some(
            value
                .parse::<f64>()
                .map_err(|_| AppError::bad_request("payout must be a number"))?,
        ),
    };

    Ok(BetInput {
        date: form.date,
        race_name: Some(form.race_name),
        stake,
        payout,
    })
}

fn bound(value: &str) -> Result<chrono::NaiveDate, AppError> {
    parse_date(value).ok_or_else(|| AppError::bad_request(format!("invalid date bound '{value}'")))
}
