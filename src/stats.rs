use crate::models::{BetRecord, Granularity, SummaryStats, TimeSeriesPoint};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Whole-set totals for the dashboard cards. Records with malformed dates
/// still count here; they are only dropped from the time series.
pub fn compute_summary(records: &[BetRecord]) -> SummaryStats {
    let mut total_stake = 0.0;
    let mut total_payout = 0.0;
    let mut hits = 0usize;
    let mut max_single_payout = 0.0f64;

    for record in records {
        let payout = record.payout_amount();
        total_stake += record.stake;
        total_payout += payout;
        if record.is_hit() {
            hits += 1;
        }
        if payout > max_single_payout {
            max_single_payout = payout;
        }
    }

    let hit_rate = if records.is_empty() {
        0.0
    } else {
        hits as f64 / records.len() as f64 * 100.0
    };

    SummaryStats {
        total_stake,
        total_payout,
        net_profit: total_payout - total_stake,
        overall_recovery_rate: rate(total_payout, total_stake),
        hit_rate,
        max_single_payout,
    }
}

/// Stake-weighted recovery rate of a subset, not the mean of per-bet rates.
pub fn average_recovery_rate<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a BetRecord>,
{
    let (stake, payout) = records
        .into_iter()
        .fold((0.0, 0.0), |(stake, payout), record| {
            (stake + record.stake, payout + record.payout_amount())
        });
    rate(payout, stake)
}

/// Sum of profit per period. Sparse: periods without records are absent.
pub fn bucket_profit_by_period(records: &[BetRecord], granularity: Granularity) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    for (date, record) in dated_records(records) {
        *buckets.entry(period_key(date, granularity)).or_insert(0.0) += record.profit();
    }
    into_points(buckets)
}

/// Running profit total, gap-filled across every calendar day between the
/// first and last record. Weekly and monthly points are the snapshot at the
/// last covered day of each period.
pub fn cumulative_profit_by_period(
    records: &[BetRecord],
    granularity: Granularity,
) -> Vec<TimeSeriesPoint> {
    let dated = dated_records(records);
    let (Some(&(first, _)), Some(&(last, _))) = (dated.first(), dated.last()) else {
        return Vec::new();
    };

    let mut end_of_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut running = 0.0;
    for (date, record) in &dated {
        running += record.profit();
        end_of_day.insert(*date, running);
    }

    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    let mut last_known = 0.0;
    for day in first.iter_days().take_while(|day| *day <= last) {
        if let Some(total) = end_of_day.get(&day) {
            last_known = *total;
        }
        buckets.insert(period_key(day, granularity), last_known);
    }

    into_points(buckets)
}

/// Per-bet recovery rate of the most recent `limit` records with a stake.
pub fn recovery_by_race(records: &[BetRecord], limit: usize) -> Vec<TimeSeriesPoint> {
    let mut staked: Vec<&BetRecord> = records.iter().filter(|record| record.stake > 0.0).collect();
    staked.sort_by(|a, b| a.date.cmp(&b.date));

    let skip = staked.len().saturating_sub(limit);
    staked
        .into_iter()
        .skip(skip)
        .map(|record| TimeSeriesPoint::new(race_label(record), record.recovery_rate()))
        .collect()
}

pub fn period_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => date.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => {
            let iso = date.iso_week();
            format!("{}-W{:02}", iso.year(), iso.week())
        }
        Granularity::Monthly => format!("{}-{:02}", date.year(), date.month()),
    }
}

fn race_label(record: &BetRecord) -> String {
    match record.race_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => match record.parsed_date() {
            Some(date) => date.format("%m/%d").to_string(),
            None => record.date.clone(),
        },
    }
}

/// Records that can be placed on a time axis, sorted by date. The sort is
/// stable so same-day records keep their input order.
fn dated_records(records: &[BetRecord]) -> Vec<(NaiveDate, &BetRecord)> {
    let mut dated: Vec<(NaiveDate, &BetRecord)> = records
        .iter()
        .filter_map(|record| record.parsed_date().map(|date| (date, record)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);
    dated
}

fn into_points(buckets: BTreeMap<String, f64>) -> Vec<TimeSeriesPoint> {
    buckets
        .into_iter()
        .map(|(label, value)| TimeSeriesPoint { label, value })
        .collect()
}

fn rate(payout: f64, stake: f64) -> f64 {
    if stake > 0.0 { payout / stake * 100.0 } else { 0.0 }
}
