//! 30 day series synthesis for sources without a history endpoint

use intel_core::SeriesPoint;
use rand::Rng;

pub const HISTORY_DAYS: usize = 30;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Daily series trending back from the current quote
///
/// Older points are pushed along the 24h change direction with a small
/// random wobble, and volume wanders between half and full of today's.
pub fn synthesize_daily_history(
    price: f64,
    change_24h: f64,
    volume: f64,
    now_ms: i64,
) -> (Vec<SeriesPoint>, Vec<SeriesPoint>) {
    let mut rng = rand::rng();
    let mut prices = Vec::with_capacity(HISTORY_DAYS);
    let mut volumes = Vec::with_capacity(HISTORY_DAYS);

    for days_ago in (0..HISTORY_DAYS).rev() {
        let ts = now_ms - days_ago as i64 * DAY_MS;
        let trend = 1.0 + (change_24h / 100.0) * (days_ago as f64 / HISTORY_DAYS as f64);
        let wobble = (rng.random::<f64>() - 0.5) * 0.05;

        prices.push((ts, (price * trend * (1.0 + wobble)).max(0.0)));
        volumes.push((ts, volume * rng.random_range(0.5..=1.0)));
    }

    (prices, volumes)
}

/// Daily series interpolated from a short sparkline
///
/// The sparkline is stretched over the whole window by linear
/// interpolation; without one the price is held flat. The last point is
/// always `price`.
pub fn history_from_sparkline(
    sparkline: Option<&[f64]>,
    price: f64,
    volume: f64,
    now_ms: i64,
) -> (Vec<SeriesPoint>, Vec<SeriesPoint>) {
    let points: Vec<f64> = match sparkline {
        Some(s) if s.len() >= 2 => s.to_vec(),
        _ => vec![price, price],
    };

    let span = (points.len() - 1) as f64;
    let mut prices = Vec::with_capacity(HISTORY_DAYS);
    let mut volumes = Vec::with_capacity(HISTORY_DAYS);

    for (i, days_ago) in (0..HISTORY_DAYS).rev().enumerate() {
        let ts = now_ms - days_ago as i64 * DAY_MS;
        let pos = i as f64 / (HISTORY_DAYS - 1) as f64 * span;
        let lo = pos.floor() as usize;
        let hi = (lo + 1).min(points.len() - 1);
        let frac = pos - lo as f64;
        let value = if days_ago == 0 {
            price
        } else {
            points[lo] + (points[hi] - points[lo]) * frac
        };

        prices.push((ts, value));
        volumes.push((ts, volume));
    }

    (prices, volumes)
}
