//! Analytics engine
//!
//! Scores a normalized coin, classifies it into a recommendation and
//! writes a short natural-language insight. Pure and deterministic: the
//! output depends on the input record only.

use intel_core::{CoinOverview, NormalizedCoin, Recommendation, Sparkline, SPARKLINE_POINTS};

/// 24h moves beyond this (percent) are treated as anomalous
pub const ANOMALY_THRESHOLD_PCT: f64 = 15.0;

/// Sparkline coefficient of variation above which the trend is dampened
const VOLATILE_CV: f64 = 0.15;
const VOLATILE_DAMPING: f64 = 0.7;

/// Percent changes that saturate the momentum and trend signals
const MOMENTUM_SATURATION_PCT: f64 = 10.0;
const TREND_SATURATION_PCT: f64 = 20.0;

const WEIGHT_VOLUME: f64 = 0.30;
const WEIGHT_MOMENTUM: f64 = 0.25;
const WEIGHT_TREND: f64 = 0.25;
const WEIGHT_MARKET_CAP: f64 = 0.20;

/// Individual signals behind a score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    /// Volume / market cap, clamped to `[0, 1]`
    pub volume: f64,
    /// 24h momentum rescaled to `[0, 1]`
    pub momentum: f64,
    /// 7 day trend in `[-1, 1]`, before rescaling
    pub raw_trend: f64,
    /// Trend rescaled to `[0, 1]`
    pub trend: f64,
    /// Market cap stability weight
    pub market_cap: f64,
}

impl Signals {
    pub fn score(&self) -> f64 {
        (WEIGHT_VOLUME * self.volume
            + WEIGHT_MOMENTUM * self.momentum
            + WEIGHT_TREND * self.trend
            + WEIGHT_MARKET_CAP * self.market_cap)
            .clamp(0.0, 1.0)
    }

    pub fn buy_signal(&self) -> f64 {
        0.4 * self.momentum + 0.4 * self.trend + 0.2 * self.volume
    }

    pub fn sell_signal(&self) -> f64 {
        0.4 * (1.0 - self.momentum) + 0.4 * (1.0 - self.trend) + 0.2 * (1.0 - self.volume)
    }
}

/// 7 day shape of a sparkline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekStats {
    /// First to last point, percent
    pub change_pct: f64,
    /// Population standard deviation over mean
    pub cv: f64,
}

impl WeekStats {
    /// `None` for short, non-finite or non-positive series
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        if prices.len() < SPARKLINE_POINTS || prices.iter().any(|p| !p.is_finite()) {
            return None;
        }

        let first = *prices.first()?;
        let last = *prices.last()?;
        let n = prices.len() as f64;
        let mean = prices.iter().sum::<f64>() / n;
        if first <= 0.0 || mean <= 0.0 {
            return None;
        }

        let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            change_pct: (last - first) / first * 100.0,
            cv: variance.sqrt() / mean,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Derive score, recommendation and insight for one coin
    pub fn analyze(&self, coin: NormalizedCoin) -> CoinOverview {
        let week = coin.sparkline().and_then(WeekStats::from_prices);
        let signals = self.signals(&coin, week);
        let score = signals.score();
        let recommendation = recommend(&signals, score, coin.price_change_percentage_24h);
        let insight = insight(&coin, week, score, recommendation);

        let coin = if coin.sparkline_in_7d.is_none() {
            NormalizedCoin {
                sparkline_in_7d: display_sparkline(&coin),
                ..coin
            }
        } else {
            coin
        };

        CoinOverview {
            coin,
            score,
            recommendation,
            insight,
        }
    }

    pub fn analyze_all(&self, coins: Vec<NormalizedCoin>) -> Vec<CoinOverview> {
        coins.into_iter().map(|c| self.analyze(c)).collect()
    }

    pub fn signals(&self, coin: &NormalizedCoin, week: Option<WeekStats>) -> Signals {
        let volume = if coin.market_cap > 0.0 {
            (coin.total_volume / coin.market_cap).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let momentum = (coin.price_change_percentage_24h / MOMENTUM_SATURATION_PCT).clamp(-1.0, 1.0);

        let raw_trend = match week {
            Some(w) => {
                let trend = (w.change_pct / TREND_SATURATION_PCT).clamp(-1.0, 1.0);
                if w.cv > VOLATILE_CV {
                    trend * VOLATILE_DAMPING
                } else {
                    trend
                }
            }
            None => 0.0,
        };

        Signals {
            volume,
            momentum: (momentum + 1.0) / 2.0,
            raw_trend,
            trend: (raw_trend + 1.0) / 2.0,
            market_cap: market_cap_weight(coin.market_cap),
        }
    }
}

fn market_cap_weight(market_cap: f64) -> f64 {
    if market_cap > 10e9 {
        0.7
    } else if market_cap > 1e9 {
        0.6
    } else if market_cap > 100e6 {
        0.5
    } else {
        0.3
    }
}

/// Classify a snapshot; extreme 24h moves always hold
pub fn recommend(signals: &Signals, score: f64, change_24h: f64) -> Recommendation {
    if !change_24h.is_finite() || change_24h.abs() > ANOMALY_THRESHOLD_PCT {
        return Recommendation::Hold;
    }

    if score > 0.75 && change_24h > 5.0 && signals.buy_signal() > 0.7 && signals.raw_trend > 0.3 {
        Recommendation::StrongBuy
    } else if score > 0.6 && change_24h > 2.0 && signals.buy_signal() > 0.55 {
        Recommendation::Buy
    } else if score < 0.3
        && change_24h < -5.0
        && signals.sell_signal() > 0.7
        && signals.raw_trend < -0.3
    {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

/// Straight display line walking back along the 24h change
fn display_sparkline(coin: &NormalizedCoin) -> Option<Sparkline> {
    let change = coin.price_change_percentage_24h / 100.0;
    let points: Vec<f64> = (0..SPARKLINE_POINTS)
        .map(|i| {
            let days_ago = (SPARKLINE_POINTS - 1 - i) as f64;
            coin.current_price * (1.0 - change * days_ago / SPARKLINE_POINTS as f64)
        })
        .collect();

    let usable = points.iter().all(|p| p.is_finite() && *p > 0.0);
    usable.then(|| Sparkline::new(points))
}

// ============================================================================
// Insight text
// ============================================================================

fn insight(
    coin: &NormalizedCoin,
    week: Option<WeekStats>,
    score: f64,
    recommendation: Recommendation,
) -> String {
    compose_insight(coin, week, score, recommendation)
        .unwrap_or_else(|| fallback_insight(coin, score, recommendation))
}

fn compose_insight(
    coin: &NormalizedCoin,
    week: Option<WeekStats>,
    score: f64,
    recommendation: Recommendation,
) -> Option<String> {
    let mut parts = vec![day_fragment(coin.price_change_percentage_24h)?];

    if let Some(w) = week {
        parts.push(week_fragment(w)?);
    }

    parts.push(liquidity_fragment(coin.total_volume, coin.market_cap)?);
    parts.push(market_cap_fragment(coin.market_cap)?);
    parts.push(closing_fragment(score, recommendation)?);

    Some(format!("{}.", parts.join(". ")))
}

fn day_fragment(change: f64) -> Option<String> {
    if !change.is_finite() {
        return None;
    }
    let abs = change.abs();

    let text = if change > 10.0 {
        format!("Surged {:.2}% in 24h on euphoric sentiment and heavy inflows", abs)
    } else if change > 5.0 {
        format!("Rallied {:.2}% in 24h with strong buying pressure", abs)
    } else if change > 2.0 {
        format!("Gained {:.2}% in 24h as bulls keep the upper hand", abs)
    } else if change > 0.0 {
        format!("Edged up {:.2}% in 24h with buyers and sellers roughly balanced", abs)
    } else if change > -2.0 {
        format!("Slipped {:.2}% in 24h in an ordinary short-term pullback", abs)
    } else if change > -5.0 {
        format!("Fell {:.2}% in 24h as sellers gain ground", abs)
    } else if change > -10.0 {
        format!("Dropped {:.2}% in 24h under clearly rising selling pressure", abs)
    } else {
        format!("Plunged {:.2}% in 24h on deeply pessimistic sentiment and outflows", abs)
    };
    Some(text)
}

fn week_fragment(week: WeekStats) -> Option<String> {
    let change = week.change_pct;
    if !change.is_finite() || !week.cv.is_finite() {
        return None;
    }
    let abs = change.abs();

    let trend = if change > 10.0 {
        format!("Up {:.1}% over 7 days in a strong uptrend", abs)
    } else if change > 5.0 {
        format!("Up {:.1}% over 7 days with steady upward momentum", abs)
    } else if change > 0.0 {
        format!("Up {:.1}% over 7 days in a mild uptrend", abs)
    } else if change > -5.0 {
        format!("{:.1}% over 7 days while consolidating in a range", change)
    } else if change > -10.0 {
        format!("Down {:.1}% over 7 days in a modest correction", abs)
    } else {
        format!("Down {:.1}% over 7 days in a clear downtrend", abs)
    };

    let cv_pct = week.cv * 100.0;
    let volatility = if cv_pct > 8.0 {
        "high"
    } else if cv_pct > 4.0 {
        "moderate"
    } else {
        "low"
    };

    Some(format!("{}, with {} volatility", trend, volatility))
}

fn liquidity_fragment(volume: f64, market_cap: f64) -> Option<String> {
    let ratio = if market_cap > 0.0 {
        volume / market_cap * 100.0
    } else {
        0.0
    };
    if !ratio.is_finite() {
        return None;
    }

    let text = if ratio > 15.0 {
        "Trading is very active and liquidity is excellent"
    } else if ratio > 8.0 {
        "Trading is lively and liquidity is good"
    } else if ratio > 4.0 {
        "Trading and liquidity are moderate"
    } else {
        "Trading is thin, so large orders may move the price"
    };
    Some(text.to_string())
}

fn market_cap_fragment(market_cap: f64) -> Option<String> {
    if !market_cap.is_finite() {
        return None;
    }
    let billions = market_cap / 1e9;

    let text = if billions > 100.0 {
        "A mega-cap with an entrenched position and comparatively low risk"
    } else if billions > 10.0 {
        "A large-cap with broad recognition and some resilience"
    } else if billions > 1.0 {
        "A mid-cap with room to grow but higher volatility"
    } else {
        "A small-cap with high potential upside and high risk"
    };
    Some(text.to_string())
}

fn closing_fragment(score: f64, recommendation: Recommendation) -> Option<String> {
    if !score.is_finite() {
        return None;
    }

    let verdict = if score > 0.75 {
        "excellent, with strong readings across the board"
    } else if score > 0.6 {
        "good, with balanced indicators"
    } else if score > 0.4 {
        "average, so waiting for a clearer setup is reasonable"
    } else {
        "weak, so caution is advised"
    };

    let advice = match recommendation {
        Recommendation::StrongBuy => "price and trend both flash a strong buy signal",
        Recommendation::Buy => "momentum is constructive, consider building a position gradually",
        Recommendation::Hold => "signals are neutral, keep current exposure and wait",
        Recommendation::Sell => "the tape looks weak, consider trimming to limit risk",
    };

    Some(format!(
        "Composite score {:.2} is {}. {}: {}",
        score,
        verdict,
        recommendation.display_name(),
        advice
    ))
}

fn fallback_insight(coin: &NormalizedCoin, score: f64, recommendation: Recommendation) -> String {
    format!(
        "{} trades at ${} ({:+.2}% in 24h). Composite score {:.2}, recommendation: {}.",
        coin.name,
        coin.current_price,
        coin.price_change_percentage_24h,
        score,
        recommendation.display_name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(change: f64, market_cap: f64, volume: f64, spark: Option<Vec<f64>>) -> NormalizedCoin {
        NormalizedCoin {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            current_price: 45000.0,
            price_change_percentage_24h: change,
            market_cap,
            total_volume: volume,
            sparkline_in_7d: spark.map(Sparkline::new),
        }
    }

    #[test]
    fn test_zero_market_cap_scores_zero_volume() {
        let engine = AnalyticsEngine::new();
        let signals = engine.signals(&coin(1.0, 0.0, 1.0e9, None), None);

        assert_eq!(signals.volume, 0.0);
        let overview = engine.analyze(coin(1.0, 0.0, 1.0e9, None));
        assert!(overview.score.is_finite());
        assert!((0.0..=1.0).contains(&overview.score));
    }

    #[test]
    fn test_no_sparkline_is_neutral_trend() {
        let engine = AnalyticsEngine::new();
        let signals = engine.signals(&coin(0.0, 1.0e12, 0.0, None), None);
        assert_eq!(signals.trend, 0.5);
        assert_eq!(signals.raw_trend, 0.0);
        assert_eq!(signals.momentum, 0.5);
    }

    #[test]
    fn test_score_weights() {
        // volume 1, momentum 1, trend 0.5, mcap 0.7
        let spark = vec![100.0; 7];
        let c = coin(12.0, 1.0e11, 5.0e11, Some(spark));
        let engine = AnalyticsEngine::new();
        let week = c.sparkline().and_then(WeekStats::from_prices);
        let score = engine.signals(&c, week).score();

        let expected = 0.30 + 0.25 + 0.25 * 0.5 + 0.20 * 0.7;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_volatile_sparkline_dampens_trend() {
        let calm = WeekStats::from_prices(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 110.0]).unwrap();
        let wild = WeekStats::from_prices(&[100.0, 40.0, 160.0, 30.0, 170.0, 60.0, 110.0]).unwrap();
        assert!(wild.cv > VOLATILE_CV);

        let engine = AnalyticsEngine::new();
        let c = coin(0.0, 1.0e9, 1.0e8, None);
        let calm_trend = engine.signals(&c, Some(calm)).raw_trend;
        let wild_trend = engine.signals(&c, Some(wild)).raw_trend;

        assert!((calm_trend - 0.5).abs() < 1e-9);
        assert!((wild_trend - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_short_sparkline_has_no_week_stats() {
        assert_eq!(WeekStats::from_prices(&[100.0; 6]), None);
        assert_eq!(WeekStats::from_prices(&[100.0, 101.0, f64::NAN, 103.0, 104.0, 105.0, 106.0]), None);
        assert!(WeekStats::from_prices(&[100.0; 7]).is_some());
    }

    #[test]
    fn test_strong_buy() {
        let spark = vec![100.0, 103.0, 106.0, 109.0, 112.0, 115.0, 118.0];
        let overview = AnalyticsEngine::new().analyze(coin(8.0, 5.0e10, 5.0e10, Some(spark)));
        assert_eq!(overview.recommendation, Recommendation::StrongBuy);
    }

    #[test]
    fn test_sell() {
        let spark = vec![100.0, 96.0, 93.0, 90.0, 87.0, 84.0, 82.0];
        let overview = AnalyticsEngine::new().analyze(coin(-9.0, 5.0e7, 1.0e5, Some(spark)));
        assert_eq!(overview.recommendation, Recommendation::Sell);
    }

    #[test]
    fn test_extreme_move_forces_hold() {
        let spark = vec![100.0, 105.0, 110.0, 115.0, 120.0, 125.0, 130.0];
        let overview = AnalyticsEngine::new().analyze(coin(16.0, 5.0e10, 5.0e10, Some(spark)));
        assert_eq!(overview.recommendation, Recommendation::Hold);

        let overview = AnalyticsEngine::new().analyze(coin(-40.0, 5.0e7, 0.0, None));
        assert_eq!(overview.recommendation, Recommendation::Hold);
    }

    #[test]
    fn test_display_sparkline_added_but_trend_neutral() {
        let overview = AnalyticsEngine::new().analyze(coin(7.0, 1.0e9, 1.0e8, None));
        let spark = overview.coin.sparkline().unwrap();

        assert_eq!(spark.len(), SPARKLINE_POINTS);
        assert_eq!(*spark.last().unwrap(), 45000.0);
        assert!(!overview.insight.contains("over 7 days"));
    }

    #[test]
    fn test_insight_fragments() {
        let spark = vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 112.0];
        let overview = AnalyticsEngine::new().analyze(coin(3.2, 8.8e11, 2.5e10, Some(spark)));

        assert!(overview.insight.starts_with("Gained 3.20% in 24h"));
        assert!(overview.insight.contains("Up 12.0% over 7 days"));
        assert!(overview.insight.contains("mega-cap"));
        assert!(overview.insight.ends_with('.'));
    }

    #[test]
    fn test_fallback_insight_never_empty() {
        let mut c = coin(1.0, 1.0e9, 1.0e8, None);
        c.price_change_percentage_24h = f64::NAN;
        let text = insight(&c, None, 0.5, Recommendation::Hold);
        assert!(text.starts_with("Bitcoin trades at $45000"));
    }
}
