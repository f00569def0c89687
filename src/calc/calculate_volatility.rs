use serde::Serialize;

use crate::error::VolatilityError;
use crate::util::rounding::round_to_decimals;

/// Decimal places kept in the reported statistics.
pub const RESULT_DECIMALS: u32 = 4;

/// Smallest price series with a defined sample standard deviation of returns.
pub const MIN_PRICES: usize = 3;

/// How the daily figure is scaled up to an annualized one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Annualization {
    /// Scale by the square root of the number of price rows.
    #[default]
    SampleCount,
    /// Scale by the square root of a fixed periods-per-year count (e.g. 252).
    Periods(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolatilityResult {
    #[serde(rename = "Daily Volatility")]
    pub daily_volatility: f64,
    #[serde(rename = "Annualized Volatility")]
    pub annualized_volatility: f64,
}

/// Fractional change between each pair of consecutive prices.
///
/// The result has one element fewer than `prices`, and is empty when fewer
/// than two prices are given. Every price must be finite and strictly positive.
pub fn compute_daily_returns(prices: &[f64]) -> Result<Vec<f64>, VolatilityError> {
    if let Some((i, price)) = prices
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p <= 0.0)
    {
        return Err(VolatilityError::MalformedData(format!(
            "price at position {} must be positive and finite, got {}",
            i, price
        )));
    }

    Ok(prices
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect())
}

/// Sample standard deviation (n - 1 divisor) of the whole return series.
pub fn compute_daily_volatility(returns: &[f64]) -> Result<f64, VolatilityError> {
    let n = returns.len();
    if n < 2 {
        return Err(VolatilityError::InsufficientReturns {
            required: 2,
            actual: n,
        });
    }

    // Calculate mean
    let mean = returns.iter().sum::<f64>() / n as f64;

    // Calculate variance
    let variance = returns.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

    Ok(variance.sqrt())
}

pub fn compute_annualized_volatility(daily_volatility: f64, num_observations: usize) -> f64 {
    daily_volatility * (num_observations as f64).sqrt()
}

/// Daily and annualized volatility of a closing-price series, annualized by row count.
pub fn compute_volatility(prices: &[f64]) -> Result<VolatilityResult, VolatilityError> {
    compute_volatility_with(prices, Annualization::SampleCount)
}

pub fn compute_volatility_with(
    prices: &[f64],
    annualization: Annualization,
) -> Result<VolatilityResult, VolatilityError> {
    if prices.len() < MIN_PRICES {
        return Err(VolatilityError::InsufficientData {
            required: MIN_PRICES,
            actual: prices.len(),
        });
    }

    // Step 1: daily returns
    let returns = compute_daily_returns(prices)?;

    // Step 2: daily volatility
    let daily_volatility = compute_daily_volatility(&returns)?;

    // Step 3: annualized volatility
    let horizon = match annualization {
        Annualization::SampleCount => prices.len(),
        Annualization::Periods(periods) => periods as usize,
    };
    let annualized_volatility = compute_annualized_volatility(daily_volatility, horizon);

    let result = VolatilityResult {
        daily_volatility: round_to_decimals(daily_volatility, RESULT_DECIMALS),
        annualized_volatility: round_to_decimals(annualized_volatility, RESULT_DECIMALS),
    };

    // Extreme price ratios can overflow a return, or the rounding scale, to inf/NaN
    if !result.daily_volatility.is_finite() || !result.annualized_volatility.is_finite() {
        return Err(VolatilityError::MalformedData(
            "price series overflows double precision".to_string(),
        ));
    }

    Ok(result)
}
