/// Rounds `value` to `decimals` places, half away from zero.
///
/// Ties are judged on the exact value of `value`, not on the rounded product
/// `value * 10^decimals`: a value just below a tie rounds down even when the
/// scaling lands it on the tie.
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;

    // Exact residual of the product, so scaled + residual == value * factor
    let residual = value.mul_add(factor, -scaled);

    let rounded = if (scaled - scaled.trunc()).abs() == 0.5 && residual != 0.0 {
        if (residual > 0.0) == (scaled > 0.0) {
            scaled.round()
        } else {
            scaled.trunc()
        }
    } else {
        scaled.round()
    };

    rounded / factor
}
