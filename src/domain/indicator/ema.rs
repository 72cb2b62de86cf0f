//! Exponential moving averages, unadjusted recursive form.
//!
//! ema[0] = x[0], then ema[t] = alpha*x[t] + (1-alpha)*ema[t-1].
//! No warmup masking here; callers decide when a value is usable.

/// Recursive EMA with an explicit smoothing factor.
pub fn ema_alpha(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &x in values {
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }

    out
}

/// Span convention: alpha = 2/(span+1).
pub fn ema_span(values: &[f64], span: usize) -> Vec<f64> {
    ema_alpha(values, 2.0 / (span as f64 + 1.0))
}

/// Center-of-mass convention: alpha = 1/(1+com). Wilder smoothing over
/// `n` periods is `com = n - 1`.
pub fn ema_com(values: &[f64], com: f64) -> Vec<f64> {
    ema_alpha(values, 1.0 / (1.0 + com))
}
