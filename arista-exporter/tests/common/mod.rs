//! Helpers shared by the integration tests.

/// Value of the sample `series` (metric name plus rendered labels) in
/// exposition text, if present.
pub fn sample_value(output: &str, series: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        let rest = line.strip_prefix(series)?;
        let value = rest.strip_prefix(' ')?;
        value.split_whitespace().next()?.parse().ok()
    })
}
