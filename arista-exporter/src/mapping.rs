//! Naming rules and value mapping from device state to Prometheus samples.

/// Turn a configured prefix into something usable in front of metric names.
///
/// Runs of underscores and characters outside `[a-zA-Z0-9:]` collapse into
/// one underscore, and a leading digit gets an underscore in front. Returns
/// an empty string when nothing usable is left.
pub fn sanitize_prefix(prefix: &str) -> String {
    let mut result = String::with_capacity(prefix.len() + 1);

    for c in prefix.chars() {
        let keep = c.is_ascii_alphanumeric() || c == ':';
        if keep {
            result.push(c);
        } else if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
        }
    }

    // The registry adds its own separator
    while result.ends_with('_') {
        result.pop();
    }

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }

    result
}

/// Whether `name` is a valid metric name, `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Whether `name` is a valid label name, `[a-zA-Z_][a-zA-Z0-9_]*`.
///
/// Names starting with `__` are reserved by Prometheus and rejected.
pub fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Health mapping: 1 when the device reports the healthy value, 0 otherwise.
///
/// The caller labels the sample with `actual`, so the literal status is
/// always visible next to the binary signal.
pub fn health_value(actual: &str, healthy: &str) -> f64 {
    if actual == healthy { 1.0 } else { 0.0 }
}

/// Boolean flag as a sample value.
pub fn flag_value(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}
