use crate::utils::text::non_empty;

/// Escapes a value for use inside a double-quoted filter literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

pub fn name_contains(query: Option<&str>) -> Option<String> {
    non_empty(query).map(|q| format!("name co {}", quote(q)))
}

pub fn source_entitlements(source_id: &str, query: Option<&str>) -> String {
    let base = format!("source.id eq {}", quote(source_id));
    match name_contains(query) {
        Some(name) => format!("{} and {}", base, name),
        None => base,
    }
}

/// Appends `filters` and `limit` as a form-encoded query string.
pub fn with_query(path: &str, filters: Option<&str>, limit: Option<usize>) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    if let Some(filters) = filters {
        pairs.push(("filters", filters.to_string()));
    }
    if let Some(limit) = limit {
        pairs.push(("limit", limit.to_string()));
    }
    if pairs.is_empty() {
        return path.to_string();
    }
    match serde_urlencoded::to_string(&pairs) {
        Ok(encoded) => format!("{}?{}", path, encoded),
        Err(_) => path.to_string(),
    }
}
