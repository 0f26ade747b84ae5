use serde_json::Value;

use crate::directory::{format_cop, Psychologist};
use crate::error::AppError;

/// Cap to keep output readable.
const MAX_COL_WIDTH: usize = 60;

// Render a list of records as an ASCII table.
// Returns true if a table was printed, false when the caller should fall back to JSON.
pub fn print_records(val: &Value) -> bool {
    if std::env::var("RESETMENTAL_OUTPUT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false) {
        return false;
    }
    match render_records(val) {
        Some(table) => {
            print!("{}", table);
            true
        }
        None => false,
    }
}

/// Table for a JSON array; objects contribute the union of their keys as columns
/// (in map order, first object first), scalars go in a single `value` column.
pub fn render_records(val: &Value) -> Option<String> {
    let arr = val.as_array().filter(|a| !a.is_empty())?;
    let mut cols: Vec<String> = Vec::new();
    let all_objects = arr.iter().all(Value::is_object);
    if all_objects {
        for el in arr {
            if let Value::Object(map) = el {
                for k in map.keys() { if !cols.contains(k) { cols.push(k.clone()); } }
            }
        }
    }
    let rows: Vec<Vec<String>> = if all_objects && !cols.is_empty() {
        arr.iter()
            .map(|el| cols.iter().map(|k| el.get(k).map(to_cell_string).unwrap_or_default()).collect())
            .collect()
    } else {
        cols = vec!["value".to_string()];
        arr.iter().map(|el| vec![to_cell_string(el)]).collect()
    };
    Some(render_table(&cols, &rows))
}

/// Directory cards in the column order a person browsing would expect.
pub fn render_psychologists(list: &[Psychologist]) -> String {
    let cols: Vec<String> = ["id", "nombre", "especialidad", "modalidad", "precio", "experiencia"].iter().map(|s| s.to_string()).collect();
    let rows: Vec<Vec<String>> = list
        .iter()
        .map(|p| vec![p.id.to_string(), p.name.clone(), p.specialty.clone(), p.location.clone(), format_cop(p.price), p.experience.clone()])
        .collect();
    render_table(&cols, &rows)
}

pub fn render_table(cols: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = cols.iter().map(|s| display_len(s).min(MAX_COL_WIDTH)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] { widths[i] = w.min(MAX_COL_WIDTH); }
        }
    }
    let sep = build_separator(&widths);
    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&build_row(cols, &widths));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for r in rows {
        out.push_str(&build_row(r, &widths));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&format!("filas: {}\n", rows.len()));
    out
}

/// Process exit status for a failed command: 2 for bad input, 3 when the session expired.
pub fn exit_code(err: &AppError) -> i32 {
    match err {
        AppError::Validation { .. } => 2,
        AppError::SessionExpired { .. } | AppError::Unauthenticated { .. } => 3,
        _ => 1,
    }
}

fn to_cell_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // nested values stay compact JSON
        other => other.to_string(),
    }
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let text = truncate(cell, *w);
        let pad = " ".repeat(w.saturating_sub(display_len(&text)));
        s.push(' ');
        if is_numeric_like(cell) {
            s.push_str(&pad);
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&pad);
        }
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

// Numbers and COP amounts align right.
fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    let st = st.strip_prefix('$').unwrap_or(st);
    if st.is_empty() { return false; }
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() { has_digit = true; continue; }
        if ".-+,".contains(ch) { continue; }
        return false;
    }
    has_digit
}
