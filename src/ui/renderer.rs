// Renderer module - formatting utilities
// Widget construction lives in layout.rs

use chrono::{DateTime, Local, Utc};

/// Format a USDC amount for display (6 decimals, no rounding in the model)
pub fn format_usdc(amount: f64) -> String {
    format!("{:.6}", amount)
}

/// Shorten a long identifier to `head…tail`
pub fn abbreviate(id: &str, keep: usize) -> String {
    let len = id.chars().count();
    if len <= keep * 2 + 1 {
        return id.to_string();
    }
    let head: String = id.chars().take(keep).collect();
    let tail: String = id.chars().skip(len - keep).collect();
    format!("{}…{}", head, tail)
}

/// Primary signature, with a count of any extra signatures
pub fn format_signatures(signatures: &[String]) -> String {
    match signatures {
        [] => String::new(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("{} (+{})", first, rest.len()),
    }
}

pub fn format_last_update(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "never".to_string(),
    }
}
