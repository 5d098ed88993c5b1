const BASE10_SUFFIXES: [&str; 6] = ["KB", "MB", "GB", "TB", "PB", "EB"];

/// Formats a byte count with base-10 units, e.g. `1.5 MB`.
pub fn bytes_string_base10(bytes: u64) -> String {
    if bytes < 1000 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1000.0;
    let mut suffix = BASE10_SUFFIXES[0];
    for next in &BASE10_SUFFIXES[1..] {
        if value < 1000.0 {
            break;
        }
        value /= 1000.0;
        suffix = next;
    }

    format!("{:.1} {}", value, suffix)
}

/// Growth annotation shown next to a snapshot; empty when there is no growth.
pub fn delta_string(delta: Option<u64>) -> String {
    match delta {
        Some(bytes) if bytes > 0 => format!("(+{})", bytes_string_base10(bytes)),
        _ => String::new(),
    }
}
