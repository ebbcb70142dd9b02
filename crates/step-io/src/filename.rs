//! Export filename sanitation.

/// Sanitize a user-supplied export filename, preserving a valid STEP
/// extension.
///
/// Path components are stripped to the final segment and characters that are
/// unsafe in filenames are replaced; the result always ends in `.step` (an
/// existing `.step`/`.stp` extension is kept as-is). Collision handling is
/// left to the save sink; this never renames to dodge an existing file.
pub fn sanitize_step_filename(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim();

    let mut cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        cleaned = "model".to_string();
    }

    let lower = cleaned.to_ascii_lowercase();
    if lower.ends_with(".step") || lower.ends_with(".stp") {
        cleaned
    } else {
        format!("{cleaned}.step")
    }
}
