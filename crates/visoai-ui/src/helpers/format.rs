// crates/visoai-ui/src/helpers/format.rs
//
// Display-only string helpers. Time formatting lives in
// visoai_core::helpers::time.

/// Truncates `text` to roughly `max_px` points using an average glyph width,
/// appending "…" when cut. Avoids a font lookup during layout.
pub fn fit_label(text: &str, max_px: f32) -> String {
    const AVG_CHAR_PX: f32 = 6.5;
    let max_chars = (max_px / AVG_CHAR_PX).max(0.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    text.chars().take(max_chars - 1).collect::<String>() + "…"
}

/// First line of a stored-video prompt, for list rows. Falls back to the id.
pub fn prompt_title(prompt: &str, id: i64) -> String {
    let line = prompt.lines().map(str::trim).find(|l| !l.is_empty());
    match line {
        Some(l) => l.to_string(),
        None    => format!("Video #{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_unchanged() {
        assert_eq!(fit_label("intro.mp4", 200.0), "intro.mp4");
    }

    #[test]
    fn zero_budget_is_empty() {
        assert_eq!(fit_label("intro.mp4", 0.0), "");
    }

    #[test]
    fn long_text_gets_ellipsis() {
        let out = fit_label("a very long generated clip name.mp4", 40.0);
        assert!(out.ends_with('…'));
        assert_eq!(out.chars().count(), 6);
    }

    #[test]
    fn prompt_title_skips_blank_lines() {
        assert_eq!(prompt_title("\n  sunset over water \nmore", 3), "sunset over water");
        assert_eq!(prompt_title("   ", 7), "Video #7");
    }
}
