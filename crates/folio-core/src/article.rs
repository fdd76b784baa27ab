//! Small article-level helpers used by the page front-end.

const CHARS_PER_MINUTE: usize = 200;

/// Estimated reading time, counting characters rather than words.
pub fn reading_time_minutes(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_MINUTE)
}

/// The first level-1 ATX heading outside fenced code, if any.
pub fn article_title(text: &str) -> Option<String> {
    let mut in_fence = false;
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("# ") {
            let title = rest.trim().trim_end_matches('#').trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}

/// File name offered when downloading the article source.
pub fn download_file_name(title: Option<&str>) -> String {
    let stem: String = title
        .map(str::trim)
        .unwrap_or_default()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() {
        "article.md".to_string()
    } else {
        format!("{stem}.md")
    }
}
