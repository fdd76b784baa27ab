//! Reference-citation hygiene.
//!
//! Generated articles sometimes close numeric citations twice (`[3,9]]`). The cleanup runs before
//! annotation scanning so tag offsets are computed against the cleaned text.
//!
//! Note: this also rewrites the inner half of `[[wiki]]`-style double brackets (`[[wiki]`). The
//! heuristic is kept as-is; narrowing it needs evidence about what the generator emits.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static DOUBLED_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]\]").expect("bracket-cite pattern is valid"));

/// Rewrites `[<body>]]` to `[<body>]`. Returns the input unchanged (borrowed) when nothing matches.
pub fn normalize_bracket_citations(text: &str) -> Cow<'_, str> {
    DOUBLED_CLOSE_RE.replace_all(text, "[${1}]")
}
