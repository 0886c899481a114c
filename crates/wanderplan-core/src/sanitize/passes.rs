//! Individual repair passes.
//!
//! Each pass is a pure `&str -> String` transformation aimed at one failure
//! mode seen in model output. Passes that rewrite structure only touch text
//! outside double-quoted strings; passes that fix string contents only
//! touch text inside them.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A named text transformation.
#[derive(Clone, Copy)]
pub struct RepairPass {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

impl std::fmt::Debug for RepairPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairPass").field("name", &self.name).finish()
    }
}

/// Isolate the JSON object inside surrounding text.
pub const EXTRACTION_PASSES: [RepairPass; 3] = [
    RepairPass {
        name: "strip_code_fence",
        apply: strip_code_fence,
    },
    RepairPass {
        name: "normalize_whitespace",
        apply: normalize_whitespace,
    },
    RepairPass {
        name: "slice_object",
        apply: slice_object,
    },
];

/// Fix near-JSON syntax. Applied cumulatively after extraction.
pub const REPAIR_PASSES: [RepairPass; 7] = [
    RepairPass {
        name: "strip_trailing_commas",
        apply: strip_trailing_commas,
    },
    RepairPass {
        name: "quote_bare_keys",
        apply: quote_bare_keys,
    },
    RepairPass {
        name: "single_to_double_quotes",
        apply: single_to_double_quotes,
    },
    RepairPass {
        name: "join_url_schemes",
        apply: join_url_schemes,
    },
    RepairPass {
        name: "merge_split_markers",
        apply: merge_split_markers,
    },
    RepairPass {
        name: "escape_stray_backslashes",
        apply: escape_stray_backslashes,
    },
    RepairPass {
        name: "escape_stray_quotes",
        apply: escape_stray_quotes,
    },
];

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("valid regex"));

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

static BARE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$-]*)(\s*:)").expect("valid regex")
});

static URL_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(https?)"?\s*:\s*//"#).expect("valid regex"));

static SPLIT_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([A-Za-z]+)"\s*"(\d+)""#).expect("valid regex"));

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Keep only the interior of a markdown code fence. An unterminated
/// opening fence is dropped on its own.
pub fn strip_code_fence(text: &str) -> String {
    if let Some(caps) = FENCE_RE.captures(text) {
        return caps[1].trim().to_string();
    }
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = rest
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .trim_start();
        return body.to_string();
    }
    text.to_string()
}

/// Drop control characters, turn line breaks and tabs into spaces, and
/// collapse whitespace runs to one space.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for c in text.chars() {
        let c = match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => continue,
            c => c,
        };
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

/// Slice from the first `{` to the last `}`.
pub fn slice_object(text: &str) -> String {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => text[start..=end].to_string(),
        _ => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Syntax repair
// ---------------------------------------------------------------------------

/// `{"a":1,}` -> `{"a":1}`.
pub fn strip_trailing_commas(text: &str) -> String {
    rewrite_outside_strings(text, |segment| {
        TRAILING_COMMA_RE.replace_all(segment, "$1").into_owned()
    })
}

/// `{a:1}` -> `{"a":1}`.
pub fn quote_bare_keys(text: &str) -> String {
    rewrite_outside_strings(text, |segment| {
        BARE_KEY_RE
            .replace_all(segment, |caps: &Captures<'_>| {
                format!("{}\"{}\"{}", &caps[1], &caps[2], &caps[3])
            })
            .into_owned()
    })
}

/// `{'a': 'b'}` -> `{"a": "b"}`. Double quotes inside a converted string
/// are escaped; double-quoted strings are copied through.
pub fn single_to_double_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match quote {
            None => match c {
                '\'' => {
                    out.push('"');
                    quote = Some('\'');
                }
                '"' => {
                    out.push(c);
                    quote = Some('"');
                }
                _ => out.push(c),
            },
            Some('"') => {
                out.push(c);
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else if c == '"' {
                    quote = None;
                }
            }
            Some(_) => match c {
                '\\' => match chars.next() {
                    Some('\'') => out.push('\''),
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                },
                '\'' => {
                    out.push('"');
                    quote = None;
                }
                '"' => out.push_str("\\\""),
                _ => out.push(c),
            },
        }
    }
    out
}

/// `"https" :// host` and `https : //host` -> `https://`.
pub fn join_url_schemes(text: &str) -> String {
    URL_SCHEME_RE.replace_all(text, "$1://").into_owned()
}

/// `"Day" "3"` -> `Day 3`. Two adjacent string literals never occur in
/// valid JSON, so this only fires on broken output.
pub fn merge_split_markers(text: &str) -> String {
    SPLIT_MARKER_RE.replace_all(text, "$1 $2").into_owned()
}

/// Inside strings, double any backslash that does not start a valid JSON
/// escape. Escaped quotes are left alone, so the pass is idempotent.
pub fn escape_stray_backslashes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !in_string {
            out.push(c);
            in_string = c == '"';
            i += 1;
            continue;
        }
        match c {
            '\\' => match chars.get(i + 1) {
                Some(&next) if is_valid_escape(&chars[i + 1..]) => {
                    out.push('\\');
                    out.push(next);
                    i += 2;
                    continue;
                }
                _ => out.push_str("\\\\"),
            },
            '"' => {
                out.push(c);
                in_string = false;
            }
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

/// Inside strings, escape a `"` that cannot be a closing quote: one not
/// followed (after optional whitespace) by `,` `:` `}` `]` or the end of
/// input. Already escaped quotes are skipped.
pub fn escape_stray_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !in_string {
            out.push(c);
            in_string = c == '"';
            i += 1;
            continue;
        }
        match c {
            '\\' => {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                }
            }
            '"' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if matches!(next, None | Some(',' | ':' | '}' | ']')) {
                    out.push('"');
                    in_string = false;
                } else {
                    out.push_str("\\\"");
                }
            }
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether `rest`, the text right after a backslash, starts a valid JSON
/// escape. `\u` needs four hex digits.
fn is_valid_escape(rest: &[char]) -> bool {
    match rest.first() {
        Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => true,
        Some('u') => rest.len() >= 5 && rest[1..5].iter().all(char::is_ascii_hexdigit),
        _ => false,
    }
}

/// Apply `rewrite` to every run of text outside double-quoted strings,
/// copying string literals through unchanged.
fn rewrite_outside_strings(text: &str, rewrite: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut outside = String::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            out.push_str(&rewrite(&outside));
            outside.clear();
            out.push(c);
            in_string = true;
        } else {
            outside.push(c);
        }
    }
    out.push_str(&rewrite(&outside));
    out
}
