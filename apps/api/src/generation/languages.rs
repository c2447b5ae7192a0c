//! Language codes accepted by the generator and their prompt names.

/// Lyrics in any other language set get a translation into this one.
pub const TRANSLATION_TARGET: &str = "zh";

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("zh", "Chinese"),
    ("en", "English"),
    ("ja", "Japanese"),
    ("fr", "French"),
    ("ru", "Russian"),
    ("de", "German"),
];

/// English name for a code; unknown codes pass through unchanged.
pub fn language_name(code: &str) -> &str {
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// `["zh", "en"]` → `"Chinese, English"`.
pub fn language_list(codes: &[String]) -> String {
    codes
        .iter()
        .map(|c| language_name(c))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn needs_translation(codes: &[String]) -> bool {
    !codes.iter().any(|c| c == TRANSLATION_TARGET)
}

/// Storage form of a language selection: comma-joined codes.
pub fn join_codes(codes: &[String]) -> String {
    codes.join(",")
}
