//! Language code normalization and display names for playlist tracks.

/// Codes found on discs that are not ISO 639-1, mapped to the ISO code.
const REMAP: &[(&str, &str)] = &[
    ("jp", "ja"),
    ("se", "sv"),
    ("dk", "da"),
    ("br", "pt"),
    ("cz", "cs"),
];

/// ISO 639-1 code, ISO 639-2 codes (bibliographic, terminology) and the
/// English display name.
const LANGUAGES: &[(&str, &str, &str, &str)] = &[
    ("ar", "ara", "ara", "Arabic"),
    ("bg", "bul", "bul", "Bulgarian"),
    ("ca", "cat", "cat", "Catalan"),
    ("cs", "cze", "ces", "Czech"),
    ("da", "dan", "dan", "Danish"),
    ("de", "ger", "deu", "German"),
    ("el", "gre", "ell", "Greek"),
    ("en", "eng", "eng", "English"),
    ("es", "spa", "spa", "Spanish"),
    ("et", "est", "est", "Estonian"),
    ("fi", "fin", "fin", "Finnish"),
    ("fr", "fre", "fra", "French"),
    ("he", "heb", "heb", "Hebrew"),
    ("hi", "hin", "hin", "Hindi"),
    ("hr", "hrv", "hrv", "Croatian"),
    ("hu", "hun", "hun", "Hungarian"),
    ("id", "ind", "ind", "Indonesian"),
    ("is", "ice", "isl", "Icelandic"),
    ("it", "ita", "ita", "Italian"),
    ("ja", "jpn", "jpn", "Japanese"),
    ("ko", "kor", "kor", "Korean"),
    ("lt", "lit", "lit", "Lithuanian"),
    ("lv", "lav", "lav", "Latvian"),
    ("ms", "may", "msa", "Malay"),
    ("nl", "dut", "nld", "Dutch"),
    ("no", "nor", "nor", "Norwegian"),
    ("pl", "pol", "pol", "Polish"),
    ("pt", "por", "por", "Portuguese"),
    ("ro", "rum", "ron", "Romanian"),
    ("ru", "rus", "rus", "Russian"),
    ("sk", "slo", "slk", "Slovak"),
    ("sl", "slv", "slv", "Slovenian"),
    ("sr", "srp", "srp", "Serbian"),
    ("sv", "swe", "swe", "Swedish"),
    ("th", "tha", "tha", "Thai"),
    ("tr", "tur", "tur", "Turkish"),
    ("uk", "ukr", "ukr", "Ukrainian"),
    ("vi", "vie", "vie", "Vietnamese"),
    ("zh", "chi", "zho", "Chinese"),
];

pub const UNDEFINED_CODE: &str = "und";
pub const UNDEFINED_NAME: &str = "Undefined";

/// Normalizes a raw playlist language code.
///
/// `en:us` keeps the part before the colon, a `*` wildcard becomes `und`,
/// and the non-ISO codes some authoring tools emit are remapped.
pub fn normalize_code(raw: &str) -> String {
    let raw = raw.trim();
    let code = if let Some((prefix, _)) = raw.split_once(':') {
        prefix
    } else if raw.contains('*') {
        UNDEFINED_CODE
    } else {
        raw
    };

    REMAP
        .iter()
        .find(|(from, _)| *from == code)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Display name of an already normalized code.
///
/// Empty and undefined codes yield `Undefined`; codes missing from the table
/// fall back to the uppercased code.
pub fn display_name(code: &str) -> String {
    if code.is_empty() || code == "*" || code.eq_ignore_ascii_case(UNDEFINED_CODE) {
        return UNDEFINED_NAME.to_string();
    }

    let lower = code.to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|(one, bib, term, _)| *one == lower || *bib == lower || *term == lower)
        .map(|(_, _, _, name)| (*name).to_string())
        .unwrap_or_else(|| code.to_uppercase())
}

/// Normalized code and display name in one step.
pub fn resolve(raw: &str) -> (String, String) {
    let code = normalize_code(raw);
    let name = display_name(&code);
    (code, name)
}
