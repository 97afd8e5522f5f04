// Static lookups from human-readable language names to service codes.

/// Code understood by the translation API for a language name.
/// Unknown names pass through lower-cased.
pub fn translation_code(language: &str) -> String {
    let name = language.trim().to_lowercase();
    let code = match name.as_str() {
        "chinese" | "chinese simplified" => "zh-CN",
        "chinese traditional" => "zh-TW",
        other => match common_code(other) {
            Some(code) => code,
            None => return name,
        },
    };
    code.to_string()
}

/// Code understood by the speech engine, or `default` when the name is unknown
pub fn speech_code(language: &str, default: &str) -> String {
    let name = language.trim().to_lowercase();
    match name.as_str() {
        "chinese" | "chinese simplified" | "chinese traditional" => "zh".to_string(),
        other => common_code(other).unwrap_or(default).to_string(),
    }
}

fn common_code(name: &str) -> Option<&'static str> {
    let code = match name {
        "english" => "en",
        "spanish" => "es",
        "french" => "fr",
        "german" => "de",
        "italian" => "it",
        "portuguese" => "pt",
        "russian" => "ru",
        "japanese" => "ja",
        "korean" => "ko",
        "hindi" => "hi",
        "arabic" => "ar",
        "dutch" => "nl",
        "polish" => "pl",
        "turkish" => "tr",
        "swedish" => "sv",
        "norwegian" => "no",
        "danish" => "da",
        "finnish" => "fi",
        "greek" => "el",
        "hebrew" => "he",
        "thai" => "th",
        "vietnamese" => "vi",
        "indonesian" => "id",
        "malay" => "ms",
        "tagalog" => "tl",
        "urdu" => "ur",
        "bengali" => "bn",
        "tamil" => "ta",
        "telugu" => "te",
        "marathi" => "mr",
        "gujarati" => "gu",
        "kannada" => "kn",
        "malayalam" => "ml",
        "punjabi" => "pa",
        _ => return None,
    };
    Some(code)
}
