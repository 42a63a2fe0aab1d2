pub const NAME_PREFIXES: [&str; 9] = ["tb_", "co_", "nu_", "cd_", "ds_", "fk_", "pk_", "tp_", "sg_"];

/// Lower-cases, folds Latin accents to ASCII and keeps only `[a-z0-9_]`.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == '_')
        .collect()
}

/// Strips at most one known prefix, then splits on `_` and normalizes each
/// part. Returns the space-joined form and the tokens.
pub fn normalize_name(name: &str) -> (String, Vec<String>) {
    let lowered = name.to_lowercase();
    let rest = NAME_PREFIXES
        .iter()
        .find(|prefix| lowered.starts_with(*prefix))
        .and_then(|prefix| name.get(prefix.len()..))
        .unwrap_or(name);

    let tokens = rest
        .split('_')
        .map(normalize_text)
        .filter(|token| !token.is_empty())
        .collect::<Vec<String>>();

    (tokens.join(" "), tokens)
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
