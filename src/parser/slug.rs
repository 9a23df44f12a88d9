//! URL slugs for surf spots

use regex::Regex;
use std::sync::LazyLock;

use crate::utils::error::ParseError;

static NON_ALNUM_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Build a URL-safe slug from a spot name
///
/// `"Jug Handle State Beach"` becomes `"jug-handle-state-beach"`. Accented
/// Latin letters are folded to ASCII before non-alphanumeric runs collapse
/// into single hyphens.
pub fn slugify(name: &str) -> Result<String, ParseError> {
    let folded: String = name.chars().map(fold_char).collect::<String>().to_lowercase();
    let slug = NON_ALNUM_REGEX
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string();

    if slug.is_empty() {
        return Err(ParseError::EmptySlug(name.to_string()));
    }
    Ok(slug)
}

/// First candidate not rejected by `taken`: `base`, `base-1`, `base-2`, ...
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut counter = 1u32;
    loop {
        let candidate = format!("{base}-{counter}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' => 'A',
        'ç' | 'ć' | 'č' => 'c',
        'Ç' | 'Ć' | 'Č' => 'C',
        'è' | 'é' | 'ê' | 'ë' | 'ē' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' => 'E',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' => 'O',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        other => other,
    }
}
