//! Slug generation
//!
//! Slugs are lowercase ASCII with single dashes. Polish and common Latin
//! diacritics are transliterated; any other character becomes a separator.
//! Uniqueness is resolved by the caller with [`with_suffix`].

use crate::config::SLUG_MAX_LENGTH;

/// Used when a name has no sluggable characters at all
const FALLBACK: &str = "item";

fn transliterate(c: char) -> Option<&'static str> {
    let mapped = match c {
        'ą' | 'Ą' | 'á' | 'Á' | 'à' | 'À' | 'â' | 'Â' | 'ä' | 'Ä' => "a",
        'ć' | 'Ć' | 'č' | 'Č' | 'ç' | 'Ç' => "c",
        'ę' | 'Ę' | 'é' | 'É' | 'è' | 'È' | 'ě' | 'Ě' | 'ë' | 'Ë' => "e",
        'í' | 'Í' | 'ï' | 'Ï' => "i",
        'ł' | 'Ł' => "l",
        'ń' | 'Ń' | 'ñ' | 'Ñ' => "n",
        'ó' | 'Ó' | 'ö' | 'Ö' | 'ô' | 'Ô' => "o",
        'ś' | 'Ś' | 'š' | 'Š' => "s",
        'ß' => "ss",
        'ú' | 'Ú' | 'ü' | 'Ü' | 'ů' | 'Ů' => "u",
        'ź' | 'Ź' | 'ż' | 'Ż' | 'ž' | 'Ž' => "z",
        _ => return None,
    };
    Some(mapped)
}

/// Derive the base slug for `name`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        let piece = if c.is_ascii_alphanumeric() {
            Some(c.to_ascii_lowercase().to_string())
        } else {
            transliterate(c).map(str::to_string)
        };

        match piece {
            Some(piece) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push_str(&piece);
            }
            None => pending_dash = true,
        }
    }

    if slug.len() > SLUG_MAX_LENGTH {
        slug.truncate(SLUG_MAX_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        FALLBACK.to_string()
    } else {
        slug
    }
}

/// Lowercase form of a name used for case-insensitive lookups.
///
/// Full Unicode folding, unlike SQLite's ASCII-only `LIKE` and `lower()`.
pub fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

/// The `attempt`-th candidate for `base`: `base`, `base-2`, `base-3`, ...
pub fn with_suffix(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}
