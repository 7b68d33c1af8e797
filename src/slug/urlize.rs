//! Slug text normalization and friendly-path assembly.

use deunicode::{deunicode, deunicode_with_tofu};

use super::SeoSlug;

/// Reversible urlize: strip diacritics, lowercase, collapse non-alphanumeric
/// runs into the separator. Glyphs with no ASCII mapping are dropped.
pub fn urlize(text: &str, sep: char) -> String {
    slug_from_ascii(&deunicode_with_tofu(text, ""), sep)
}

/// Transliterate for locales that need it (e.g. Cyrillic): deunicode keeps
/// digraphs (ж→zh, щ→shch) and marks unmappable glyphs, which then collapse
/// into separators instead of disappearing.
pub fn transliterate(text: &str, sep: char) -> String {
    slug_from_ascii(&deunicode(text), sep)
}

fn slug_from_ascii(ascii: &str, sep: char) -> String {
    let mut out = String::with_capacity(ascii.len());
    let mut pending_sep = false;
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push(sep);
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Language code of a locale tag: `lt_LT` → `lt`.
pub fn lang_from_locale(locale: &str) -> &str {
    locale.split('_').next().unwrap_or(locale)
}

/// Format a locale tag for alternate links: underscore→hyphen, lowercase.
pub fn format_alternate_tag(locale: &str) -> String {
    locale.replace('_', "-").to_lowercase()
}

/// Glue a slug into a friendly path.
///
/// Each segment group is joined with `slug_sep`, urlized (or transliterated
/// for locales whose language code is in `translit_langs`), then groups are
/// joined with `path_sep` under the slug's prefix. Repeated path separators
/// collapse.
pub fn glue_url(slug: &SeoSlug, path_sep: char, slug_sep: char, translit_langs: &[String]) -> String {
    let lang = lang_from_locale(slug.locale()).to_lowercase();
    let needs_translit = translit_langs.iter().any(|l| l.eq_ignore_ascii_case(&lang));

    let sep_str = slug_sep.to_string();
    let segments: Vec<String> = slug
        .parts()
        .iter()
        .map(|group| {
            let joined = group.join(&sep_str);
            let lowered = joined.trim().to_lowercase();
            if needs_translit {
                transliterate(&lowered, slug_sep)
            } else {
                urlize(&lowered, slug_sep)
            }
        })
        .collect();

    let raw = format!(
        "{}{}{}",
        slug.prefix(),
        path_sep,
        segments.join(&path_sep.to_string())
    );
    collapse_separators(&raw, path_sep)
}

fn collapse_separators(uri: &str, path_sep: char) -> String {
    let mut out = String::with_capacity(uri.len());
    let mut last_was_sep = false;
    for ch in uri.chars() {
        if ch == path_sep {
            if !last_was_sep {
                out.push(ch);
            }
            last_was_sep = true;
        } else {
            last_was_sep = false;
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urlize_basic() {
        assert_eq!(urlize("Hello World", '-'), "hello-world");
        assert_eq!(urlize("  spaced  out  ", '-'), "spaced-out");
        assert_eq!(urlize("Email & Tasks", '-'), "email-tasks");
    }

    #[test]
    fn test_urlize_diacritics() {
        assert_eq!(urlize("Prekės žymė", '-'), "prekes-zyme");
        assert_eq!(urlize("àéîõü", '-'), "aeiou");
    }

    #[test]
    fn test_urlize_edge_separators() {
        assert_eq!(urlize("--edge--case--", '-'), "edge-case");
        assert_eq!(urlize("", '-'), "");
    }

    #[test]
    fn test_transliterate_cyrillic() {
        assert_eq!(transliterate("привет мир", '-'), "privet-mir");
        assert_eq!(transliterate("щит и меч", '-'), "shchit-i-mech");
    }

    #[test]
    fn test_lang_from_locale() {
        assert_eq!(lang_from_locale("lt_LT"), "lt");
        assert_eq!(lang_from_locale("ru_RU"), "ru");
        assert_eq!(lang_from_locale("en"), "en");
    }

    #[test]
    fn test_format_alternate_tag() {
        assert_eq!(format_alternate_tag("lt_LT"), "lt-lt");
        assert_eq!(format_alternate_tag("en_US"), "en-us");
    }

    #[test]
    fn test_glue_url() {
        let mut slug = SeoSlug::new("product", "/lt/prod", "lt_LT");
        slug.push_part("Widget Deluxe");
        assert_eq!(glue_url(&slug, '/', '-', &[]), "/lt/prod/widget-deluxe");
    }

    #[test]
    fn test_glue_url_groups() {
        let mut slug = SeoSlug::new("product", "/lt/prod", "lt_LT");
        slug.push_group(vec!["Acme".into(), "Widget".into()]);
        slug.push_part("Blue");
        assert_eq!(glue_url(&slug, '/', '-', &[]), "/lt/prod/acme-widget/blue");
    }

    #[test]
    fn test_glue_url_collapses_path_separators() {
        let mut slug = SeoSlug::new("product", "/lt/prod/", "lt_LT");
        slug.push_part("Widget");
        assert_eq!(glue_url(&slug, '/', '-', &[]), "/lt/prod/widget");
    }

    #[test]
    fn test_glue_url_transliterates_configured_locales() {
        let langs = vec!["ru".to_string()];

        let mut slug = SeoSlug::new("product", "/ru/tovary", "ru_RU");
        slug.push_part("привет мир");
        assert_eq!(glue_url(&slug, '/', '-', &langs), "/ru/tovary/privet-mir");

        // Same text in a non-transliteration locale goes through urlize.
        let mut lt = SeoSlug::new("product", "/lt/prod", "lt_LT");
        lt.push_part("Prekės žymė");
        assert_eq!(glue_url(&lt, '/', '-', &langs), "/lt/prod/prekes-zyme");
    }
}
