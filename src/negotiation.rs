//! RFC 7231-style media type negotiation.
//!
//! [`find_matching_type`] runs an ordered chain of match strategies, most
//! exact first. The chain is shared by the consumes/produces validators and
//! by body-schema selection, so all content-type decisions in a run agree
//! with each other.

/// A single media range from an `Accept` header, with its quality value.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub media_type: String,
    pub quality: f32,
}

/// Match `actual` against a list of acceptable media type patterns.
///
/// Strategies are tried in order until one produces a match:
/// 1. exact match (case and whitespace insensitive)
/// 2. match ignoring `;parameter` sections
/// 3. match ignoring `+suffix` vendor extensions in the subtype
/// 4. wildcard subtype (`type/*`) on either side
/// 5. full wildcard (`*/*`) on either side
/// 6. legacy fallback: `application/json` anywhere in `available` matches
///
/// Returns the matching entry from `available`.
pub fn find_matching_type<'a>(actual: &str, available: &'a [String]) -> Option<&'a str> {
    let actual = normalize(actual);
    if actual.is_empty() {
        return None;
    }

    type Strategy = fn(&str, &str) -> bool;
    const STRATEGIES: &[Strategy] = &[
        match_exact,
        match_ignoring_parameters,
        match_ignoring_suffix,
        match_wildcard_subtype,
        match_full_wildcard,
    ];

    for strategy in STRATEGIES {
        if let Some(found) = available
            .iter()
            .find(|candidate| strategy(&actual, &normalize(candidate)))
        {
            return Some(found.as_str());
        }
    }

    // Legacy behaviour: a spec that can produce or consume json is assumed
    // compatible with any mock media type.
    available
        .iter()
        .find(|candidate| strip_parameters(&normalize(candidate)) == "application/json")
        .map(|found| found.as_str())
}

/// Match an `Accept` header against a list of produced media types.
///
/// Media ranges are tried highest quality first (ties keep header order);
/// each range runs through the full [`find_matching_type`] chain.
pub fn negotiate_accept<'a>(accept: &str, available: &'a [String]) -> Option<&'a str> {
    parse_accept(accept)
        .iter()
        .find_map(|range| find_matching_type(&range.media_type, available))
}

/// Split an `Accept` header into media ranges ordered by descending quality.
///
/// Quality values affect preference order only; an unparseable `q` defaults
/// to 1.0. The sort is stable so equal qualities preserve header order.
pub fn parse_accept(accept: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = accept
        .split(',')
        .map(str::trim)
        .filter(|range| !range.is_empty())
        .map(|range| {
            let quality = range
                .split(';')
                .skip(1)
                .map(str::trim)
                .find_map(|param| param.strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            MediaRange {
                media_type: range.to_string(),
                quality,
            }
        })
        .collect();

    ranges.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranges
}

fn normalize(media_type: &str) -> String {
    media_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn strip_parameters(media_type: &str) -> &str {
    media_type.split(';').next().unwrap_or(media_type)
}

/// Reduce a subtype to its `+suffix` when one is present, so
/// `application/vnd.api+json` compares as `application/json`.
fn strip_suffix(media_type: &str) -> String {
    let media_type = strip_parameters(media_type);
    match media_type.split_once('/') {
        Some((main, subtype)) => {
            let subtype = subtype.rsplit('+').next().unwrap_or(subtype);
            format!("{main}/{subtype}")
        }
        None => media_type.to_string(),
    }
}

fn match_exact(actual: &str, available: &str) -> bool {
    actual == available
}

fn match_ignoring_parameters(actual: &str, available: &str) -> bool {
    strip_parameters(actual) == strip_parameters(available)
}

fn match_ignoring_suffix(actual: &str, available: &str) -> bool {
    strip_suffix(actual) == strip_suffix(available)
}

fn match_wildcard_subtype(actual: &str, available: &str) -> bool {
    let (Some((actual_main, actual_sub)), Some((available_main, available_sub))) = (
        strip_parameters(actual).split_once('/'),
        strip_parameters(available).split_once('/'),
    ) else {
        return false;
    };
    actual_main == available_main && (actual_sub == "*" || available_sub == "*")
}

fn match_full_wildcard(actual: &str, available: &str) -> bool {
    strip_parameters(actual) == "*/*" || strip_parameters(available) == "*/*"
}
