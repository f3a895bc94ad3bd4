/*!
 * Language utilities for the language tags carried by bilingual documents.
 *
 * Tags look like `en`, `en-US`, `zh-Hans-CN` or `de_CH`. Only the primary
 * subtag is checked against ISO 639-1 and ISO 639-2; script and region are
 * checked for shape.
 */

use anyhow::{Result, anyhow};
use isolang::Language;
use once_cell::sync::Lazy;
use regex::Regex;

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: [(&str, &str); 18] = [
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

static TAG_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(?P<primary>[A-Za-z]{2,3})(?:[-_](?P<script>[A-Za-z]{4}))?(?:[-_](?P<region>[A-Za-z]{2}|[0-9]{3}))?$").ok()
});

/// A language tag split into its subtags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTag {
    /// Lowercase primary language subtag
    pub primary: String,
    /// Titlecase script subtag
    pub script: Option<String>,
    /// Uppercase region subtag
    pub region: Option<String>,
}

impl LanguageTag {
    /// Canonical hyphenated form
    pub fn to_canonical(&self) -> String {
        let mut tag = self.primary.clone();
        if let Some(script) = &self.script {
            tag.push('-');
            tag.push_str(script);
        }
        if let Some(region) = &self.region {
            tag.push('-');
            tag.push_str(region);
        }
        tag
    }
}

/// Split a tag into subtags without checking the primary code against ISO 639
pub fn parse_language_tag(tag: &str) -> Result<LanguageTag> {
    let pattern = TAG_PATTERN
        .as_ref()
        .ok_or_else(|| anyhow!("Language tag pattern failed to compile"))?;
    let captures = pattern
        .captures(tag.trim())
        .ok_or_else(|| anyhow!("Malformed language tag: {}", tag))?;

    let primary = captures
        .name("primary")
        .map(|m| m.as_str().to_lowercase())
        .ok_or_else(|| anyhow!("Malformed language tag: {}", tag))?;
    let script = captures.name("script").map(|m| {
        let lower = m.as_str().to_lowercase();
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => lower,
        }
    });
    let region = captures.name("region").map(|m| m.as_str().to_uppercase());

    Ok(LanguageTag { primary, script, region })
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if Language::from_639_1(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part1);
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part2T);
        }
        if BIBLIOGRAPHIC_CODES.iter().any(|(b, _)| *b == normalized_code) {
            return Ok(LanguageCodeType::Part2B);
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Validate a full language tag
pub fn validate_language_tag(tag: &str) -> Result<LanguageTag> {
    let parsed = parse_language_tag(tag)?;
    validate_language_code(&parsed.primary).map_err(|_| anyhow!("Unknown language in tag: {}", tag))?;
    Ok(parsed)
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
        if let Some((_, terminology)) = BIBLIOGRAPHIC_CODES.iter().find(|(b, _)| *b == normalized_code) {
            return Ok(terminology.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language tags name the same language, ignoring script and region
pub fn language_codes_match(tag1: &str, tag2: &str) -> bool {
    let primary = |tag: &str| parse_language_tag(tag).and_then(|parsed| normalize_to_part2t(&parsed.primary));

    match (primary(tag1), primary(tag2)) {
        (Ok(first), Ok(second)) => first == second,
        _ => false,
    }
}

/// Get the English language name for a tag
pub fn get_language_name(tag: &str) -> Result<String> {
    let parsed = parse_language_tag(tag)?;
    let normalized = normalize_to_part2t(&parsed.primary)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(match parsed.region {
        Some(region) => format!("{} ({})", lang.to_name(), region),
        None => lang.to_name().to_string(),
    })
}
