//! Ranked voice selection
//!
//! Platforms ship wildly different voice catalogs, so selection is
//! data-driven: a ranked preference list scored against whatever catalog the
//! backend reports. Exact name beats substring beats a generic label match;
//! no match at all falls back to the platform default voice.

use serde::{Deserialize, Serialize};

/// One entry in a platform voice catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    /// BCP-47 tag, e.g. "en-US"
    pub lang: String,
}

impl VoiceInfo {
    /// Create a catalog entry
    #[must_use]
    pub fn new(name: &str, lang: &str) -> Self {
        Self {
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }
}

/// Ranked voice preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoicePreferences {
    /// Names tried in order, exact match first then substring
    pub preferred_names: Vec<String>,
    /// Last-resort label looked for anywhere in a voice name
    pub fallback_label: String,
}

impl Default for VoicePreferences {
    fn default() -> Self {
        Self {
            preferred_names: [
                "Samantha",
                "Karen",
                "Victoria",
                "Moira",
                "Tessa",
                "Google UK English Female",
                "Microsoft Zira",
                "Microsoft Jenny",
                "Google US English",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            fallback_label: "female".to_string(),
        }
    }
}

/// Pick the best voice for a language from a catalog
///
/// The catalog is narrowed to voices whose language shares the requested
/// prefix ("en" for "en-US"); if none match, the whole catalog is the pool.
/// Returns `None` when nothing scores, meaning the platform default voice.
#[must_use]
pub fn select_voice(
    catalog: &[VoiceInfo],
    lang: &str,
    prefs: &VoicePreferences,
) -> Option<VoiceInfo> {
    if catalog.is_empty() {
        return None;
    }

    let prefix = lang
        .split('-')
        .next()
        .unwrap_or(lang)
        .to_lowercase();
    let lang_pool: Vec<&VoiceInfo> = catalog
        .iter()
        .filter(|v| v.lang.to_lowercase().starts_with(&prefix))
        .collect();
    let pool: Vec<&VoiceInfo> = if lang_pool.is_empty() {
        catalog.iter().collect()
    } else {
        lang_pool
    };

    for name in &prefs.preferred_names {
        if let Some(voice) = pool.iter().find(|v| &v.name == name) {
            return Some((*voice).clone());
        }
    }

    for name in &prefs.preferred_names {
        if let Some(voice) = pool.iter().find(|v| v.name.contains(name.as_str())) {
            return Some((*voice).clone());
        }
    }

    let label = prefs.fallback_label.to_lowercase();
    pool.iter()
        .find(|v| v.name.to_lowercase().contains(&label))
        .map(|v| (*v).clone())
}
