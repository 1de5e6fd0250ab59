//! Transcript parsing into structured financial intents
//!
//! [`IntentParser::parse`] is a pure function over one utterance transcript.
//! The grammar is a configurable table rather than a fixed rule set; the
//! defaults cover the "<verb> <amount> to <recipient>" pattern.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::contacts;

/// Action extracted from an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentAction {
    /// A money transfer request
    Send,
    /// The transcript did not parse into a command
    Unknown,
}

/// Parser confidence in the extracted intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Clean match of the expected pattern
    High,
    /// Spoken-number amount or extra tokens had to be skipped
    Low,
}

/// Structured action/amount/recipient extracted from one transcript
///
/// Immutable once created; recipient resolution produces a new value via
/// [`with_resolved_phone`](Self::with_resolved_phone).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIntent {
    pub action: IntentAction,
    pub amount: Option<Decimal>,
    pub recipient_token: String,
    pub resolved_phone: Option<String>,
    pub confidence: Confidence,
    /// Human-readable reason when `action` is [`IntentAction::Unknown`]
    pub failure_reason: Option<String>,
}

impl ParsedIntent {
    fn unknown(reason: &str) -> Self {
        Self {
            action: IntentAction::Unknown,
            amount: None,
            recipient_token: String::new(),
            resolved_phone: None,
            confidence: Confidence::Low,
            failure_reason: Some(reason.to_string()),
        }
    }

    /// Whether the intent is complete enough to confirm
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.action != IntentAction::Unknown
    }

    /// Copy of this intent with the recipient's phone filled in
    #[must_use]
    pub fn with_resolved_phone(mut self, phone: String) -> Self {
        self.resolved_phone = Some(phone);
        self
    }
}

/// Configurable word tables driving the parser
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentGrammar {
    /// Action verbs that open a transfer command
    pub verbs: Vec<String>,
    /// Currency words allowed after the amount ("500 shillings")
    pub currency_words: Vec<String>,
    /// Words introducing the recipient
    pub recipient_markers: Vec<String>,
    /// Politeness words skipped anywhere
    pub filler_words: Vec<String>,
    /// Spoken number units ("five" -> 5)
    pub number_words: HashMap<String, u64>,
    /// Spoken number multipliers ("hundred" -> 100)
    pub number_multipliers: HashMap<String, u64>,
}

impl Default for IntentGrammar {
    fn default() -> Self {
        let number_words = [
            ("one", 1),
            ("two", 2),
            ("three", 3),
            ("four", 4),
            ("five", 5),
            ("six", 6),
            ("seven", 7),
            ("eight", 8),
            ("nine", 9),
            ("ten", 10),
            ("eleven", 11),
            ("twelve", 12),
            ("thirteen", 13),
            ("fourteen", 14),
            ("fifteen", 15),
            ("sixteen", 16),
            ("seventeen", 17),
            ("eighteen", 18),
            ("nineteen", 19),
            ("twenty", 20),
            ("thirty", 30),
            ("forty", 40),
            ("fifty", 50),
            ("sixty", 60),
            ("seventy", 70),
            ("eighty", 80),
            ("ninety", 90),
        ]
        .into_iter()
        .map(|(w, v)| (w.to_string(), v))
        .collect();

        let number_multipliers = [("hundred", 100), ("thousand", 1000), ("k", 1000)]
            .into_iter()
            .map(|(w, v)| (w.to_string(), v))
            .collect();

        Self {
            verbs: vec!["send".to_string()],
            currency_words: ["shilling", "shillings", "bob", "ksh", "kes"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            recipient_markers: vec!["to".to_string()],
            filler_words: ["please", "kindly"].iter().map(ToString::to_string).collect(),
            number_words,
            number_multipliers,
        }
    }
}

impl IntentGrammar {
    fn is_verb(&self, word: &str) -> bool {
        self.verbs.iter().any(|v| v == word)
    }

    fn is_currency(&self, word: &str) -> bool {
        self.currency_words.iter().any(|c| c == word)
    }

    fn is_marker(&self, word: &str) -> bool {
        self.recipient_markers.iter().any(|m| m == word)
    }

    fn is_filler(&self, word: &str) -> bool {
        self.filler_words.iter().any(|f| f == word)
    }
}

/// Parses one transcript into a [`ParsedIntent`]
///
/// Deterministic and case-insensitive; never fails, an unparseable
/// transcript yields [`IntentAction::Unknown`] with a failure reason.
#[derive(Debug, Clone, Default)]
pub struct IntentParser {
    grammar: IntentGrammar,
}

impl IntentParser {
    /// Create a parser over a grammar table
    #[must_use]
    pub const fn new(grammar: IntentGrammar) -> Self {
        Self { grammar }
    }

    /// Parse a transcript
    #[must_use]
    pub fn parse(&self, transcript: &str) -> ParsedIntent {
        // Keep original casing for the recipient, fold a copy for matching
        let raw: Vec<String> = transcript
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| matches!(c, '.' | ',' | '?' | '!'))
                    .to_string()
            })
            .filter(|w| !w.is_empty())
            .collect();
        let folded: Vec<String> = raw.iter().map(|w| w.to_lowercase()).collect();

        if folded.is_empty() {
            return ParsedIntent::unknown("I didn't hear anything");
        }

        let mut low_confidence = false;

        // Action verb: first occurrence anywhere; leading non-filler tokens
        // lower confidence but don't fail the parse
        let Some(verb_idx) = folded.iter().position(|w| self.grammar.is_verb(w)) else {
            return ParsedIntent::unknown("I didn't hear an action word like \"send\"");
        };
        if folded[..verb_idx].iter().any(|w| !self.grammar.is_filler(w)) {
            low_confidence = true;
        }

        // Amount: digits first, spoken numbers second
        let mut idx = verb_idx + 1;
        while idx < folded.len() && self.grammar.is_filler(&folded[idx]) {
            idx += 1;
        }

        let (amount, consumed, spoken) = match parse_amount(&self.grammar, &folded[idx..]) {
            Some(parsed) => parsed,
            None => return ParsedIntent::unknown("I didn't catch the amount to send"),
        };
        if spoken {
            low_confidence = true;
        }
        idx += consumed;

        // Optional currency words after the amount
        while idx < folded.len() && self.grammar.is_currency(&folded[idx]) {
            idx += 1;
        }

        // Recipient marker
        let Some(marker_offset) = folded[idx..].iter().position(|w| self.grammar.is_marker(w))
        else {
            return ParsedIntent::unknown("say \"to\" followed by the recipient");
        };
        if folded[idx..idx + marker_offset]
            .iter()
            .any(|w| !self.grammar.is_filler(w))
        {
            low_confidence = true;
        }
        idx += marker_offset + 1;

        // Everything after the marker is the recipient, original casing
        let recipient_token = raw[idx.min(raw.len())..].join(" ");
        if recipient_token.is_empty() {
            return ParsedIntent::unknown("I didn't catch who to send to");
        }

        // Phone-shaped recipients need no contact lookup
        let resolved_phone = contacts::is_phone_shaped(&recipient_token)
            .then(|| recipient_token.clone());

        ParsedIntent {
            action: IntentAction::Send,
            amount: Some(amount),
            recipient_token,
            resolved_phone,
            confidence: if low_confidence {
                Confidence::Low
            } else {
                Confidence::High
            },
            failure_reason: None,
        }
    }
}

/// Parse an amount starting at the head of `words`
///
/// Returns `(amount, words consumed, was spoken-number)`.
fn parse_amount(grammar: &IntentGrammar, words: &[String]) -> Option<(Decimal, usize, bool)> {
    let first = words.first()?;

    // Digit form, tolerating thousands separators: "500", "1,500", "500.50"
    let cleaned = first.replace(',', "");
    if cleaned.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        if let Ok(amount) = cleaned.parse::<Decimal>() {
            return Some((amount, 1, false));
        }
        return None;
    }

    parse_spoken_number(grammar, words).map(|(value, consumed)| {
        (Decimal::from(value), consumed, true)
    })
}

/// Parse a spoken-number word sequence ("five hundred", "two thousand five")
fn parse_spoken_number(grammar: &IntentGrammar, words: &[String]) -> Option<(u64, usize)> {
    let mut total: u64 = 0;
    let mut current: u64 = 0;
    let mut consumed = 0;
    let mut matched = false;

    for word in words {
        if let Some(&value) = grammar.number_words.get(word) {
            current += value;
            matched = true;
        } else if let Some(&mult) = grammar.number_multipliers.get(word) {
            if current == 0 {
                current = 1;
            }
            current *= mult;
            if mult >= 1000 {
                total += current;
                current = 0;
            }
            matched = true;
        } else if word == "and" && matched {
            // "two thousand and fifty"
        } else {
            break;
        }
        consumed += 1;
    }

    matched.then_some((total + current, consumed))
}
