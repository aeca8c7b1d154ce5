//! The six fixed yes/no evaluation criteria.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the six yes/no questions every query is rated against.
///
/// The declaration order is the order questions are presented in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Intelligible,
    InfoSeeking,
    Ambiguous,
    TimeSensitive,
    Trending,
    HarmfulIntent,
}

impl Criterion {
    /// All criteria in presentation order.
    pub const ALL: [Criterion; 6] = [
        Criterion::Intelligible,
        Criterion::InfoSeeking,
        Criterion::Ambiguous,
        Criterion::TimeSensitive,
        Criterion::Trending,
        Criterion::HarmfulIntent,
    ];

    /// Number of criteria a complete response must answer.
    pub const COUNT: usize = Self::ALL.len();

    /// Field name used in serialized responses.
    pub fn key(self) -> &'static str {
        match self {
            Criterion::Intelligible => "is_intelligible",
            Criterion::InfoSeeking => "is_info_seeking",
            Criterion::Ambiguous => "is_ambiguous",
            Criterion::TimeSensitive => "is_time_sensitive",
            Criterion::Trending => "is_trending",
            Criterion::HarmfulIntent => "has_harmful_intent",
        }
    }

    /// Short name accepted on the command line.
    pub fn short_name(self) -> &'static str {
        match self {
            Criterion::Intelligible => "intelligible",
            Criterion::InfoSeeking => "info-seeking",
            Criterion::Ambiguous => "ambiguous",
            Criterion::TimeSensitive => "time-sensitive",
            Criterion::Trending => "trending",
            Criterion::HarmfulIntent => "harmful",
        }
    }

    /// 1-based position in presentation order.
    pub fn ordinal(self) -> usize {
        Self::ALL
            .iter()
            .position(|c| *c == self)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    pub fn question(self) -> &'static str {
        match self {
            Criterion::Intelligible => "Is the query intelligible?",
            Criterion::InfoSeeking => "Is the query info-seeking?",
            Criterion::Ambiguous => "Is the query ambiguous?",
            Criterion::TimeSensitive => "Is the query time-sensitive?",
            Criterion::Trending => "Is the query currently trending in the news?",
            Criterion::HarmfulIntent => {
                "Does the query have harmful intent or ask about sensitive topics?"
            }
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Criterion::Intelligible => "Can the query be understood clearly?",
            Criterion::InfoSeeking => "Is the user looking for information?",
            Criterion::Ambiguous => "Does the query have multiple possible interpretations?",
            Criterion::TimeSensitive => "Does the answer depend on current timing?",
            Criterion::Trending => "Is this topic currently popular in news media?",
            Criterion::HarmfulIntent => "Could this query be harmful or inappropriate?",
        }
    }

    /// Label shown next to the "yes" answer.
    pub fn positive_label(self) -> &'static str {
        match self {
            Criterion::Intelligible => "Clear & understandable",
            Criterion::InfoSeeking => "Seeking information",
            Criterion::Ambiguous => "Multiple meanings",
            Criterion::TimeSensitive => "Time-dependent",
            Criterion::Trending => "Currently trending",
            Criterion::HarmfulIntent => "Potentially harmful",
        }
    }

    /// Label shown next to the "no" answer.
    pub fn negative_label(self) -> &'static str {
        match self {
            Criterion::Intelligible => "Unclear or garbled",
            Criterion::InfoSeeking => "Not info-seeking",
            Criterion::Ambiguous => "Clear single meaning",
            Criterion::TimeSensitive => "Time-independent",
            Criterion::Trending => "Not trending",
            Criterion::HarmfulIntent => "Safe content",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace('_', "-");
        if let Ok(n) = needle.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| Self::ALL.get(i).copied())
                .ok_or_else(|| format!("criterion number must be 1-{}, got {n}", Self::COUNT));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.short_name() == needle || c.key().replace('_', "-") == needle)
            .ok_or_else(|| format!("unknown criterion: {s}"))
    }
}

/// Parse a yes/no answer as typed by an annotator.
pub fn parse_answer(s: &str) -> Result<bool, String> {
    match s.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Ok(true),
        "n" | "no" | "false" | "0" => Ok(false),
        other => Err(format!("expected yes or no, got: {other}")),
    }
}
