use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schemas::feedback::StudentResponse;

/// The four proficiency tiers of the marking rubric, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum RubricLevel {
    Exceeding,
    Accomplished,
    Expected,
    Emerging,
}

impl RubricLevel {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            RubricLevel::Exceeding => "Exceeding",
            RubricLevel::Accomplished => "Accomplished",
            RubricLevel::Expected => "Expected",
            RubricLevel::Emerging => "Emerging",
        }
    }
}

impl fmt::Display for RubricLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trigger phrases per tier, checked top tier first; the first tier with any
/// phrase present in the response text wins. Phrases must stay lowercase —
/// matching lowercases the haystack only.
const RUBRIC: &[(RubricLevel, &[&str])] = &[
    (
        RubricLevel::Exceeding,
        &[
            "proficiently use knowledge",
            "precise quotes",
            "intelligent conclusions",
            "perceptive comments about language",
            "effect on the reader",
        ],
    ),
    (
        RubricLevel::Accomplished,
        &[
            "spot a range of ideas",
            "relevant quotes",
            "intelligent conclusions",
            "examples of language",
            "language tricks",
        ],
    ),
    (
        RubricLevel::Expected,
        &[
            "find and understand main ideas",
            "support comments with good quotes",
            "begin developing comments",
            "describe the effect of word choices",
        ],
    ),
    (
        RubricLevel::Emerging,
        &[
            "find main ideas",
            "simple comments",
            "find quotes to prove ideas",
            "simple comments about language",
        ],
    ),
];

/// Grade a response by substring presence of rubric trigger phrases in the
/// lower-cased concatenation of its three fields. No match grades Emerging.
pub(crate) fn grade(response: &StudentResponse) -> RubricLevel {
    let haystack = format!(
        "{} {} {}",
        response.point.as_deref().unwrap_or(""),
        response.evidence.as_deref().unwrap_or(""),
        response.explanation.as_deref().unwrap_or("")
    )
    .to_lowercase();

    for (level, phrases) in RUBRIC {
        if phrases.iter().any(|phrase| haystack.contains(phrase)) {
            return *level;
        }
    }

    RubricLevel::Emerging
}
