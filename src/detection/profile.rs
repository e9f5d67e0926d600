//! Emotion scores for a detected face

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotion labels reported by the detection service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Anger,
    Contempt,
    Disgust,
    Fear,
    Happiness,
    Neutral,
    Sadness,
    Surprise,
}

impl EmotionLabel {
    /// All labels, in the order the service documents them
    pub const ALL: [EmotionLabel; 8] = [
        EmotionLabel::Anger,
        EmotionLabel::Contempt,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happiness,
        EmotionLabel::Neutral,
        EmotionLabel::Sadness,
        EmotionLabel::Surprise,
    ];

    /// Key used for this label in the service response
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Anger => "anger",
            EmotionLabel::Contempt => "contempt",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happiness => "happiness",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Sadness => "sadness",
            EmotionLabel::Surprise => "surprise",
        }
    }

    /// Look up a label by its response key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == key)
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-label scores exactly as returned by the detection service
///
/// Scores are not clamped or normalised and need not sum to 1. Keys the
/// service adds beyond [`EmotionLabel::ALL`] are kept, and labels stay in the
/// order the service sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionProfile {
    scores: IndexMap<String, f64>,
}

impl EmotionProfile {
    /// Build a profile from raw label/score pairs
    pub fn from_scores<I, K>(scores: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            scores: scores.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Score for a known label, if the service reported it
    pub fn score(&self, label: EmotionLabel) -> Option<f64> {
        self.scores.get(label.as_str()).copied()
    }

    /// Score for any reported key
    pub fn get(&self, key: &str) -> Option<f64> {
        self.scores.get(key).copied()
    }

    /// The known label with the highest score
    ///
    /// Ties go to the label listed first in [`EmotionLabel::ALL`].
    pub fn dominant(&self) -> Option<(EmotionLabel, f64)> {
        let mut best: Option<(EmotionLabel, f64)> = None;
        for (key, &score) in &self.scores {
            let Some(label) = EmotionLabel::from_key(key) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((top_label, top)) => score > top || (score == top && label < top_label),
            };
            if better {
                best = Some((label, score));
            }
        }
        best
    }

    /// Iterate over all reported scores in response order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
