use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Priority {
    High => "high",
    Medium => "medium",
    Low => "low",
});

// Where a stored triage score came from.
str_enum!(ScoreSource {
    Rules => "rules",
    Model => "model",
});

/// Score above which a patient is high priority.
pub const HIGH_PRIORITY_THRESHOLD: f64 = 0.8;
/// Score above which (and up to the high threshold) a patient is medium priority.
pub const MEDIUM_PRIORITY_THRESHOLD: f64 = 0.5;

impl Priority {
    /// Band a triage score: high > 0.8, medium in (0.5, 0.8], low <= 0.5.
    ///
    /// NaN falls through to `Low` so every score lands in exactly one band.
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_PRIORITY_THRESHOLD {
            Priority::High
        } else if score > MEDIUM_PRIORITY_THRESHOLD {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Unscored patients are treated as 0.0.
    pub fn from_optional_score(score: Option<f64>) -> Self {
        Self::from_score(score.unwrap_or(0.0))
    }
}
