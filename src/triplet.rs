//! Value model for attribute readings.
//!
//! A settled reading is a [`Triplet`]: value, timestamp and [`Quality`] tag.
//! Update functions return an [`Update`], either a bare value (stamped with
//! the current time and `Quality::Valid`) or an explicit triplet overriding
//! timestamp and quality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dynamic attribute payload.
///
/// Attributes carry JSON values so that a single graph can mix scalars,
/// strings and structured readings without a type parameter per node.
pub type Value = serde_json::Value;

/// Boxed error returned by update functions and value converters.
pub type UpdateError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Confidence/state tag accompanying an attribute value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    /// The value is a trustworthy reading.
    #[default]
    Valid,
    /// The value could not be trusted when it was produced.
    Invalid,
    /// The value is valid but outside its warning thresholds.
    Warning,
    /// The value is valid but outside its alarm thresholds.
    Alarm,
    /// The value is in transition towards a setpoint.
    Changing,
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Quality::Valid => "VALID",
            Quality::Invalid => "INVALID",
            Quality::Warning => "WARNING",
            Quality::Alarm => "ALARM",
            Quality::Changing => "CHANGING",
        };
        write!(f, "{s}")
    }
}

/// Immutable (value, timestamp, quality) reading.
///
/// # Examples
///
/// ```
/// use attrgraph::triplet::{Quality, Triplet};
/// use serde_json::json;
///
/// let t = Triplet::now(json!(21.0));
/// assert_eq!(t.quality, Quality::Valid);
/// assert_eq!(t.as_f64(), Some(21.0));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triplet {
    pub value: Value,
    pub timestamp: DateTime<Utc>,
    pub quality: Quality,
}

impl Triplet {
    /// Create a triplet with an explicit timestamp and quality.
    pub fn new(value: Value, timestamp: DateTime<Utc>, quality: Quality) -> Self {
        Self {
            value,
            timestamp,
            quality,
        }
    }

    /// Create a `Quality::Valid` triplet stamped with the current time.
    pub fn now(value: Value) -> Self {
        Self::new(value, Utc::now(), Quality::Valid)
    }

    /// Numeric view of the value, if it is a JSON number.
    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }
}

/// Outcome of an update function.
///
/// Returning `Value` lets the engine stamp the reading (now, `Valid`);
/// returning `Triplet` overrides timestamp and quality explicitly.
#[derive(Clone, Debug)]
pub enum Update {
    Value(Value),
    Triplet(Triplet),
}

impl Update {
    pub(crate) fn into_triplet(self) -> Triplet {
        match self {
            Update::Value(value) => Triplet::now(value),
            Update::Triplet(triplet) => triplet,
        }
    }
}

impl From<Value> for Update {
    fn from(value: Value) -> Self {
        Update::Value(value)
    }
}

impl From<Triplet> for Update {
    fn from(triplet: Triplet) -> Self {
        Update::Triplet(triplet)
    }
}
