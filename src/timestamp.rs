use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// The type used for sample and marker timestamps.
///
/// Stored as integer nanoseconds since the profile's reference timestamp.
/// In the profile JSON, timestamps are expressed as float milliseconds, so
/// this type converts on (de)serialization.
#[derive(Debug, Clone, Copy, Default, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Timestamp {
    nanos: u64,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { nanos: 0 };
    pub const MAX: Timestamp = Timestamp { nanos: u64::MAX };

    pub fn from_nanos_since_reference(nanos: u64) -> Self {
        Self { nanos }
    }

    pub fn from_millis_since_reference(millis: f64) -> Self {
        if millis <= 0.0 {
            return Self { nanos: 0 };
        }
        Self {
            nanos: (millis * 1_000_000.0) as u64,
        }
    }

    pub fn as_millis(self) -> f64 {
        (self.nanos as f64) / 1_000_000.0
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_millis())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let millis = f64::deserialize(deserializer)?;
        Ok(Timestamp::from_millis_since_reference(millis))
    }
}
