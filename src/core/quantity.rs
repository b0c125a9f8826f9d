use serde::{Deserialize, Serialize};

/// Default bounds applied when a stepper's input carries no `min`/`max` of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityBounds {
    #[serde(default = "default_min")]
    pub min: i64,
    /// `None` leaves the stepper unbounded above; written as `"unbounded"` in config files.
    #[serde(default = "default_max", with = "max_bound")]
    pub max: Option<i64>,
}

fn default_min() -> i64 {
    1
}

fn default_max() -> Option<i64> {
    Some(99)
}

mod max_bound {
    use serde::{Deserialize, Deserializer, Serializer};

    const UNBOUNDED: &str = "unbounded";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Limit(i64),
        Keyword(String),
    }

    pub fn serialize<S: Serializer>(max: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match max {
            Some(limit) => serializer.serialize_i64(*limit),
            None => serializer.serialize_str(UNBOUNDED),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Limit(limit) => Ok(Some(limit)),
            Raw::Keyword(word) if word == UNBOUNDED => Ok(None),
            Raw::Keyword(word) => Err(serde::de::Error::custom(format!(
                "expected an integer or \"{}\", got \"{}\"",
                UNBOUNDED, word
            ))),
        }
    }
}

impl Default for QuantityBounds {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
        }
    }
}

impl QuantityBounds {
    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }

    pub fn clamp(&self, value: i64) -> i64 {
        let value = value.max(self.min);
        match self.max {
            Some(max) => value.min(max),
            None => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Increment,
    Decrement,
}

/// A numeric stepper whose value stays within its bounds after every user mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantitySelector {
    value: i64,
    bounds: QuantityBounds,
}

impl QuantitySelector {
    /// Builds a selector from the raw input attributes; missing attributes fall back to `defaults`.
    pub fn from_attributes(
        value: &str,
        min: Option<&str>,
        max: Option<&str>,
        defaults: QuantityBounds,
    ) -> Self {
        let min = min.and_then(parse_leading_int).unwrap_or(defaults.min);
        let max = max
            .and_then(parse_leading_int)
            .filter(|max| *max >= min)
            .or(defaults.max);
        Self::new(parse_quantity(value), QuantityBounds { min, max })
    }

    /// Builds a selector with its value clamped into `bounds`. A `max` below `min` is dropped
    /// in favour of an unbounded maximum.
    pub fn new(value: i64, bounds: QuantityBounds) -> Self {
        let bounds = QuantityBounds {
            min: bounds.min,
            max: bounds.max.filter(|max| *max >= bounds.min),
        };
        Self {
            value: bounds.clamp(value),
            bounds,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn bounds(&self) -> QuantityBounds {
        self.bounds
    }

    /// Applies one step. Returns the new value, or `None` when the step would leave the bounds.
    pub fn step(&mut self, direction: StepDirection) -> Option<i64> {
        let candidate = match direction {
            StepDirection::Increment => self.value.checked_add(1)?,
            StepDirection::Decrement => self.value.checked_sub(1)?,
        };
        if !self.bounds.contains(candidate) {
            return None;
        }
        self.value = candidate;
        Some(candidate)
    }

    pub fn increment(&mut self) -> Option<i64> {
        self.step(StepDirection::Increment)
    }

    pub fn decrement(&mut self) -> Option<i64> {
        self.step(StepDirection::Decrement)
    }

    /// Replaces the value with typed input, clamped into the bounds.
    /// Returns the new value if it differs from the old one.
    pub fn set_typed(&mut self, raw: &str) -> Option<i64> {
        let next = self.bounds.clamp(parse_quantity(raw));
        if next == self.value {
            return None;
        }
        self.value = next;
        Some(next)
    }
}

/// Parses a displayed quantity; anything without a leading integer reads as 1.
pub fn parse_quantity(raw: &str) -> i64 {
    parse_leading_int(raw).unwrap_or(1)
}

/// Lenient integer parse: optional whitespace and sign, then leading digits. `"12abc"` is 12.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(rest.len(), |(i, _)| i);
    if digits_end == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
