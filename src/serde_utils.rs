//! Shared serialization helpers.

/// Serializes a score vector with the must-explore sentinel (`+inf`) as `null`,
/// which JSON cannot carry as a number, and reads `null` back as `+inf`.
pub mod ucb_scores {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(values: &[f64], s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded: Vec<Option<f64>> = values
            .iter()
            .map(|&v| if v.is_finite() { Some(v) } else { None })
            .collect();
        encoded.serialize(s)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = Vec::<Option<f64>>::deserialize(d)?;
        Ok(encoded
            .into_iter()
            .map(|v| v.unwrap_or(f64::INFINITY))
            .collect())
    }
}

/// A statistic that may be `+inf` or `-inf`, written as the string `"inf"` / `"-inf"`
pub mod unbounded_f64 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Encoded {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S>(value: &f64, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            s.serialize_f64(*value)
        } else if *value > 0.0 {
            s.serialize_str("inf")
        } else {
            s.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Encoded::deserialize(d)? {
            Encoded::Number(v) => Ok(v),
            Encoded::Text(text) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("unexpected statistic {:?}", other))),
            },
        }
    }
}
