use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Deserialize an RFC 3339 formatted string into an OffsetDateTime
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

/// Timestamps as the AI service reports them: either RFC 3339 text or
/// (fractional) seconds since the Unix epoch.
pub mod flexible {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Seconds(f64),
        Text(String),
    }

    /// Deserialize an RFC 3339 string or epoch seconds into an OffsetDateTime.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Seconds(secs) => from_epoch_seconds(secs).map_err(serde::de::Error::custom),
            RawTimestamp::Text(s) => match s.parse::<f64>() {
                Ok(secs) => from_epoch_seconds(secs).map_err(serde::de::Error::custom),
                Err(_) => OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom),
            },
        }
    }

    /// Serialize an OffsetDateTime into an RFC 3339 formatted string
    pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        super::serialize(datetime, serializer)
    }

    fn from_epoch_seconds(secs: f64) -> Result<OffsetDateTime, time::error::ComponentRange> {
        let nanos = (secs * 1_000_000_000.0) as i128;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
    }

}
