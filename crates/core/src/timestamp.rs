use bincode::{Decode, Encode};
use lbm_util_array_type::array_type_fixed_size_define;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

array_type_fixed_size_define! {
    /// Microsecond-precision absolute timestamp, UTC
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct Timestamp(u64);
}

const MICROS_PER_SEC: u64 = 1_000_000;

impl Timestamp {
    pub fn now() -> Self {
        Self::from(
            u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1000)
                .unwrap_or_default(),
        )
    }

    pub fn from_unix_secs(secs: u64) -> Self {
        Self::from(secs.saturating_mul(MICROS_PER_SEC))
    }

    pub fn add_secs(self, secs: u64) -> Self {
        self.saturating_add(secs.saturating_mul(MICROS_PER_SEC))
    }

    /// Convert to datetime, if in range
    pub fn to_datetime(self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.to_number()) * 1000).ok()
    }
}

/// RFC 3339 in human readable formats, raw bytes otherwise
impl Serialize for Timestamp {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if s.is_human_readable() {
            let formatted = self
                .to_datetime()
                .and_then(|dt| dt.format(&Rfc3339).ok())
                .ok_or_else(|| serde::ser::Error::custom("Timestamp out of range"))?;
            s.serialize_str(&formatted)
        } else {
            s.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if d.is_human_readable() {
            let s = String::deserialize(d)?;
            let dt = OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)?;
            let micros = u64::try_from(dt.unix_timestamp_nanos() / 1000)
                .map_err(|_| serde::de::Error::custom("Timestamp before unix epoch"))?;
            Ok(Self::from(micros))
        } else {
            let bytes = <serde_bytes::ByteArray<{ Timestamp::LEN }>>::deserialize(d)?;
            Ok(Self(bytes.into_array()))
        }
    }
}
