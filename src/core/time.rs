//! Timestamp helpers for the persisted map.
//!
//! Timestamps are RFC 3339 UTC. Earlier builds of this tool appended a
//! literal "Z" to an already offset-bearing string, producing values like
//! "2025-01-01T00:00:00+00:00Z"; the deserializer accepts that legacy
//! form so old maps stay readable. We only ever write the proper form.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Current UTC time, truncated to whole seconds.
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}

/// Parse RFC 3339, tolerating the legacy doubled-suffix form.
pub(crate) fn parse_compat(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(dt) => Ok(dt),
        Err(e) => {
            if let Some(stripped) = raw.strip_suffix('Z')
                && stripped.ends_with("+00:00")
            {
                return OffsetDateTime::parse(stripped, &Rfc3339);
            }
            Err(e)
        }
    }
}

/// Serde codec for identity timestamps: strict RFC 3339 out, compat in.
pub(crate) mod rfc3339_compat {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(dt: &OffsetDateTime, ser: S) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::serialize(dt, ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(de)?;
        super::parse_compat(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn now_utc_has_second_precision() {
        assert_eq!(now_utc().nanosecond(), 0);
    }

    #[test]
    fn parse_compat_accepts_rfc3339() {
        assert_eq!(
            parse_compat("2025-01-01T00:00:00Z").unwrap(),
            datetime!(2025-01-01 00:00:00 UTC)
        );
        assert_eq!(
            parse_compat("2025-01-01T00:00:00+00:00").unwrap(),
            datetime!(2025-01-01 00:00:00 UTC)
        );
    }

    #[test]
    fn parse_compat_accepts_legacy_double_suffix() {
        assert_eq!(
            parse_compat("2025-01-01T00:00:00.123456+00:00Z").unwrap(),
            datetime!(2025-01-01 00:00:00.123456 UTC)
        );
    }

    #[test]
    fn parse_compat_rejects_garbage() {
        assert!(parse_compat("not a time").is_err());
        assert!(parse_compat("2025-01-01T00:00:00ZZ").is_err());
    }
}
