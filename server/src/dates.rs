//! Serde helpers: calendar dates as `YYYY-MM-DD`, timestamps as
//! RFC 3339. The capture crate carries a matching `dates` module;
//! the `YYYY-MM-DD` form is shared wire contract and must not drift
//! between the two.

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

pub mod iso_date {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::ISO_DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(ISO_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;

        Date::parse(&raw, ISO_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

pub mod iso_date_option {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::ISO_DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&date.format(ISO_DATE_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;

        match raw {
            Some(raw) => Date::parse(&raw, ISO_DATE_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

pub mod rfc3339 {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use time::{Format, OffsetDateTime};

    pub fn serialize<S: Serializer>(
        timestamp: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&timestamp.format(Format::Rfc3339))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;

        OffsetDateTime::parse(&raw, Format::Rfc3339).map_err(serde::de::Error::custom)
    }
}
