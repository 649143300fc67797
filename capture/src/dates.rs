//! Serde helpers for calendar dates on the wire (`YYYY-MM-DD`). The
//! server carries a matching `dates` module; the format is shared
//! wire contract and must not drift between the two.

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
