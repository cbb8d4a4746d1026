// ABOUTME: Custom serde deserializers for config values.
// ABOUTME: Accepts the quoted strings older versions wrote for booleans and numbers.

use serde::Deserialize;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolEntry {
    Bool(bool),
    Number(u8),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberEntry<T> {
    Number(T),
    Text(String),
}

pub fn deserialize_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match BoolEntry::deserialize(deserializer)? {
        BoolEntry::Bool(b) => Ok(b),
        BoolEntry::Number(n) => super::parse_bool(&n.to_string()).map_err(serde::de::Error::custom),
        BoolEntry::Text(s) => super::parse_bool(&s).map_err(serde::de::Error::custom),
    }
}

pub fn deserialize_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: std::fmt::Display,
{
    match NumberEntry::<T>::deserialize(deserializer)? {
        NumberEntry::Number(n) => Ok(n),
        NumberEntry::Text(s) => s.trim().parse().map_err(|e| {
            serde::de::Error::custom(format!("expected a non-negative integer, got '{s}': {e}"))
        }),
    }
}
