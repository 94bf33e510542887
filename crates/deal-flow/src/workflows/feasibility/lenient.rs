//! Parse-or-default helpers applied where analyst input enters the engine.
//!
//! Form values arrive as JSON numbers, free text typed by an analyst, or not at all. Everything
//! is normalized here so the calculator only ever sees finite `f64`s.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl RawNumber {
    fn into_value(self) -> Option<f64> {
        match self {
            RawNumber::Number(value) => Some(value).filter(|value| value.is_finite()),
            RawNumber::Text(raw) => parse_number(&raw),
            RawNumber::Other(_) => None,
        }
    }
}

/// Parses `1234.56`, `1234,56`, `1.234,56`, `100.000` and `R$ 1.234,56`; anything else
/// yields `None`.
///
/// A dot is a thousands separator when every group after it has exactly three digits
/// (`100.000`, `1.250.000`), otherwise it is the decimal point (`3.5`, `0.125`).
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.contains('.'), cleaned.contains(',')) {
        (true, true) => cleaned.replace('.', "").replace(',', "."),
        (false, true) => cleaned.replace(',', "."),
        (true, false) if is_thousands_grouped(&cleaned) => cleaned.replace('.', ""),
        _ => cleaned,
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn is_thousands_grouped(number: &str) -> bool {
    let digits = number.strip_prefix('-').unwrap_or(number);
    let mut groups = digits.split('.');
    let leading = match groups.next() {
        Some(group) => group,
        None => return false,
    };
    let leading_ok = (1..=3).contains(&leading.len())
        && !leading.starts_with('0')
        && leading.bytes().all(|byte| byte.is_ascii_digit());

    let mut trailing = 0;
    let trailing_ok = groups.all(|group| {
        trailing += 1;
        group.len() == 3 && group.bytes().all(|byte| byte.is_ascii_digit())
    });

    leading_ok && trailing_ok && trailing > 0
}

/// Currency or percent amount; unusable input becomes 0.
pub fn parse_amount(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw.and_then(RawNumber::into_value).unwrap_or(0.0))
}

pub(crate) fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw.and_then(RawNumber::into_value))
}

/// Month counts; zero, negative and unusable input all mean "unset".
pub(crate) fn deserialize_optional_months<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw.and_then(RawNumber::into_value).and_then(months_from))
}

pub(crate) fn months_from(value: f64) -> Option<u32> {
    let whole = value.trunc();
    if whole >= 1.0 && whole <= u32::MAX as f64 {
        Some(whole as u32)
    } else {
        None
    }
}

/// Enum labels and nested values; anything that does not fit becomes `T::default()`.
pub(crate) fn deserialize_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

/// Lists keep the entries that parse and drop the rest; a non-list becomes empty.
pub(crate) fn deserialize_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Checkbox-like answers: booleans, `"true"`/`"sim"`/`"1"`, or a non-zero number.
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        Value::String(text) => matches!(
            text.trim().to_lowercase().as_str(),
            "true" | "sim" | "s" | "yes" | "y" | "1"
        ),
        _ => false,
    })
}

pub(crate) fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_from(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Blank text counts as missing.
pub(crate) fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_from(Value::deserialize(deserializer)?).filter(|text| !text.trim().is_empty()))
}

fn text_from(raw: Value) -> Option<String> {
    match raw {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<chrono::NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(raw) => parse_date(&raw),
        _ => None,
    })
}

/// Accepts ISO `2024-03-15` and Brazilian `15/03/2024` dates.
pub fn parse_date(raw: &str) -> Option<chrono::NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| chrono::NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}
