use chrono::{Duration as ChronoDur, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::de::{self, IntoDeserializer, Unexpected, Visitor};
use std::fmt::{self, Display};
use std::marker::PhantomData;

/* ───────────────────── Excel date-serial utilities ───────────────────
Excel's serial date system:
  Serial 1  = 1900-01-01
  Serial 59 = 1900-02-28
  Serial 60 = 1900-02-29  (phantom – doesn't exist, but Excel thinks it does)
  Serial 61 = 1900-03-01
Base date = 1899-12-31 so that serial 1 = base + 1 day = 1900-01-01.
Time is stored as fractional days (no timezone).
------------------------------------------------------------------- */

/// Base date for the 1900 date system. Serial 1 = base + 1 day = 1900-01-01.
const EXCEL_EPOCH: NaiveDate = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
const PHANTOM_LEAP_DAY: NaiveDate = NaiveDate::from_ymd_opt(1900, 2, 28).unwrap();

/// Convert an Excel 1900-system serial into a date-time. Returns `None` when
/// the serial falls outside the range chrono can represent.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    // Round once on the whole serial so a fraction that rounds up to
    // midnight carries into the next day.
    let total_secs = (serial * 86_400.0).round() as i64;
    let days = total_secs.div_euclid(86_400);
    let secs = total_secs.rem_euclid(86_400);

    // Serial 60 is phantom 1900-02-29; map to 1900-02-28
    let date = if days == 60 {
        PHANTOM_LEAP_DAY
    } else {
        // serial < 60: offset = serial (no phantom day yet)
        // serial > 60: offset = serial - 1 (skip phantom day)
        let offset = if days < 60 { days } else { days - 1 };
        EXCEL_EPOCH.checked_add_signed(ChronoDur::try_days(offset)?)?
    };

    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs as u32, 0)?;
    Some(date.and_time(time))
}

/// A leaf value read out of a structured data file: a spreadsheet cell, a
/// CSV field or a scalar JSON member.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Empty => Ok(()),
            DataValue::Text(s) => write!(f, "{s}"),
            DataValue::Int(i) => write!(f, "{i}"),
            DataValue::Number(n) => write!(f, "{n}"),
            DataValue::Boolean(b) => write!(f, "{b}"),
            DataValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DataValue::DateTime(dt) => {
                if dt.nanosecond() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f"))
                }
            }
        }
    }
}

impl DataValue {
    /// Build the appropriate `DataValue` from an Excel serial number: a
    /// `Date` when the serial has no time component, a `DateTime` otherwise.
    /// Serials outside chrono's range stay numeric.
    pub fn from_serial_number(serial: f64) -> Self {
        match serial_to_datetime(serial) {
            Some(dt) if dt.time() == NaiveTime::MIN => DataValue::Date(dt.date()),
            Some(dt) => DataValue::DateTime(dt),
            None => DataValue::Number(serial),
        }
    }

    /// Convert a scalar JSON value. Arrays and objects have no leaf form.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(DataValue::Empty),
            serde_json::Value::Bool(b) => Some(DataValue::Boolean(*b)),
            serde_json::Value::Number(n) => Some(match n.as_i64() {
                Some(i) => DataValue::Int(i),
                None => DataValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            }),
            serde_json::Value::String(s) => Some(DataValue::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Empty cells and blank text both count as "no value".
    pub fn is_empty(&self) -> bool {
        match self {
            DataValue::Empty => true,
            DataValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Text form used for keys and filters; `None` for empty values.
    pub fn to_key(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string().trim().to_string())
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Number(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

/// Serde deserializer over a single [`DataValue`].
///
/// Spreadsheet cells carry weak types: a numeric id may arrive as a float, a
/// quantity as text. The deserializer coerces towards whatever the target
/// type asks for and only fails when the conversion is impossible.
pub struct DataValueDeserializer<E> {
    value: DataValue,
    marker: PhantomData<E>,
}

impl<E> DataValueDeserializer<E> {
    pub fn new(value: DataValue) -> Self {
        Self {
            value,
            marker: PhantomData,
        }
    }
}

impl<'de, E: de::Error> IntoDeserializer<'de, E> for DataValue {
    type Deserializer = DataValueDeserializer<E>;

    fn into_deserializer(self) -> Self::Deserializer {
        DataValueDeserializer::new(self)
    }
}

impl<'de, E: de::Error> DataValueDeserializer<E> {
    fn deserialize_integer<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value {
            DataValue::Int(i) => visitor.visit_i64(i),
            DataValue::Number(n) => match integral(n) {
                Some(i) => visitor.visit_i64(i),
                None => Err(E::invalid_value(Unexpected::Float(n), &visitor)),
            },
            DataValue::Text(ref s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    visitor.visit_i64(i)
                } else if let Ok(u) = trimmed.parse::<u64>() {
                    visitor.visit_u64(u)
                } else {
                    match trimmed.parse::<f64>().ok().and_then(integral) {
                        Some(i) => visitor.visit_i64(i),
                        None => Err(E::invalid_value(Unexpected::Str(s), &visitor)),
                    }
                }
            }
            other => DataValueDeserializer::<E>::new(other).deserialize_any_value(visitor),
        }
    }

    fn deserialize_float<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value {
            DataValue::Int(i) => visitor.visit_f64(i as f64),
            DataValue::Number(n) => visitor.visit_f64(n),
            DataValue::Text(ref s) => match s.trim().parse::<f64>() {
                Ok(n) => visitor.visit_f64(n),
                Err(_) => Err(E::invalid_value(Unexpected::Str(s), &visitor)),
            },
            other => DataValueDeserializer::<E>::new(other).deserialize_any_value(visitor),
        }
    }

    fn deserialize_any_value<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value {
            DataValue::Empty => visitor.visit_unit(),
            DataValue::Text(s) => visitor.visit_string(s),
            DataValue::Int(i) => visitor.visit_i64(i),
            DataValue::Number(n) => visitor.visit_f64(n),
            DataValue::Boolean(b) => visitor.visit_bool(b),
            date @ (DataValue::Date(_) | DataValue::DateTime(_)) => {
                visitor.visit_string(date.to_string())
            }
        }
    }
}

macro_rules! integer_methods {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
                self.deserialize_integer(visitor)
            }
        )*
    };
}

impl<'de, E: de::Error> de::Deserializer<'de> for DataValueDeserializer<E> {
    type Error = E;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        self.deserialize_any_value(visitor)
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value {
            DataValue::Boolean(b) => visitor.visit_bool(b),
            DataValue::Int(0) => visitor.visit_bool(false),
            DataValue::Int(1) => visitor.visit_bool(true),
            DataValue::Text(ref s) => match parse_bool(s) {
                Some(b) => visitor.visit_bool(b),
                None => Err(E::invalid_value(Unexpected::Str(s), &visitor)),
            },
            other => DataValueDeserializer::<E>::new(other).deserialize_any_value(visitor),
        }
    }

    integer_methods! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        self.deserialize_float(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        self.deserialize_float(visitor)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value {
            DataValue::Text(s) => visitor.visit_string(s),
            other => visitor.visit_string(other.to_string()),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        if self.value.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value {
            DataValue::Empty => visitor.visit_unit(),
            other => DataValueDeserializer::<E>::new(other).deserialize_any_value(visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, E> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, E> {
        match self.value {
            DataValue::Text(s) => visitor.visit_enum(s.trim().to_string().into_deserializer()),
            other => DataValueDeserializer::<E>::new(other).deserialize_any_value(visitor),
        }
    }

    serde::forward_to_deserialize_any! {
        i128 u128 bytes byte_buf unit_struct seq tuple tuple_struct map struct identifier
        ignored_any
    }
}
