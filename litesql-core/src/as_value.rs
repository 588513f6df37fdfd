use crate::{Error, Result, Value};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::any;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, macros::format_description};
use uuid::Uuid;

/// Conversion between native Rust types and [`Value`].
///
/// Bindings are produced with [`AsValue::as_value`], rows are decoded with
/// [`AsValue::try_from_value`]. Decoding is lenient where drivers commonly disagree
/// on the storage type: any integer variant decodes into any integer type (range
/// checked), and temporal types and uuids decode from their text form.
///
/// ```rust
/// use litesql_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// Typed NULL for this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn mismatch<T>(value: &Value) -> Error {
    if value.is_null() {
        Error::msg(format!(
            "Cannot convert NULL into {}, use Option<{}> for nullable columns",
            any::type_name::<T>(),
            any::type_name::<T>(),
        ))
    } else {
        Error::msg(format!(
            "Cannot convert {} ({:?}) into {}",
            value.type_name(),
            value,
            any::type_name::<T>()
        ))
    }
}

macro_rules! impl_as_value_integer {
    ($source:ty, $variant:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let $variant(Some(v)) = value {
                    return Ok(v);
                }
                match value.as_integer() {
                    Some(v) => <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {} is out of range for {}",
                            v,
                            any::type_name::<$source>()
                        ))
                    }),
                    None => Err(mismatch::<$source>(&value)),
                }
            }
        }
    };
}

impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            ref v => match v.as_integer() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(mismatch::<bool>(v)),
            },
        }
    }
}

impl AsValue for f32 {
    fn as_empty_value() -> Value {
        Value::Float32(None)
    }
    fn as_value(self) -> Value {
        Value::Float32(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float32(Some(v)) => Ok(v),
            Value::Float64(Some(v)) => Ok(v as f32),
            ref v => v
                .as_integer()
                .map(|v| v as f32)
                .ok_or_else(|| mismatch::<f32>(v)),
        }
    }
}

impl AsValue for f64 {
    fn as_empty_value() -> Value {
        Value::Float64(None)
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float64(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => Ok(v as f64),
            ref v => v
                .as_integer()
                .map(|v| v as f64)
                .ok_or_else(|| mismatch::<f64>(v)),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None, 0, 0)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self), 0, self.scale() as u8)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v), ..) => Ok(v),
            Value::Float64(Some(v)) => Decimal::from_f64(v)
                .ok_or_else(|| Error::msg(format!("Value {} cannot be represented as Decimal", v))),
            Value::Float32(Some(v)) => Decimal::from_f32(v)
                .ok_or_else(|| Error::msg(format!("Value {} cannot be represented as Decimal", v))),
            Value::Varchar(Some(ref v)) => v
                .parse::<Decimal>()
                .map_err(|e| Error::new(e).context(format!("Cannot parse `{}` as Decimal", v))),
            ref v => v
                .as_integer()
                .and_then(Decimal::from_i128)
                .ok_or_else(|| mismatch::<Decimal>(v)),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            v => Err(mismatch::<String>(&v)),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            v => Err(mismatch::<Box<[u8]>>(&v)),
        }
    }
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) => {
                Date::parse(v, format_description!("[year]-[month]-[day]"))
                    .map_err(|e| Error::new(e).context(format!("Cannot parse `{}` as Date", v)))
            }
            v => Err(mismatch::<Date>(&v)),
        }
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => {
                Time::parse(v, format_description!("[hour]:[minute]:[second]"))
                    .map_err(|e| Error::new(e).context(format!("Cannot parse `{}` as Time", v)))
            }
            v => Err(mismatch::<Time>(&v)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::TimestampWithTimezone(Some(v)) => Ok(PrimitiveDateTime::new(v.date(), v.time())),
            Value::Varchar(Some(ref v)) => PrimitiveDateTime::parse(
                v,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            )
            .map_err(|e| Error::new(e).context(format!("Cannot parse `{}` as timestamp", v))),
            v => Err(mismatch::<PrimitiveDateTime>(&v)),
        }
    }
}

impl AsValue for OffsetDateTime {
    fn as_empty_value() -> Value {
        Value::TimestampWithTimezone(None)
    }
    fn as_value(self) -> Value {
        Value::TimestampWithTimezone(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            v => Err(mismatch::<OffsetDateTime>(&v)),
        }
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => Uuid::parse_str(v)
                .map_err(|e| Error::new(e).context(format!("Cannot parse `{}` as Uuid", v))),
            v => Err(mismatch::<Uuid>(&v)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_empty_value() -> Value {
        Value::List(None, Box::new(T::as_empty_value()))
    }
    fn as_value(self) -> Value {
        Value::List(
            Some(self.into_iter().map(AsValue::as_value).collect()),
            Box::new(T::as_empty_value()),
        )
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(Some(v), ..) => v.into_iter().map(T::try_from_value).collect(),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn integer_widening() {
        assert_eq!(i32::try_from_value(Value::Int64(Some(12))).unwrap(), 12);
        assert!(u8::try_from_value(Value::Int64(Some(300))).is_err());
        assert!(i32::try_from_value(Value::Int32(None)).is_err());
        assert_eq!(Option::<i32>::try_from_value(Value::Int32(None)).unwrap(), None);
    }

    #[test]
    fn text_forms() {
        let ts = PrimitiveDateTime::try_from_value(Value::Varchar(Some(
            "2024-03-01 10:20:30".into(),
        )))
        .unwrap();
        assert_eq!(ts, datetime!(2024-03-01 10:20:30));
        assert!(bool::try_from_value(Value::Int64(Some(1))).unwrap());
    }

    #[test]
    fn optional_as_typed_null() {
        let v: Value = Option::<String>::None.into();
        assert_eq!(v, Value::Varchar(None));
        let v: Value = vec![1i32, 2].into();
        assert!(matches!(v, Value::List(Some(ref items), _) if items.len() == 2));
    }
}
