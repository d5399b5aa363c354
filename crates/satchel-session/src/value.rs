//! Conversion of caller values into session values.

use std::borrow::Cow;

use serde_json::{Map, Value};

/// Values accepted by `set` and as `get_or` defaults.
///
/// Mirrors serde_json's `From` conversions. Session values are JSON values,
/// so a non-finite float (NaN, ±inf) has no representation and is stored
/// as `null`; [`non_finite`](Self::non_finite) lets the store report that.
pub trait IntoValue {
    fn into_value(self) -> Value;

    /// The float that will be coerced to `null`, if any.
    fn non_finite(&self) -> Option<f64> {
        None
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for Map<String, Value> {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

macro_rules! into_value_via_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::from(self)
                }
            }
        )*
    };
}

into_value_via_from!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, String);

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl IntoValue for &String {
    fn into_value(self) -> Value {
        Value::from(self.as_str())
    }
}

impl IntoValue for Cow<'_, str> {
    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn non_finite(&self) -> Option<f64> {
        (!self.is_finite()).then_some(*self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn non_finite(&self) -> Option<f64> {
        (!self.is_finite()).then_some(f64::from(*self))
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }

    fn non_finite(&self) -> Option<f64> {
        self.as_ref().and_then(IntoValue::non_finite)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }

    fn non_finite(&self) -> Option<f64> {
        self.iter().find_map(IntoValue::non_finite)
    }
}
