use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use crate::meta::attribute::ElementAttribute;
use crate::meta::element::Element;
use crate::utils::format_rfc822;

/// Converts an assigned attribute value to its XML string form.
pub type Serializer = fn(&Value) -> String;

/// Scalar payload of an [`ElementAttribute`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(DateTime<FixedOffset>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::DateTime(date) => f.write_str(&format_rfc822(date)),
        }
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

value_from!(
    bool => Bool,
    i64 => Int,
    i32 => Int,
    i16 => Int,
    u32 => Int,
    u16 => Int,
    u8 => Int,
    f64 => Float,
    f32 => Float,
    String => Str,
    &str => Str,
    DateTime<FixedOffset> => DateTime,
);

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Str(value.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value.fixed_offset())
    }
}

/// Naive date-times are taken as UTC.
impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value.and_utc().fixed_offset())
    }
}

/// Default serializer: the display form of the value.
pub fn serialize_default(value: &Value) -> String {
    value.to_string()
}

/// Lowercased display form, used for boolean flags such as `isPermaLink`.
pub fn serialize_lowercase(value: &Value) -> String {
    value.to_string().to_lowercase()
}

/// RFC 822 date; non-date values fall back to their display form.
pub fn serialize_rfc822(value: &Value) -> String {
    match value {
        Value::DateTime(date) => format_rfc822(date),
        other => other.to_string(),
    }
}

/// Anything that can be assigned to a component or passed to an element
/// constructor.
///
/// Setters dispatch on the variant: `None` clears, scalars go to attributes or
/// to the content of a child, mappings build a new child, lists fill repeated
/// elements and elements replace a child wholesale.
#[derive(Debug, Clone, Default)]
pub enum Input {
    #[default]
    None,
    Scalar(Value),
    Attribute(ElementAttribute),
    Element(Element),
    Map(Vec<(String, Input)>),
    List(Vec<Input>),
}

impl Input {
    pub fn is_none(&self) -> bool {
        matches!(self, Input::None)
    }

    /// Builds a mapping input from `(component name, value)` pairs.
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Input>,
        I: IntoIterator<Item = (K, V)>,
    {
        Input::Map(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// Short human readable form for error messages.
    pub fn describe(&self) -> String {
        match self {
            Input::None => "None".to_string(),
            Input::Scalar(value) => format!("'{}'", value),
            Input::Attribute(_) => "<ElementAttribute>".to_string(),
            Input::Element(element) => format!("<{} element>", element.class_name()),
            Input::Map(pairs) => {
                let inner: Vec<String> = pairs
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value.describe()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Input::List(items) => {
                let inner: Vec<String> = items.iter().map(Input::describe).collect();
                format!("[{}]", inner.join(", "))
            }
        }
    }
}

macro_rules! input_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Input {
                fn from(value: $ty) -> Self {
                    Input::Scalar(Value::from(value))
                }
            }
        )*
    };
}

input_from_scalar!(
    bool,
    i64,
    i32,
    i16,
    u32,
    u16,
    u8,
    f64,
    f32,
    String,
    &str,
    &String,
    DateTime<FixedOffset>,
    DateTime<Utc>,
    NaiveDateTime,
);

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Scalar(value)
    }
}

impl From<Element> for Input {
    fn from(element: Element) -> Self {
        Input::Element(element)
    }
}

impl From<ElementAttribute> for Input {
    fn from(attribute: ElementAttribute) -> Self {
        Input::Attribute(attribute)
    }
}

impl<T: Into<Input>> From<Option<T>> for Input {
    fn from(value: Option<T>) -> Self {
        value.map_or(Input::None, Into::into)
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(items: Vec<T>) -> Self {
        Input::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Input>, const N: usize> From<[(K, V); N]> for Input {
    fn from(pairs: [(K, V); N]) -> Self {
        Input::map(pairs)
    }
}

/// JSON objects become mappings, arrays become lists and `null` clears.
impl From<serde_json::Value> for Input {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Input::None,
            serde_json::Value::Bool(b) => Input::Scalar(Value::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Input::Scalar(Value::Int(i)),
                None => Input::Scalar(Value::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Input::Scalar(Value::Str(s)),
            serde_json::Value::Array(items) => {
                Input::List(items.into_iter().map(Input::from).collect())
            }
            serde_json::Value::Object(map) => {
                Input::Map(map.into_iter().map(|(k, v)| (k, Input::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn scalars_display_naturally() {
        assert_eq!(Value::from(0).to_string(), "0");
        assert_eq!(Value::from("long текст").to_string(), "long текст");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(serialize_lowercase(&Value::from("TRUE")), "true");
    }

    #[test]
    fn naive_dates_are_serialized_as_utc_rfc822() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 50, 15)
            .unwrap();
        assert_eq!(
            serialize_rfc822(&Value::from(date)),
            "Sat, 01 Jan 2000 00:50:15 +0000"
        );
        assert_eq!(serialize_rfc822(&Value::from(7)), "7");
    }

    #[test]
    fn json_converts_to_input_tree() {
        let input = Input::from(json!({"isPermaLink": false, "value": "Identifier"}));
        let Input::Map(pairs) = input else {
            panic!("expected a mapping");
        };
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().any(|(k, v)| k == "isPermaLink"
            && matches!(v, Input::Scalar(Value::Bool(false)))));

        assert!(Input::from(json!(null)).is_none());
        assert!(matches!(Input::from(json!(["a", 1])), Input::List(items) if items.len() == 2));
        assert!(matches!(
            Input::from(json!(1.5)),
            Input::Scalar(Value::Float(x)) if x == 1.5
        ));
    }

    #[test]
    fn option_and_vec_conversions() {
        assert!(Input::from(None::<&str>).is_none());
        assert!(matches!(Input::from(Some("x")), Input::Scalar(_)));
        assert!(matches!(Input::from(vec!["a", "b"]), Input::List(items) if items.len() == 2));
        assert_eq!(
            Input::from([("url", "http://example.com/"), ("title", "t")]).describe(),
            "{url: 'http://example.com/', title: 't'}"
        );
    }
}
