use std::{any::Any, ops::RangeInclusive, sync::Arc};

use derivative::Derivative;

use crate::CommandError;

/// A typed argument or result passed through the dispatcher.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// A platform object such as an intent or a service connection, compared by identity.
    Opaque(#[derivative(Debug = "ignore")] Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Opaque(_) => "object",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(val) => Some(*val),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(val) => Some(*val),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(val) => val.downcast_ref(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_int().and_then(|val| i32::try_from(val).ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(val) => Some(*val),
            Value::Int(val) => Some(*val as f64),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(val) => Some(val.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(val) => Some(val.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(val) => Some(val.clone()),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// Ordered argument list of a generic command.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }

    pub fn expect_len(
        &self,
        command: &str,
        expected: RangeInclusive<usize>,
    ) -> Result<(), CommandError> {
        if expected.contains(&self.len()) {
            return Ok(());
        }
        let message = if expected.start() == expected.end() {
            format!(
                "expected {} argument(s), got {}",
                expected.start(),
                self.len()
            )
        } else {
            format!(
                "expected {} to {} arguments, got {}",
                expected.start(),
                expected.end(),
                self.len()
            )
        };
        Err(CommandError::invalid_argument(command, message))
    }

    pub fn get<T: FromValue>(&self, command: &str, index: usize) -> Result<T, CommandError> {
        self.get_opt(command, index)?.ok_or_else(|| {
            CommandError::invalid_argument(command, format!("missing argument {index}"))
        })
    }

    /// Like [`Arguments::get`] but a missing trailing argument is not an error.
    pub fn get_opt<T: FromValue>(
        &self,
        command: &str,
        index: usize,
    ) -> Result<Option<T>, CommandError> {
        match self.0.get(index) {
            None => Ok(None),
            Some(value) => T::from_value(value).map(Some).ok_or_else(|| {
                CommandError::invalid_argument(
                    command,
                    format!(
                        "argument {index} has the wrong type ({}: expected {})",
                        value.type_name(),
                        std::any::type_name::<T>()
                    ),
                )
            }),
        }
    }

    pub fn opaque<T: Any + Send + Sync>(
        &self,
        command: &str,
        index: usize,
    ) -> Result<Arc<T>, CommandError> {
        let value: Value = self.get(command, index)?;
        let type_name = value.type_name();
        let mismatch = || {
            CommandError::invalid_argument(
                command,
                format!(
                    "argument {index} must be a {} (got {type_name})",
                    std::any::type_name::<T>()
                ),
            )
        };
        match value {
            Value::Opaque(val) => val.downcast::<T>().map_err(|_| mismatch()),
            _ => Err(mismatch()),
        }
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Arguments {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds [`Arguments`] from anything convertible into a [`Value`].
#[macro_export]
macro_rules! arguments {
    () => {
        $crate::Arguments::default()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Arguments::new(vec![$($crate::Value::from($value)),+])
    };
}

#[cfg(test)]
#[path = "./value_test.rs"]
mod value_test;
