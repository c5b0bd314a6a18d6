//! ClickHouse data types.

use super::expr::FunctionCall;

/// A ClickHouse column/value data type.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    /// A bare type name with no arguments (`String`, `UInt64`, `Date`, `IPv4`, ...).
    Primitive(String),
    /// A type with a generic argument list of mixed kind
    /// (`Enum8('a' = 1, 'b' = 2)`, `SimpleAggregateFunction(sum, UInt64)`).
    Parametric { name: String, args: Vec<TypeArg> },
    Array(Box<DataType>),
    Nullable(Box<DataType>),
    LowCardinality(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    /// `Tuple(a UInt8, String)` — elements may or may not be named.
    Tuple(Vec<(Option<String>, DataType)>),
    /// `Nested(a UInt8, b String)`.
    Nested(Vec<super::column::ColumnDef>),
    FixedString(u64),
    Decimal { precision: u32, scale: u32 },
    DateTime64 { precision: u32, timezone: Option<String> },
    /// `AggregateFunction(sum(x), UInt64)` / `AggregateFunction(quantiles(0.5)(x), Float64)`.
    AggregateFunction { function: FunctionCall, arg_types: Vec<DataType> }
}

impl DataType {
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::Primitive(name.into())
    }
}

/// A single argument inside a parametric data type's parameter list.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeArg {
    Number(String),
    String(String),
    Type(Box<DataType>),
    /// `'a' = 1` style enum member (name, discriminant).
    EnumMember(String, i64)
}
