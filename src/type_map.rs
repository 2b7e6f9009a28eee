//! Maps ROS primitive kinds to Java types and Gson accessors.
//!
//! # Type Mapping Table
//!
//! | ROS kind | Java type | Boxed type | Default | Gson read |
//! |----------|-----------|------------|---------|-----------|
//! | `bool` | `boolean` | `java.lang.Boolean` | `false` | `getAsBoolean()` |
//! | `int8`, `byte` | `byte` | `java.lang.Byte` | `0` | `getAsByte()` |
//! | `uint8`, `char` | `char` | `java.lang.Character` | `'\0'` | `(char) getAsInt()` |
//! | `int16`, `uint16` | `short` | `java.lang.Short` | `0` | `getAsShort()` |
//! | `int32`, `uint32` | `int` | `java.lang.Integer` | `0` | `getAsInt()` |
//! | `int64`, `uint64` | `long` | `java.lang.Long` | `0L` | `getAsLong()` |
//! | `float32` | `float` | `java.lang.Float` | `0.0f` | `getAsFloat()` |
//! | `float64` | `double` | `java.lang.Double` | `0.0` | `getAsDouble()` |
//! | `string` | `java.lang.String` | `java.lang.String` | `""` | `getAsString()` |
//! | `time`, `duration` | `long` | `java.lang.Long` | `0L` | `getAsLong()` |
//!
//! Temporal kinds have table entries so every kind resolves, but the class
//! tree builder always replaces them with a two-field composite.

/// A ROS message primitive kind, as it appears in a field type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Byte,
    Char,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    String,
    Time,
    Duration,
}

impl PrimitiveKind {
    /// Every kind, in declaration order.
    pub const ALL: [PrimitiveKind; 16] = [
        Self::Bool,
        Self::Byte,
        Self::Char,
        Self::Int8,
        Self::Uint8,
        Self::Int16,
        Self::Uint16,
        Self::Int32,
        Self::Uint32,
        Self::Int64,
        Self::Uint64,
        Self::Float32,
        Self::Float64,
        Self::String,
        Self::Time,
        Self::Duration,
    ];

    /// Look up a kind by its ROS keyword. Returns `None` for message references.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The ROS keyword for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Time => "time",
            Self::Duration => "duration",
        }
    }

    /// Whether this kind is `time` or `duration`.
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Time | Self::Duration)
    }

    /// The Java primitive this kind is declared as.
    pub fn java(self) -> JavaPrimitive {
        match self {
            Self::Bool => JavaPrimitive::Boolean,
            Self::Byte | Self::Int8 => JavaPrimitive::Byte,
            Self::Char | Self::Uint8 => JavaPrimitive::Char,
            Self::Int16 | Self::Uint16 => JavaPrimitive::Short,
            Self::Int32 | Self::Uint32 => JavaPrimitive::Int,
            Self::Int64 | Self::Uint64 | Self::Time | Self::Duration => JavaPrimitive::Long,
            Self::Float32 => JavaPrimitive::Float,
            Self::Float64 => JavaPrimitive::Double,
            Self::String => JavaPrimitive::String,
        }
    }
}

/// A Java primitive (or `String`) used for generated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JavaPrimitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
}

impl JavaPrimitive {
    /// The declared Java type. `String` is fully qualified so a generated
    /// `RosString` never shadows it.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "java.lang.String",
        }
    }

    /// The boxed type used for array and `ArrayList` elements.
    pub fn boxed(self) -> &'static str {
        match self {
            Self::Boolean => "java.lang.Boolean",
            Self::Byte => "java.lang.Byte",
            Self::Char => "java.lang.Character",
            Self::Short => "java.lang.Short",
            Self::Int => "java.lang.Integer",
            Self::Long => "java.lang.Long",
            Self::Float => "java.lang.Float",
            Self::Double => "java.lang.Double",
            Self::String => "java.lang.String",
        }
    }

    /// The zero-value literal. Valid both for the primitive and, inside an
    /// array initializer, for the boxed type.
    pub fn default_literal(self) -> &'static str {
        match self {
            Self::Boolean => "false",
            Self::Byte | Self::Short | Self::Int => "0",
            Self::Char => "'\\0'",
            Self::Long => "0L",
            Self::Float => "0.0f",
            Self::Double => "0.0",
            Self::String => "\"\"",
        }
    }

    /// Gson expression extracting this primitive from the `JsonElement`
    /// expression `value`.
    pub fn json_accessor(self, value: &str) -> String {
        match self {
            Self::Boolean => format!("{value}.getAsBoolean()"),
            Self::Byte => format!("{value}.getAsByte()"),
            Self::Char => format!("(char) {value}.getAsInt()"),
            Self::Short => format!("{value}.getAsShort()"),
            Self::Int => format!("{value}.getAsInt()"),
            Self::Long => format!("{value}.getAsLong()"),
            Self::Float => format!("{value}.getAsFloat()"),
            Self::Double => format!("{value}.getAsDouble()"),
            Self::String => format!("{value}.getAsString()"),
        }
    }
}

/// Split a `<namespace>/<name>` type name.
///
/// Returns `None` unless there is exactly one `/` with text on both sides.
pub fn split_type_name(type_name: &str) -> Option<(&str, &str)> {
    let (namespace, name) = type_name.split_once('/')?;
    if namespace.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((namespace, name))
}

/// Java class name for a message.
///
/// `std_msgs` types get a `Ros` prefix so `std_msgs/String` and friends
/// never collide with `java.lang` classes: `("std_msgs", "Header")` →
/// `"RosHeader"`.
pub fn class_name(namespace: &str, name: &str) -> String {
    if namespace == "std_msgs" {
        format!("Ros{name}")
    } else {
        name.to_string()
    }
}

/// Convert a relative directory path to a Java package name.
///
/// - `"frc/team88/ros/messages"` → `"frc.team88.ros.messages"`
/// - `"./a//b/"` → `"a.b"`
pub fn package_from_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join(".")
}

/// Join a package prefix and a relative name with a dot, tolerating an
/// empty prefix.
pub fn qualify(prefix: &str, rest: &str) -> String {
    let prefix = prefix.trim_end_matches('.');
    if prefix.is_empty() {
        rest.to_string()
    } else {
        format!("{prefix}.{rest}")
    }
}

/// Convert snake_case or kebab-case to camelCase.
///
/// Each word is title-cased, so `"get_frame_ID"` → `"getFrameId"`.
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::new();
    for (i, word) in s.split(['_', '-']).filter(|w| !w.is_empty()).enumerate() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out
}

/// Accessor method name: `("get", "linear_x")` → `"getLinearX"`.
pub fn accessor_name(prefix: &str, field: &str) -> String {
    to_camel_case(&format!("{prefix}_{field}"))
}

/// Quote and escape a string as a Java string literal.
pub fn java_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
