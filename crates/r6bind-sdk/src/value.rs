//! Foreign values and handles
//!
//! A `Handle` is an opaque 64-bit reference to something owned by the
//! foreign runtime. The host never dereferences it; every operation on the
//! referenced value goes back through [`ForeignRuntime`](crate::ForeignRuntime).
//!
//! `ForeignValue` is the small set of shapes the binding layer needs to look
//! at directly (names, flags, scalars). Anything richer stays behind a
//! `Handle`.

use std::fmt;

/// Opaque reference to a value owned by the foreign runtime.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Handle(u64);

impl Handle {
    /// Create from raw bits handed out by the runtime
    #[inline(always)]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Get the raw bits
    #[inline(always)]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.0)
    }
}

/// Stable identity of a foreign object.
///
/// Distinct handles may share one identity when they reference the same
/// foreign object. Only meaningful within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ForeignId(pub u64);

/// A value returned by, or passed to, the foreign runtime.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ForeignValue {
    /// The foreign NULL
    #[default]
    Null,
    /// Boolean scalar
    Logical(bool),
    /// Integer scalar
    Integer(i64),
    /// Double scalar
    Double(f64),
    /// String scalar
    Character(String),
    /// Reference to anything else (environments, closures, lists)
    Handle(Handle),
}

impl ForeignValue {
    /// Check if value is NULL
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, ForeignValue::Null)
    }

    /// Extract boolean value
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ForeignValue::Logical(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract integer value
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ForeignValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract double value; integers widen
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ForeignValue::Double(f) => Some(*f),
            ForeignValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Extract string value
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ForeignValue::Character(s) => Some(s),
            _ => None,
        }
    }

    /// Extract handle
    #[inline]
    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            ForeignValue::Handle(h) => Some(*h),
            _ => None,
        }
    }

    /// Get type name for diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self {
            ForeignValue::Null => "NULL",
            ForeignValue::Logical(_) => "logical",
            ForeignValue::Integer(_) => "integer",
            ForeignValue::Double(_) => "double",
            ForeignValue::Character(_) => "character",
            ForeignValue::Handle(_) => "handle",
        }
    }
}

impl From<bool> for ForeignValue {
    fn from(b: bool) -> Self {
        ForeignValue::Logical(b)
    }
}

impl From<i32> for ForeignValue {
    fn from(i: i32) -> Self {
        ForeignValue::Integer(i as i64)
    }
}

impl From<i64> for ForeignValue {
    fn from(i: i64) -> Self {
        ForeignValue::Integer(i)
    }
}

impl From<f64> for ForeignValue {
    fn from(f: f64) -> Self {
        ForeignValue::Double(f)
    }
}

impl From<&str> for ForeignValue {
    fn from(s: &str) -> Self {
        ForeignValue::Character(s.to_string())
    }
}

impl From<String> for ForeignValue {
    fn from(s: String) -> Self {
        ForeignValue::Character(s)
    }
}

impl From<Handle> for ForeignValue {
    fn from(h: Handle) -> Self {
        ForeignValue::Handle(h)
    }
}

impl<T: Into<ForeignValue>> From<Option<T>> for ForeignValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ForeignValue::Null, Into::into)
    }
}
