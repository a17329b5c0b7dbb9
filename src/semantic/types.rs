//! Value types for basc.
//!
//! Locomotive BASIC drives its type system through variable suffixes and
//! coercion rules rather than declarations. The compiler maps that onto a
//! closed tag set: every variable and every expression node ends up as
//! exactly one of integer (16-bit), real (5-byte Amstrad format), or
//! string (NUL-terminated, up to 255 bytes).

use std::fmt;

/// A declared type suffix on an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSuffix {
    /// `%` - 16-bit integer
    Integer,
    /// `!` - 5-byte real
    Real,
    /// `$` - string
    String,
}

impl TypeSuffix {
    /// The suffix character as spelled in source.
    pub fn sigil(&self) -> char {
        match self {
            TypeSuffix::Integer => '%',
            TypeSuffix::Real => '!',
            TypeSuffix::String => '$',
        }
    }
}

/// The type of a value at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// 16-bit signed integer, held in HL.
    Integer,
    /// 5-byte Microsoft-format real, held in memory and passed by address.
    Real,
    /// NUL-terminated string, held in memory and passed by address.
    String,
}

impl ValueType {
    /// The type a suffix declares; no suffix defaults to real.
    pub fn from_suffix(suffix: Option<TypeSuffix>) -> Self {
        match suffix {
            Some(TypeSuffix::Integer) => ValueType::Integer,
            Some(TypeSuffix::String) => ValueType::String,
            Some(TypeSuffix::Real) | None => ValueType::Real,
        }
    }

    /// True for integer and real.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ValueType::String)
    }

    /// Bytes one value of this type occupies in the data area.
    ///
    /// Strings reserve a full 256-byte buffer: up to 255 content bytes
    /// plus the terminator.
    pub fn reservation_bytes(&self) -> u16 {
        match self {
            ValueType::Integer => 2,
            ValueType::Real => 5,
            ValueType::String => 256,
        }
    }

    /// The result type of a numeric binary operation between two numeric
    /// operands: integer stays integer, any real makes it real.
    pub fn numeric_common(self, other: ValueType) -> ValueType {
        if self == ValueType::Real || other == ValueType::Real {
            ValueType::Real
        } else {
            ValueType::Integer
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Integer => "integer",
            ValueType::Real => "real",
            ValueType::String => "string",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_defaults_to_real() {
        assert_eq!(ValueType::from_suffix(None), ValueType::Real);
        assert_eq!(
            ValueType::from_suffix(Some(TypeSuffix::Integer)),
            ValueType::Integer
        );
        assert_eq!(
            ValueType::from_suffix(Some(TypeSuffix::String)),
            ValueType::String
        );
    }

    #[test]
    fn test_reservation_widths() {
        assert_eq!(ValueType::Integer.reservation_bytes(), 2);
        assert_eq!(ValueType::Real.reservation_bytes(), 5);
        assert_eq!(ValueType::String.reservation_bytes(), 256);
    }

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(
            ValueType::Integer.numeric_common(ValueType::Integer),
            ValueType::Integer
        );
        assert_eq!(
            ValueType::Integer.numeric_common(ValueType::Real),
            ValueType::Real
        );
        assert_eq!(
            ValueType::Real.numeric_common(ValueType::Integer),
            ValueType::Real
        );
    }
}
