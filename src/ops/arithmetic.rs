//! Arithmetic operation kinds

use crate::dtype::Element;
use std::fmt;

/// Binary operation kind
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Addition: a + b
    Add,
    /// Subtraction: a - b
    Sub,
    /// Multiplication: a * b
    Mul,
    /// Division: a / b
    Div,
    /// Maximum: max(a, b)
    Max,
    /// Minimum: min(a, b)
    Min,
}

impl BinaryOp {
    /// All operation kinds
    pub const ALL: [BinaryOp; 6] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Max,
        Self::Min,
    ];

    /// Apply the operation to one pair of elements
    ///
    /// Integer arithmetic wraps and integer division by zero yields zero, so
    /// this never panics. For floats, `Max`/`Min` return `b` when either
    /// side is NaN.
    #[inline]
    pub fn apply<T: Element>(self, a: T, b: T) -> T {
        match self {
            Self::Add => a.add_elem(b),
            Self::Sub => a.sub_elem(b),
            Self::Mul => a.mul_elem(b),
            Self::Div => a.div_elem(b),
            Self::Max => {
                if a > b {
                    a
                } else {
                    b
                }
            }
            Self::Min => {
                if a < b {
                    a
                } else {
                    b
                }
            }
        }
    }

    /// Lowercase operation name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Max => "maximum",
            Self::Min => "minimum",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply() {
        assert_eq!(BinaryOp::Add.apply(2.5f32, 1.0), 3.5);
        assert_eq!(BinaryOp::Sub.apply(2u8, 3), 255);
        assert_eq!(BinaryOp::Mul.apply(-4i16, 3), -12);
        assert_eq!(BinaryOp::Div.apply(9i64, 0), 0);
        assert_eq!(BinaryOp::Max.apply(-1i8, 1), 1);
        assert_eq!(BinaryOp::Min.apply(7u64, 3), 3);
    }

    #[test]
    fn test_max_min_with_nan() {
        assert_eq!(BinaryOp::Max.apply(f64::NAN, 1.0), 1.0);
        assert!(BinaryOp::Max.apply(1.0, f64::NAN).is_nan());
    }

    #[test]
    fn test_display() {
        let names: Vec<String> = BinaryOp::ALL.iter().map(|op| op.to_string()).collect();
        assert_eq!(names, ["add", "sub", "mul", "div", "maximum", "minimum"]);
    }
}
