//! Operators shared by the syntax tree and the IR

use serde::{Deserialize, Serialize};

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Floor division (//)
    FloorDiv,
    /// Modulo (%)
    Mod,
    /// Exponentiation (**)
    Pow,
    /// Matrix multiplication (@)
    MatMul,

    // Bitwise operators
    /// Bitwise AND (&)
    BitAnd,
    /// Bitwise OR (|)
    BitOr,
    /// Bitwise XOR (^)
    BitXor,
    /// Left shift (<<)
    LShift,
    /// Right shift (>>)
    RShift,
}

impl BinaryOperator {
    /// Source spelling of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::FloorDiv => "//",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "**",
            BinaryOperator::MatMul => "@",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::LShift => "<<",
            BinaryOperator::RShift => ">>",
        }
    }

    /// Returns true for operators with no arithmetic meaning in NetLogo
    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            BinaryOperator::MatMul
                | BinaryOperator::BitAnd
                | BinaryOperator::BitOr
                | BinaryOperator::BitXor
                | BinaryOperator::LShift
                | BinaryOperator::RShift
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Logical negation (not)
    Not,
    /// Arithmetic negation (-)
    Neg,
    /// Unary plus (+)
    Pos,
    /// Bitwise inversion (~)
    Invert,
}

/// Short-circuit boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolOperator {
    And,
    Or,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOperator {
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    NotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtE,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtE,
    /// Membership (in)
    In,
    /// Negated membership (not in)
    NotIn,
    /// Identity (is)
    Is,
    /// Negated identity (is not)
    IsNot,
}

impl CompareOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOperator::Eq => "==",
            CompareOperator::NotEq => "!=",
            CompareOperator::Lt => "<",
            CompareOperator::LtE => "<=",
            CompareOperator::Gt => ">",
            CompareOperator::GtE => ">=",
            CompareOperator::In => "in",
            CompareOperator::NotIn => "not in",
            CompareOperator::Is => "is",
            CompareOperator::IsNot => "is not",
        }
    }

    /// Returns true for `in` / `not in`
    pub fn is_membership(&self) -> bool {
        matches!(self, CompareOperator::In | CompareOperator::NotIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitwise_classification() {
        assert!(BinaryOperator::BitAnd.is_bitwise());
        assert!(BinaryOperator::MatMul.is_bitwise());
        assert!(!BinaryOperator::FloorDiv.is_bitwise());
        assert!(!BinaryOperator::Pow.is_bitwise());
    }

    #[test]
    fn test_membership() {
        assert!(CompareOperator::In.is_membership());
        assert!(CompareOperator::NotIn.is_membership());
        assert!(!CompareOperator::Is.is_membership());
        assert_eq!(CompareOperator::IsNot.symbol(), "is not");
    }
}
