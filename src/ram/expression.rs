//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use static_assertions::assert_eq_size;
use std::fmt;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The scalar domain that RAM computes over.
///
/// Every value flowing through a query is one of these: numbers directly,
/// symbols and records as interned/packed indices into the side tables that
/// the runtime carries.
pub type RamDomain = i64;

/// The primitive operators that can appear in an [`Expression::Intrinsic`].
///
/// These are the operations the evaluator knows natively, everything else
/// goes through [`Expression::UserDefined`].
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum IntrinsicOp {
    /// Unary `-x`
    Neg,
    /// Unary bitwise complement
    BNot,
    /// Unary logical not
    LNot,
    /// The ordinal of a symbol
    Ord,
    /// The length of a symbol's string
    Strlen,
    /// `x + y`
    Add,
    /// `x - y`
    Sub,
    /// `x * y`
    Mul,
    /// `x / y`
    Div,
    /// `x % y`
    Mod,
    /// `x ^ y`, integer exponentiation
    Pow,
    /// Bitwise and
    BAnd,
    /// Bitwise or
    BOr,
    /// Bitwise xor
    BXor,
    /// Logical and
    LAnd,
    /// Logical or
    LOr,
    /// The larger of the operands
    Max,
    /// The smaller of the operands
    Min,
    /// String concatenation
    Cat,
    /// `substr(s, start, len)`
    Substr,
}

assert_eq_size!(IntrinsicOp, u8);

impl IntrinsicOp {
    /// The surface name of the operator, the one the canonical text form
    /// prints for non-infix operators.
    pub fn name(self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::BNot => "bnot",
            Self::LNot => "lnot",
            Self::Ord => "ord",
            Self::Strlen => "strlen",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::BAnd => "band",
            Self::BOr => "bor",
            Self::BXor => "bxor",
            Self::LAnd => "land",
            Self::LOr => "lor",
            Self::Max => "max",
            Self::Min => "min",
            Self::Cat => "cat",
            Self::Substr => "substr",
        }
    }

    /// Whether the canonical text form prints this operator between its two
    /// operands rather than as a call.
    pub fn is_infix(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod | Self::Pow
        )
    }
}

/// A pure, value-producing node of the RAM IR.
///
/// Expressions appear inside conditions, index patterns, projections and
/// aggregate bodies. They own their children outright: replacing a child
/// means taking the old one out of its slot and installing a new one, the
/// tree never shares structure.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Expression {
    /// A constant of the RAM domain. Symbol values travel as the interned
    /// indices the external symbol table assigned them.
    Constant(RamDomain),
    /// The `column`-th attribute of the tuple bound at nesting `level`.
    TupleElement {
        /// The tuple identifier, i.e. the nesting depth of the operation
        /// that binds the tuple.
        level: usize,
        /// The attribute index inside that tuple.
        column: usize,
    },
    /// A fresh counter value, incremented on every evaluation.
    AutoIncrement,
    /// An application of one of the primitive operators.
    Intrinsic {
        /// Which primitive is applied.
        op: IntrinsicOp,
        /// The operands, arity depends on `op`.
        args: Vec<Expression>,
    },
    /// A call to a registered user-defined functor.
    UserDefined {
        /// The functor's registered name.
        name: String,
        /// The call arguments.
        args: Vec<Expression>,
    },
    /// Construction of a record value from its fields.
    PackRecord {
        /// The field values, in declaration order.
        args: Vec<Expression>,
    },
    /// Access to the `index`-th argument of the enclosing subroutine.
    SubroutineArg(usize),
    /// The wildcard/placeholder in query patterns: a pattern slot holding
    /// `Undef` is unconstrained.
    Undef,
}

impl Expression {
    /// Shorthand for building a [`Expression::Constant`].
    pub fn constant(value: RamDomain) -> Self {
        Self::Constant(value)
    }

    /// Shorthand for building a [`Expression::TupleElement`].
    pub fn tuple_element(level: usize, column: usize) -> Self {
        Self::TupleElement { level, column }
    }

    /// Shorthand for building a [`Expression::Intrinsic`].
    pub fn intrinsic(op: IntrinsicOp, args: Vec<Expression>) -> Self {
        Self::Intrinsic { op, args }
    }

    /// Shorthand for building a [`Expression::UserDefined`].
    pub fn user_defined(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::UserDefined {
            name: name.into(),
            args,
        }
    }

    /// Whether this expression is the pattern wildcard.
    pub fn is_undef(&self) -> bool {
        matches!(self, Self::Undef)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "number({value})"),
            Self::TupleElement { level, column } => write!(f, "t{level}.{column}"),
            Self::AutoIncrement => write!(f, "autoinc()"),
            Self::Intrinsic { op, args } if op.is_infix() && args.len() == 2 => {
                write!(f, "({} {} {})", args[0], op.name(), args[1])
            }
            Self::Intrinsic { op, args } => write_call(f, op.name(), args),
            Self::UserDefined { name, args } => {
                write!(f, "@")?;
                write_call(f, name, args)
            }
            Self::PackRecord { args } => write_call(f, "pack", args),
            Self::SubroutineArg(index) => write!(f, "arg({index})"),
            Self::Undef => write!(f, "_"),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, name: &str, args: &[Expression]) -> fmt::Result {
    write!(f, "{name}(")?;

    for (i, arg) in args.iter().enumerate() {
        if i != 0 {
            write!(f, ",")?;
        }

        write!(f, "{arg}")?;
    }

    write!(f, ")")
}
