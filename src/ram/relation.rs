//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A relation declaration of a RAM program.
///
/// The program owns one of these per relation; operations and statements
/// refer to relations by name. The arity is the length of the attribute
/// list, and every index pattern and projected tuple must match it.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Relation {
    name: String,
    attributes: Vec<String>,
}

impl Relation {
    /// Creates a relation from its name and attribute names.
    pub fn new(name: impl Into<String>, attributes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Convenience constructor taking attribute names as string slices.
    ///
    /// ```
    /// # use garnet::ram::Relation;
    /// let r = Relation::with_attributes("edge", &["x", "y"]);
    ///
    /// assert_eq!(r.arity(), 2);
    /// ```
    pub fn with_attributes(name: impl Into<String>, attributes: &[&str]) -> Self {
        Self::new(name, attributes.iter().map(|s| s.to_string()).collect())
    }

    /// The relation's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attribute names, in declaration order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// The number of attributes.
    pub fn arity(&self) -> usize {
        self.attributes.len()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.attributes.join(","))
    }
}
