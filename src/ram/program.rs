//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ram::{Operation, Relation, Statement};
use crate::utility::SaHashMap;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A whole RAM program: the relation declarations, the main statement, and
/// any callable subroutines.
///
/// The program exclusively owns its tree. Passes mutate it through the
/// translation unit, which is what keeps the analysis cache honest; nothing
/// outside the pass pipeline should be handing out `&mut` access to parts
/// of the tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Program {
    relations: SaHashMap<String, Relation>,
    main: Statement,
    subroutines: SaHashMap<String, Statement>,
}

impl Program {
    /// Creates a program from its declarations and main statement, with no
    /// subroutines.
    pub fn new(relations: Vec<Relation>, main: Statement) -> Self {
        Self {
            relations: relations
                .into_iter()
                .map(|r| (r.name().to_string(), r))
                .collect(),
            main,
            subroutines: SaHashMap::default(),
        }
    }

    /// Adds (or replaces) a relation declaration.
    pub fn add_relation(&mut self, relation: Relation) {
        self.relations.insert(relation.name().to_string(), relation);
    }

    /// Registers a named subroutine.
    pub fn add_subroutine(&mut self, name: impl Into<String>, body: Statement) {
        self.subroutines.insert(name.into(), body);
    }

    /// Looks up a relation declaration by name.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// The arity of a named relation, if it is declared.
    pub fn arity(&self, name: &str) -> Option<usize> {
        self.relation(name).map(Relation::arity)
    }

    /// Iterates over the relation declarations in unspecified order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> + '_ {
        self.relations.values()
    }

    /// The main statement.
    pub fn main(&self) -> &Statement {
        &self.main
    }

    /// Mutable access to the main statement, for the transformers.
    pub fn main_mut(&mut self) -> &mut Statement {
        &mut self.main
    }

    /// Iterates over `(name, body)` of every subroutine, unspecified order.
    pub fn subroutines(&self) -> impl Iterator<Item = (&str, &Statement)> + '_ {
        self.subroutines.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Applies `f` to the root operation of every query in the program,
    /// main statement and subroutines alike.
    ///
    /// This is the entry point every rewriting pass uses: a query's
    /// operation nest is taken out of its slot, rebuilt, and put back as
    /// one logical step.
    pub fn for_each_query_mut(&mut self, mut f: impl FnMut(&mut Operation)) {
        super::visit::for_each_query_mut(&mut self.main, &mut f);

        for body in self.subroutines.values_mut() {
            super::visit::for_each_query_mut(body, &mut f);
        }
    }

    /// The read-only counterpart of [`Self::for_each_query_mut`].
    pub fn for_each_query(&self, mut f: impl FnMut(&Operation)) {
        super::visit::for_each_query(&self.main, &mut f);

        for body in self.subroutines.values() {
            super::visit::for_each_query(body, &mut f);
        }
    }
}
