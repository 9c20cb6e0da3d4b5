//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::unit::TranslationUnit;

/// Models a pass that possibly rewrites the RAM program of a translation
/// unit.
///
/// Every legal input program yields a legal output program, so a
/// transformer has no error channel; the boolean return reports whether
/// anything was rewritten. That flag drives fixpoint scheduling, gates the
/// debug-report snapshots, and tells the translation unit to drop its
/// analysis cache.
///
/// Passes run strictly one at a time over a unit. A pass observes every
/// effect of the passes before it and none of the passes after it.
pub trait RamTransformer {
    /// A stable, human-readable label for the pass.
    fn name(&self) -> &'static str;

    /// Performs the rewrite. Returns whether the program changed.
    ///
    /// Implementations request what they need from the unit's analysis
    /// cache *before* mutating the program; the stale-cache hazard is
    /// handled by [`Self::apply`], not here.
    fn transform(&mut self, unit: &mut TranslationUnit) -> bool;

    /// Runs the pass the way the pass manager does: perform the rewrite,
    /// then invalidate the unit's analysis cache if anything changed.
    ///
    /// Callers should prefer this over [`Self::transform`]; calling
    /// `transform` directly and forgetting the invalidation leaves later
    /// passes reading levels computed for a tree that no longer exists.
    fn apply(&mut self, unit: &mut TranslationUnit) -> bool {
        let changed = self.transform(unit);

        if changed {
            unit.invalidate_analyses();
        }

        changed
    }
}
