// Copyright 2020 - present Alex Dukhno
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use definition::{Attribute, AttributeSet, FuncDep};

/// Saturates `attributes` under `deps`: the result contains every attribute
/// that the starting set functionally determines. Terminates because each
/// round either grows the result or ends the scan.
pub fn closure(attributes: &AttributeSet, deps: &[FuncDep]) -> AttributeSet {
    let mut result = attributes.clone();
    let mut growing = true;
    while growing {
        growing = false;
        for dep in deps {
            if dep.lhs().is_subset_of(&result) && !result.contains(dep.rhs()) {
                result = result.with(dep.rhs().clone());
                growing = true;
            }
        }
    }
    result
}

pub fn implies(deps: &[FuncDep], lhs: &AttributeSet, rhs: &Attribute) -> bool {
    closure(lhs, deps).contains(rhs)
}

/// A dependency is redundant when the rest of the set already derives it.
pub fn is_redundant(deps: &[FuncDep], dep: &FuncDep) -> bool {
    let mut skipped = false;
    let remainder = deps
        .iter()
        .filter(|candidate| {
            if !skipped && *candidate == dep {
                skipped = true;
                false
            } else {
                true
            }
        })
        .cloned()
        .collect::<Vec<FuncDep>>();
    implies(&remainder, dep.lhs(), dep.rhs())
}

pub fn redundant_members(deps: &[FuncDep]) -> Vec<FuncDep> {
    deps.iter().filter(|dep| is_redundant(deps, dep)).cloned().collect()
}
