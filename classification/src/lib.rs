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

use definition::{FuncDep, TableDef};

/// Which declared dependencies keep a table out of BCNF and out of 3NF.
/// Both lists preserve catalog order.
#[derive(Debug, PartialEq)]
pub struct Classification {
    bcnf_violations: Vec<FuncDep>,
    third_nf_violations: Vec<FuncDep>,
}

impl Classification {
    pub fn bcnf_violations(&self) -> &[FuncDep] {
        &self.bcnf_violations
    }

    pub fn third_nf_violations(&self) -> &[FuncDep] {
        &self.third_nf_violations
    }

    pub fn is_bcnf(&self) -> bool {
        self.bcnf_violations.is_empty()
    }

    pub fn is_third_nf(&self) -> bool {
        self.third_nf_violations.is_empty()
    }
}

pub fn classify(table: &TableDef, deps: &[FuncDep]) -> Classification {
    let candidate_keys = keys::candidate_keys(table, deps);
    let bcnf_violations: Vec<FuncDep> = deps
        .iter()
        .filter(|dep| !keys::is_key(table, deps, dep.lhs()))
        .cloned()
        .collect();
    // a violating dependency is still tolerated by 3NF when its right-hand
    // side is part of some candidate key
    let third_nf_violations = bcnf_violations
        .iter()
        .filter(|dep| !candidate_keys.iter().any(|key| key.contains(dep.rhs())))
        .cloned()
        .collect();
    Classification {
        bcnf_violations,
        third_nf_violations,
    }
}

pub fn bcnf_violations(table: &TableDef, deps: &[FuncDep]) -> Vec<FuncDep> {
    classify(table, deps).bcnf_violations
}

pub fn third_nf_violations(table: &TableDef, deps: &[FuncDep]) -> Vec<FuncDep> {
    classify(table, deps).third_nf_violations
}

#[cfg(test)]
mod tests;
