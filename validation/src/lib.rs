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

use definition::{Attribute, FuncDep};
use storage::{Row, StorageError, Store};

/// One declared dependency checked against the stored rows. An empty
/// `conflicting_rows` means the data respects the dependency.
#[derive(Debug, PartialEq)]
pub struct CheckReport {
    dep: FuncDep,
    conflicting_rows: Vec<Row>,
}

impl CheckReport {
    pub fn dep(&self) -> &FuncDep {
        &self.dep
    }

    pub fn conflicting_rows(&self) -> &[Row] {
        &self.conflicting_rows
    }

    pub fn holds(&self) -> bool {
        self.conflicting_rows.is_empty()
    }
}

/// Checks every declared dependency, in catalog order.
pub fn check_all(store: &Store) -> Result<Vec<CheckReport>, StorageError> {
    let deps = store.catalog_load()?;
    deps.into_iter().map(|dep| check_dep(store, dep)).collect()
}

/// Checks the dependencies declared over one table.
pub fn check_table(store: &Store, table_name: &str) -> Result<Vec<CheckReport>, StorageError> {
    if !store.contains_table(table_name)? {
        return Err(StorageError::unknown_table(table_name));
    }
    let deps = store.catalog_load_for(table_name)?;
    deps.into_iter().map(|dep| check_dep(store, dep)).collect()
}

/// A dependency is violated at a left-hand-side value when the stored rows
/// hold more than one distinct right-hand-side value for it. The report
/// gathers the full conflicting rows across every such value.
fn check_dep(store: &Store, dep: FuncDep) -> Result<CheckReport, StorageError> {
    log::debug!("checking {}", dep);
    let definition = store.table_definition(dep.table())?;
    let all_columns = definition
        .column_names()
        .into_iter()
        .map(Attribute::from)
        .collect::<Vec<Attribute>>();
    let lhs = dep.lhs().iter().cloned().collect::<Vec<Attribute>>();

    let mut conflicting_rows = vec![];
    for lhs_row in store.distinct_projection(dep.table(), &lhs)? {
        let conditions = lhs.iter().cloned().zip(lhs_row.into_iter()).collect::<Vec<_>>();
        let rhs_values = store.select_where(dep.table(), &[dep.rhs().clone()], &conditions)?;
        if rhs_values.len() > 1 {
            conflicting_rows.extend(store.select_where(dep.table(), &all_columns, &conditions)?);
        }
    }
    Ok(CheckReport { dep, conflicting_rows })
}
