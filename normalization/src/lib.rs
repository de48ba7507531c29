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

use definition::{Attribute, AttributeSet, ColumnDef, FuncDep, TableDef};
use storage::{Row, StorageError, Store};
use std::path::Path;

/// The decomposed database is written next to the process, replacing any
/// previous run.
pub const OUTPUT_STORE: &str = "normalize.sqlite";

/// One table of the decomposition: a projected schema, its distinct rows and
/// the dependencies it inherits. The final name is assigned only when the
/// descriptor is written out.
#[derive(Debug, PartialEq)]
pub struct DecomposedTable {
    columns: Vec<ColumnDef>,
    rows: Vec<Row>,
    deps: Vec<(AttributeSet, Attribute)>,
}

impl DecomposedTable {
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn deps(&self) -> &[(AttributeSet, Attribute)] {
        &self.deps
    }
}

fn attribute_names(columns: &[ColumnDef]) -> Vec<Attribute> {
    columns.iter().map(|column| Attribute::from(column.name())).collect()
}

fn reindexed(columns: Vec<ColumnDef>) -> Vec<ColumnDef> {
    columns
        .into_iter()
        .enumerate()
        .map(|(ord_num, column)| ColumnDef::new(column.name(), column.sql_type(), ord_num))
        .collect()
}

/// Splits one table along its 3NF violations. Every violating dependency
/// becomes its own table holding `lhs ∪ {rhs}`; the remnant keeps the
/// surviving columns and the dependencies that were not split away.
pub fn decompose_table(store: &Store, table: &TableDef) -> Result<Vec<DecomposedTable>, StorageError> {
    let deps = store.catalog_load_for(table.name())?;
    let violations = classification::third_nf_violations(table, &deps);

    let mut remaining = deps;
    let mut pool: Vec<ColumnDef> = table.columns().to_vec();
    let mut parts = vec![];
    for violation in violations {
        let columns = reindexed(table.columns_among(&violation.attributes()));
        let rows = store.distinct_projection(table.name(), &attribute_names(&columns))?;
        parts.push(DecomposedTable {
            columns,
            rows,
            deps: vec![(violation.lhs().clone(), violation.rhs().clone())],
        });
        pool.retain(|column| !column.has_name(violation.rhs().as_str()));
        remaining.retain(|dep| dep != &violation);
    }

    if pool.is_empty() {
        log::warn!("every column of {} was split away, no remnant table is left", table.name());
    } else {
        let columns = reindexed(pool);
        let rows = store.distinct_projection(table.name(), &attribute_names(&columns))?;
        parts.push(DecomposedTable {
            columns,
            rows,
            deps: remaining
                .into_iter()
                .map(|dep| (dep.lhs().clone(), dep.rhs().clone()))
                .collect(),
        });
    }
    Ok(parts)
}

/// Decomposes every user table of `store` into a fresh store at `output`.
/// The k-th part of table T lands as table `T_k` together with its rows and
/// its inherited dependencies, re-keyed to the new name.
pub fn normalize(store: &Store, output: &Path) -> Result<(), StorageError> {
    let target = Store::create(output)?;
    let outcome = write_decomposition(store, &target);
    match outcome {
        Ok(()) => target.close(),
        Err(error) => {
            // release the output store before surfacing the failure
            let _ = target.close();
            Err(error)
        }
    }
}

fn write_decomposition(store: &Store, target: &Store) -> Result<(), StorageError> {
    for table_name in store.user_tables()? {
        let table = store.table_definition(&table_name)?;
        for (index, part) in decompose_table(store, &table)?.into_iter().enumerate() {
            let part_name = format!("{}_{}", table_name, index);
            log::debug!("emitting {} with {} columns", part_name, part.columns.len());
            target.create_table(&TableDef::new(part_name.as_str(), part.columns))?;
            target.insert_rows(&part_name, &part.rows)?;
            for (lhs, rhs) in part.deps {
                target.catalog_append(&FuncDep::new(part_name.as_str(), lhs, rhs))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
