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
use storage::{StorageError, Store, CATALOG_TABLE};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, PartialEq)]
pub enum CatalogError {
    UnknownTable(String),
    UnknownField(String),
    CatalogTable,
    NotSingular(String),
    EmptyLhs,
    RhsInLhs(String),
    AddTwice(String),
    NotFound(String),
    Storage(String),
}

impl CatalogError {
    pub fn unknown_table<T: ToString>(table_name: T) -> CatalogError {
        CatalogError::UnknownTable(table_name.to_string())
    }

    pub fn unknown_field<F: ToString>(field_name: F) -> CatalogError {
        CatalogError::UnknownField(field_name.to_string())
    }

    pub fn not_singular<R: ToString>(rhs: R) -> CatalogError {
        CatalogError::NotSingular(rhs.to_string())
    }

    pub fn rhs_in_lhs<R: ToString>(rhs: R) -> CatalogError {
        CatalogError::RhsInLhs(rhs.to_string())
    }

    pub fn add_twice(dep: &FuncDep) -> CatalogError {
        CatalogError::AddTwice(dep.to_string())
    }

    pub fn not_found(dep: &FuncDep) -> CatalogError {
        CatalogError::NotFound(dep.to_string())
    }
}

impl From<StorageError> for CatalogError {
    fn from(error: StorageError) -> CatalogError {
        match error {
            StorageError::UnknownTable(table_name) => CatalogError::UnknownTable(table_name),
            StorageError::UnknownField(field_name) => CatalogError::UnknownField(field_name),
            StorageError::CatalogTable => CatalogError::CatalogTable,
            StorageError::AddTwice => CatalogError::Storage("unchecked duplicate declaration".to_owned()),
            StorageError::Sql(message) => CatalogError::Storage(message),
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::UnknownTable(table_name) => write!(f, "table \"{}\" does not exist", table_name),
            CatalogError::UnknownField(field_name) => write!(f, "field \"{}\" does not exist", field_name),
            CatalogError::CatalogTable => write!(f, "table \"{}\" is reserved for the catalog", CATALOG_TABLE),
            CatalogError::NotSingular(rhs) => {
                write!(f, "right-hand side \"{}\" must be a single attribute", rhs)
            }
            CatalogError::EmptyLhs => write!(f, "left-hand side must name at least one attribute"),
            CatalogError::RhsInLhs(rhs) => {
                write!(f, "right-hand side \"{}\" already appears on the left-hand side", rhs)
            }
            CatalogError::AddTwice(dep) => write!(f, "dependency {} is already declared", dep),
            CatalogError::NotFound(dep) => write!(f, "dependency {} is not declared", dep),
            CatalogError::Storage(message) => write!(f, "{}", message),
        }
    }
}

/// Owns every mutation of the persisted dependency catalog. Reads go
/// straight through to the store; writes are validated here first, so an
/// invalid declaration never reaches the catalog table.
pub struct FuncDepCatalog<'s> {
    store: &'s Store,
}

impl<'s> From<&'s Store> for FuncDepCatalog<'s> {
    fn from(store: &'s Store) -> FuncDepCatalog<'s> {
        FuncDepCatalog { store }
    }
}

impl<'s> FuncDepCatalog<'s> {
    fn parse_dep(&self, table_name: &str, lhs: &str, rhs: &str) -> Result<FuncDep, CatalogError> {
        if table_name == CATALOG_TABLE {
            return Err(CatalogError::CatalogTable);
        }
        if !self.store.contains_table(table_name)? {
            return Err(CatalogError::unknown_table(table_name));
        }
        let mut rhs_tokens = rhs.split_whitespace();
        let rhs_attribute = match (rhs_tokens.next(), rhs_tokens.next()) {
            (Some(single), None) => Attribute::from(single),
            _ => return Err(CatalogError::not_singular(rhs)),
        };
        let lhs_attributes = AttributeSet::parse(lhs);
        if lhs_attributes.is_empty() {
            return Err(CatalogError::EmptyLhs);
        }
        Ok(FuncDep::new(table_name, lhs_attributes, rhs_attribute))
    }

    pub fn add(&self, table_name: &str, lhs: &str, rhs: &str) -> Result<FuncDep, CatalogError> {
        let dep = self.parse_dep(table_name, lhs, rhs)?;
        let definition = self.store.table_definition(table_name)?;
        for attribute in dep.lhs().iter() {
            if !definition.has_column(attribute.as_str()) {
                return Err(CatalogError::unknown_field(attribute.as_str()));
            }
        }
        if !definition.has_column(dep.rhs().as_str()) {
            return Err(CatalogError::unknown_field(dep.rhs().as_str()));
        }
        if dep.lhs().contains(dep.rhs()) {
            return Err(CatalogError::rhs_in_lhs(dep.rhs().as_str()));
        }
        match self.store.catalog_append(&dep) {
            Ok(()) => Ok(dep),
            Err(StorageError::AddTwice) => Err(CatalogError::add_twice(&dep)),
            Err(error) => Err(CatalogError::from(error)),
        }
    }

    pub fn delete(&self, table_name: &str, lhs: &str, rhs: &str) -> Result<FuncDep, CatalogError> {
        let dep = self.parse_dep(table_name, lhs, rhs)?;
        if self.store.catalog_delete(&dep)? {
            Ok(dep)
        } else {
            Err(CatalogError::not_found(&dep))
        }
    }

    pub fn list(&self) -> Result<Vec<FuncDep>, CatalogError> {
        Ok(self.store.catalog_load()?)
    }

    pub fn list_for(&self, table_name: &str) -> Result<Vec<FuncDep>, CatalogError> {
        if !self.store.contains_table(table_name)? {
            return Err(CatalogError::unknown_table(table_name));
        }
        Ok(self.store.catalog_load_for(table_name)?)
    }

    pub fn purge(&self) -> Result<(), CatalogError> {
        Ok(self.store.catalog_purge()?)
    }

    /// Drops every declaration that no longer matches the store schema:
    /// its table vanished, or one of its attributes is not a column anymore.
    /// Returns the dropped declarations.
    pub fn reconcile(&self) -> Result<Vec<FuncDep>, CatalogError> {
        let mut dropped = vec![];
        for dep in self.store.catalog_load()? {
            if self.refers_to_stored_schema(&dep)? {
                continue;
            }
            self.store.catalog_delete(&dep)?;
            log::debug!("reconcile dropped {}", dep);
            dropped.push(dep);
        }
        Ok(dropped)
    }

    fn refers_to_stored_schema(&self, dep: &FuncDep) -> Result<bool, CatalogError> {
        if dep.table() == CATALOG_TABLE || !self.store.contains_table(dep.table())? {
            return Ok(false);
        }
        let definition = self.store.table_definition(dep.table())?;
        Ok(dep.attributes().iter().all(|attribute| definition.has_column(attribute.as_str())))
    }

    /// Deletes derivable declarations one at a time, in catalog order, until
    /// none of the remaining ones follows from the others. Each pass shrinks
    /// the catalog, so this terminates. Returns the removed declarations.
    pub fn clean_redundant(&self) -> Result<Vec<FuncDep>, CatalogError> {
        let mut removed = vec![];
        loop {
            let deps = self.store.catalog_load()?;
            match deps.iter().find(|dep| derivation::is_redundant(&deps, dep)) {
                Some(dep) => {
                    self.store.catalog_delete(dep)?;
                    log::debug!("removed derivable {}", dep);
                    removed.push(dep.clone());
                }
                None => return Ok(removed),
            }
        }
    }

    pub fn clean(&self) -> Result<Vec<FuncDep>, CatalogError> {
        let mut removed = self.reconcile()?;
        removed.extend(self.clean_redundant()?);
        Ok(removed)
    }
}
