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
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::Path;

pub use rusqlite::types::Value;

/// The reserved table that persists the declared functional dependencies.
pub const CATALOG_TABLE: &str = "FuncDep";

pub type Row = Vec<Value>;

#[derive(Debug, PartialEq)]
pub enum StorageError {
    UnknownTable(String),
    UnknownField(String),
    CatalogTable,
    AddTwice,
    Sql(String),
}

impl StorageError {
    pub fn unknown_table<T: ToString>(table_name: T) -> StorageError {
        StorageError::UnknownTable(table_name.to_string())
    }

    pub fn unknown_field<F: ToString>(field_name: F) -> StorageError {
        StorageError::UnknownField(field_name.to_string())
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(error: rusqlite::Error) -> StorageError {
        StorageError::Sql(error.to_string())
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::UnknownTable(table_name) => write!(f, "table \"{}\" does not exist", table_name),
            StorageError::UnknownField(field_name) => write!(f, "field \"{}\" does not exist", field_name),
            StorageError::CatalogTable => write!(f, "table \"{}\" is reserved for the catalog", CATALOG_TABLE),
            StorageError::AddTwice => write!(f, "dependency is already declared"),
            StorageError::Sql(message) => write!(f, "{}", message),
        }
    }
}

/// Double-quotes an identifier that comes from the store's own metadata or
/// from validated user input; values never go through this path, they are
/// bound as parameters.
fn quoted(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn projection_list(attributes: &[Attribute]) -> String {
    attributes
        .iter()
        .map(|attribute| quoted(attribute.as_str()))
        .collect::<Vec<String>>()
        .join(", ")
}

/// A session-long connection to one SQLite database. SQL statements commit
/// as they execute; `close` makes the final durability point explicit.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Store, StorageError> {
        log::debug!("opening store at {:?}", path.as_ref());
        Ok(Store {
            conn: Connection::open(path)?,
        })
    }

    /// Opens a fresh store at `path`, replacing whatever file was there, with
    /// an empty catalog table already in place.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Store, StorageError> {
        if path.as_ref().exists() {
            log::debug!("replacing existing store at {:?}", path.as_ref());
            fs::remove_file(path.as_ref()).map_err(|error| StorageError::Sql(error.to_string()))?;
        }
        let store = Store::open(path)?;
        store.init_catalog()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Store, StorageError> {
        Ok(Store {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn close(self) -> Result<(), StorageError> {
        self.conn.close().map_err(|(_conn, error)| StorageError::from(error))
    }

    pub fn tables(&self) -> Result<Vec<String>, StorageError> {
        let mut statement = self
            .conn
            .prepare("SELECT \"name\" FROM \"sqlite_master\" WHERE \"type\" = 'table' AND \"name\" NOT LIKE 'sqlite_%' ORDER BY \"name\"")?;
        let names = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, rusqlite::Error>>()?;
        Ok(names)
    }

    pub fn user_tables(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.tables()?.into_iter().filter(|name| name != CATALOG_TABLE).collect())
    }

    pub fn contains_table(&self, table_name: &str) -> Result<bool, StorageError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM \"sqlite_master\" WHERE \"type\" = 'table' AND \"name\" = ?1",
                params![table_name],
                |_row| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn table_definition(&self, table_name: &str) -> Result<TableDef, StorageError> {
        if table_name == CATALOG_TABLE {
            return Err(StorageError::CatalogTable);
        }
        if !self.contains_table(table_name)? {
            return Err(StorageError::unknown_table(table_name));
        }
        let mut statement = self
            .conn
            .prepare("SELECT \"name\", \"type\" FROM pragma_table_info(?1) ORDER BY \"cid\"")?;
        let columns = statement
            .query_map(params![table_name], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<(String, String)>, rusqlite::Error>>()?;
        Ok(TableDef::new(
            table_name,
            columns
                .into_iter()
                .enumerate()
                .map(|(ord_num, (name, sql_type))| ColumnDef::new(name, sql_type, ord_num))
                .collect(),
        ))
    }

    pub fn columns(&self, table_name: &str) -> Result<Vec<ColumnDef>, StorageError> {
        Ok(self.table_definition(table_name)?.columns().to_vec())
    }

    fn checked_projection(&self, table_name: &str, attributes: &[Attribute]) -> Result<String, StorageError> {
        let definition = self.table_definition(table_name)?;
        for attribute in attributes {
            if !definition.has_column(attribute.as_str()) {
                return Err(StorageError::unknown_field(attribute.as_str()));
            }
        }
        Ok(projection_list(attributes))
    }

    pub fn distinct_projection(&self, table_name: &str, attributes: &[Attribute]) -> Result<Vec<Row>, StorageError> {
        let projection = self.checked_projection(table_name, attributes)?;
        let sql = format!(
            "SELECT DISTINCT {projection} FROM {table} ORDER BY {projection}",
            projection = projection,
            table = quoted(table_name)
        );
        log::debug!("executing {}", sql);
        let mut statement = self.conn.prepare(&sql)?;
        let rows = statement
            .query_map([], |row| {
                (0..attributes.len()).map(|index| row.get::<_, Value>(index)).collect()
            })?
            .collect::<Result<Vec<Row>, rusqlite::Error>>()?;
        Ok(rows)
    }

    pub fn select_where(
        &self,
        table_name: &str,
        attributes: &[Attribute],
        conditions: &[(Attribute, Value)],
    ) -> Result<Vec<Row>, StorageError> {
        let projection = self.checked_projection(table_name, attributes)?;
        let condition_attributes = conditions.iter().map(|(attribute, _)| attribute.clone()).collect::<Vec<Attribute>>();
        self.checked_projection(table_name, &condition_attributes)?;
        let filter = conditions
            .iter()
            .enumerate()
            .map(|(index, (attribute, _))| format!("{} = ?{}", quoted(attribute.as_str()), index + 1))
            .collect::<Vec<String>>()
            .join(" AND ");
        let sql = format!(
            "SELECT DISTINCT {projection} FROM {table} WHERE {filter} ORDER BY {projection}",
            projection = projection,
            table = quoted(table_name),
            filter = filter
        );
        log::debug!("executing {}", sql);
        let mut statement = self.conn.prepare(&sql)?;
        let rows = statement
            .query_map(params_from_iter(conditions.iter().map(|(_, value)| value)), |row| {
                (0..attributes.len()).map(|index| row.get::<_, Value>(index)).collect()
            })?
            .collect::<Result<Vec<Row>, rusqlite::Error>>()?;
        Ok(rows)
    }

    fn has_catalog_table(&self) -> Result<bool, StorageError> {
        self.contains_table(CATALOG_TABLE)
    }

    /// The uniqueness constraint over the triple is what turns a duplicate
    /// declaration into a detectable conflict.
    pub fn init_catalog(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS \"FuncDep\" (\
                \"table\" TEXT NOT NULL, \
                \"lhs\" TEXT NOT NULL, \
                \"rhs\" TEXT NOT NULL, \
                UNIQUE (\"table\", \"lhs\", \"rhs\"))",
            [],
        )?;
        Ok(())
    }

    pub fn catalog_load(&self) -> Result<Vec<FuncDep>, StorageError> {
        if !self.has_catalog_table()? {
            return Ok(vec![]);
        }
        let mut statement = self
            .conn
            .prepare("SELECT \"table\", \"lhs\", \"rhs\" FROM \"FuncDep\" ORDER BY \"rowid\"")?;
        let deps = statement
            .query_map([], |row| {
                Ok(FuncDep::new(
                    row.get::<_, String>(0)?,
                    AttributeSet::parse(&row.get::<_, String>(1)?),
                    Attribute::from(row.get::<_, String>(2)?),
                ))
            })?
            .collect::<Result<Vec<FuncDep>, rusqlite::Error>>()?;
        Ok(deps)
    }

    pub fn catalog_load_for(&self, table_name: &str) -> Result<Vec<FuncDep>, StorageError> {
        Ok(self
            .catalog_load()?
            .into_iter()
            .filter(|dep| dep.table() == table_name)
            .collect())
    }

    /// Appends the canonical row for `dep`, creating the catalog table on the
    /// first declaration.
    pub fn catalog_append(&self, dep: &FuncDep) -> Result<(), StorageError> {
        self.init_catalog()?;
        let outcome = self.conn.execute(
            "INSERT INTO \"FuncDep\" (\"table\", \"lhs\", \"rhs\") VALUES (?1, ?2, ?3)",
            params![dep.table(), dep.lhs().to_string(), dep.rhs().as_str()],
        );
        match outcome {
            Ok(_) => {
                log::debug!("declared {}", dep);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(error, _)) if error.code == ErrorCode::ConstraintViolation => {
                Err(StorageError::AddTwice)
            }
            Err(error) => Err(StorageError::from(error)),
        }
    }

    /// Removes the canonical row for `dep`; reports whether a row was there.
    pub fn catalog_delete(&self, dep: &FuncDep) -> Result<bool, StorageError> {
        if !self.has_catalog_table()? {
            return Ok(false);
        }
        let deleted = self.conn.execute(
            "DELETE FROM \"FuncDep\" WHERE \"table\" = ?1 AND \"lhs\" = ?2 AND \"rhs\" = ?3",
            params![dep.table(), dep.lhs().to_string(), dep.rhs().as_str()],
        )?;
        if deleted > 0 {
            log::debug!("dropped {}", dep);
        }
        Ok(deleted > 0)
    }

    pub fn catalog_purge(&self) -> Result<(), StorageError> {
        if self.has_catalog_table()? {
            self.conn.execute("DELETE FROM \"FuncDep\"", [])?;
            log::debug!("catalog purged");
        }
        Ok(())
    }

    pub fn create_table(&self, definition: &TableDef) -> Result<(), StorageError> {
        let columns = definition
            .columns()
            .iter()
            .map(|column| {
                if column.sql_type().is_empty() {
                    quoted(column.name())
                } else {
                    format!("{} {}", quoted(column.name()), column.sql_type())
                }
            })
            .collect::<Vec<String>>()
            .join(", ");
        let sql = format!("CREATE TABLE {} ({})", quoted(definition.name()), columns);
        log::debug!("executing {}", sql);
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    pub fn insert_rows(&self, table_name: &str, rows: &[Row]) -> Result<(), StorageError> {
        let width = match rows.first() {
            Some(row) => row.len(),
            None => return Ok(()),
        };
        let placeholders = (1..=width).map(|index| format!("?{}", index)).collect::<Vec<String>>().join(", ");
        let sql = format!("INSERT INTO {} VALUES ({})", quoted(table_name), placeholders);
        let mut statement = self.conn.prepare(&sql)?;
        for row in rows {
            statement.execute(params_from_iter(row.iter()))?;
        }
        log::debug!("{} rows written into {}", rows.len(), table_name);
        Ok(())
    }

    /// Runs a batch of semicolon-separated statements, e.g. a schema file.
    pub fn execute_script(&self, sql: &str) -> Result<(), StorageError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
