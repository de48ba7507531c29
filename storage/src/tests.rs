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

use super::*;

fn bus_store() -> Store {
    let store = Store::in_memory().expect("in memory store is always available");
    store
        .execute_script(
            "CREATE TABLE BUSES (Number_Plate TEXT, Chassis TEXT, Make TEXT, Mileage INTEGER);\
             INSERT INTO BUSES VALUES ('DDT 123', 'XGUR6775', 'Renault', 212342);\
             INSERT INTO BUSES VALUES ('DDT 456', 'XGUR6775', 'Mercedes', 212350);\
             INSERT INTO BUSES VALUES ('DDT 789', 'YHAL1200', 'Renault', 100);",
        )
        .expect("schema script is valid");
    store
}

fn attributes(names: &[&str]) -> Vec<Attribute> {
    names.iter().map(|name| Attribute::from(*name)).collect()
}

fn dep(table: &str, lhs: &str, rhs: &str) -> FuncDep {
    FuncDep::new(table, AttributeSet::parse(lhs), Attribute::from(rhs))
}

fn text(value: &str) -> Value {
    Value::Text(value.to_owned())
}

#[test]
fn catalog_table_is_hidden_from_user_tables() {
    let store = bus_store();
    store.init_catalog().unwrap();

    assert_eq!(store.tables(), Ok(vec!["BUSES".to_owned(), CATALOG_TABLE.to_owned()]));
    assert_eq!(store.user_tables(), Ok(vec!["BUSES".to_owned()]));
}

#[test]
fn columns_come_back_in_declaration_order_with_types() {
    let store = bus_store();

    let columns = store.columns("BUSES").unwrap();
    assert_eq!(
        columns.iter().map(|column| (column.name(), column.sql_type())).collect::<Vec<_>>(),
        vec![
            ("Number_Plate", "TEXT"),
            ("Chassis", "TEXT"),
            ("Make", "TEXT"),
            ("Mileage", "INTEGER")
        ]
    );
}

#[test]
fn columns_of_an_absent_table() {
    let store = bus_store();

    assert_eq!(store.columns("TRAMS"), Err(StorageError::unknown_table("TRAMS")));
}

#[test]
fn columns_of_the_catalog_table_are_off_limits() {
    let store = bus_store();
    store.init_catalog().unwrap();

    assert_eq!(store.columns(CATALOG_TABLE), Err(StorageError::CatalogTable));
}

#[test]
fn distinct_projection_collapses_duplicates() {
    let store = bus_store();

    assert_eq!(
        store.distinct_projection("BUSES", &attributes(&["Chassis"])),
        Ok(vec![vec![text("XGUR6775")], vec![text("YHAL1200")]])
    );
}

#[test]
fn distinct_projection_of_an_unknown_field() {
    let store = bus_store();

    assert_eq!(
        store.distinct_projection("BUSES", &attributes(&["Color"])),
        Err(StorageError::unknown_field("Color"))
    );
}

#[test]
fn select_where_filters_by_bound_values() {
    let store = bus_store();

    assert_eq!(
        store.select_where(
            "BUSES",
            &attributes(&["Make"]),
            &[(Attribute::from("Chassis"), text("XGUR6775"))],
        ),
        Ok(vec![vec![text("Mercedes")], vec![text("Renault")]])
    );
}

#[test]
fn quoting_survives_awkward_identifiers() {
    let store = Store::in_memory().unwrap();
    store
        .execute_script("CREATE TABLE \"odd table\" (\"odd \"\"field\"\"\" TEXT); INSERT INTO \"odd table\" VALUES ('x');")
        .unwrap();

    assert_eq!(
        store.distinct_projection("odd table", &attributes(&["odd \"field\""])),
        Ok(vec![vec![text("x")]])
    );
}

#[test]
fn catalog_starts_empty_even_before_the_table_exists() {
    let store = bus_store();

    assert_eq!(store.catalog_load(), Ok(vec![]));
}

#[test]
fn appended_dependencies_come_back_in_insertion_order() {
    let store = bus_store();
    store.catalog_append(&dep("BUSES", "Number_Plate", "Chassis")).unwrap();
    store.catalog_append(&dep("BUSES", "Chassis", "Make")).unwrap();
    store.catalog_append(&dep("TRIPS", "Date", "Driver")).unwrap();

    assert_eq!(
        store.catalog_load(),
        Ok(vec![
            dep("BUSES", "Number_Plate", "Chassis"),
            dep("BUSES", "Chassis", "Make"),
            dep("TRIPS", "Date", "Driver"),
        ])
    );
    assert_eq!(
        store.catalog_load_for("TRIPS"),
        Ok(vec![dep("TRIPS", "Date", "Driver")])
    );
}

#[test]
fn appending_the_same_dependency_twice() {
    let store = bus_store();
    store.catalog_append(&dep("BUSES", "Chassis Number_Plate", "Make")).unwrap();

    assert_eq!(
        store.catalog_append(&dep("BUSES", "Number_Plate Chassis", "Make")),
        Err(StorageError::AddTwice)
    );
}

#[test]
fn deleting_a_dependency_reports_whether_it_was_there() {
    let store = bus_store();
    store.catalog_append(&dep("BUSES", "Chassis", "Make")).unwrap();

    assert_eq!(store.catalog_delete(&dep("BUSES", "Chassis", "Make")), Ok(true));
    assert_eq!(store.catalog_delete(&dep("BUSES", "Chassis", "Make")), Ok(false));
}

#[test]
fn purge_empties_the_catalog() {
    let store = bus_store();
    store.catalog_append(&dep("BUSES", "Chassis", "Make")).unwrap();
    store.catalog_purge().unwrap();

    assert_eq!(store.catalog_load(), Ok(vec![]));
}

#[test]
fn created_tables_round_trip_rows() {
    let store = Store::in_memory().unwrap();
    store
        .create_table(&TableDef::new(
            "BUSES_0",
            vec![ColumnDef::new("Chassis", "TEXT", 0), ColumnDef::new("Mileage", "INTEGER", 1)],
        ))
        .unwrap();
    store
        .insert_rows(
            "BUSES_0",
            &[
                vec![text("XGUR6775"), Value::Integer(212342)],
                vec![text("YHAL1200"), Value::Integer(100)],
            ],
        )
        .unwrap();

    assert_eq!(
        store.distinct_projection("BUSES_0", &attributes(&["Chassis", "Mileage"])),
        Ok(vec![
            vec![text("XGUR6775"), Value::Integer(212342)],
            vec![text("YHAL1200"), Value::Integer(100)],
        ])
    );
}

#[test]
fn create_replaces_a_previous_store_file() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("normalize.sqlite");

    let first = Store::create(&path).unwrap();
    first.execute_script("CREATE TABLE LEFTOVER (x TEXT);").unwrap();
    first.close().unwrap();

    let second = Store::create(&path).unwrap();
    assert_eq!(second.tables(), Ok(vec![CATALOG_TABLE.to_owned()]));
    second.close().unwrap();
}

#[test]
fn closed_stores_keep_their_data() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("fleet.sqlite");

    let store = Store::open(&path).unwrap();
    store.execute_script("CREATE TABLE BUSES (Number_Plate TEXT); INSERT INTO BUSES VALUES ('DDT 123');").unwrap();
    store.catalog_append(&dep("BUSES", "Number_Plate", "Chassis")).unwrap();
    store.close().unwrap();

    let reopened = Store::open(&path).unwrap();
    assert_eq!(reopened.user_tables(), Ok(vec!["BUSES".to_owned()]));
    assert_eq!(reopened.catalog_load().unwrap().len(), 1);
}
