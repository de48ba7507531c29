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
use storage::Value;

fn trip_store() -> Store {
    let store = Store::in_memory().expect("in memory store is always available");
    store
        .execute_script(
            "CREATE TABLE TRIPS (Date TEXT, Number_Plate TEXT, Departure_Time TEXT, Driver TEXT, Destination TEXT);\
             INSERT INTO TRIPS VALUES ('2021-01-04', 'DDT 123', '08:00', 'Sam', 'Namur');\
             INSERT INTO TRIPS VALUES ('2021-01-05', 'DDT 456', '09:30', 'Sam', 'Namur');\
             INSERT INTO TRIPS VALUES ('2021-01-06', 'DDT 789', '07:15', 'Alex', 'Liege');",
        )
        .expect("schema script is valid");
    for rhs in &["Departure_Time", "Destination", "Number_Plate", "Driver"] {
        store
            .catalog_append(&FuncDep::new("TRIPS", AttributeSet::parse("Date"), Attribute::from(*rhs)))
            .unwrap();
    }
    store
}

fn text(value: &str) -> Value {
    Value::Text(value.to_owned())
}

fn column_names(part: &DecomposedTable) -> Vec<&str> {
    part.columns().iter().map(ColumnDef::name).collect()
}

#[test]
fn a_third_nf_table_stays_in_one_piece() {
    let store = trip_store();
    let table = store.table_definition("TRIPS").unwrap();

    let parts = decompose_table(&store, &table).unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(
        column_names(&parts[0]),
        vec!["Date", "Number_Plate", "Departure_Time", "Driver", "Destination"]
    );
    assert_eq!(parts[0].rows().len(), 3);
    assert_eq!(parts[0].deps().len(), 4);
}

#[test]
fn a_violating_dependency_is_split_into_its_own_table() {
    let store = trip_store();
    store
        .catalog_append(&FuncDep::new("TRIPS", AttributeSet::parse("Driver"), Attribute::from("Destination")))
        .unwrap();
    let table = store.table_definition("TRIPS").unwrap();

    let parts = decompose_table(&store, &table).unwrap();
    assert_eq!(parts.len(), 2);

    // the split table carries lhs ∪ {rhs} and the one dependency
    assert_eq!(column_names(&parts[0]), vec!["Driver", "Destination"]);
    assert_eq!(
        parts[0].rows(),
        &[vec![text("Alex"), text("Liege")], vec![text("Sam"), text("Namur")]]
    );
    assert_eq!(
        parts[0].deps(),
        &[(AttributeSet::parse("Driver"), Attribute::from("Destination"))]
    );

    // the remnant loses the split-away rhs column but keeps the other deps
    assert_eq!(
        column_names(&parts[1]),
        vec!["Date", "Number_Plate", "Departure_Time", "Driver"]
    );
    assert_eq!(parts[1].rows().len(), 3);
    assert_eq!(parts[1].deps().len(), 4);
}

#[test]
fn split_tables_project_distinct_rows() {
    let store = trip_store();
    store
        .execute_script("INSERT INTO TRIPS VALUES ('2021-01-07', 'DDT 123', '08:00', 'Sam', 'Namur');")
        .unwrap();
    store
        .catalog_append(&FuncDep::new("TRIPS", AttributeSet::parse("Driver"), Attribute::from("Destination")))
        .unwrap();
    let table = store.table_definition("TRIPS").unwrap();

    let parts = decompose_table(&store, &table).unwrap();
    // four source rows, two distinct (Driver, Destination) pairs
    assert_eq!(parts[0].rows().len(), 2);
}

#[test]
fn normalize_writes_every_part_into_a_fresh_store() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join(OUTPUT_STORE);
    let store = trip_store();
    store
        .catalog_append(&FuncDep::new("TRIPS", AttributeSet::parse("Driver"), Attribute::from("Destination")))
        .unwrap();

    normalize(&store, &output).unwrap();

    let normalized = Store::open(&output).unwrap();
    assert_eq!(normalized.user_tables(), Ok(vec!["TRIPS_0".to_owned(), "TRIPS_1".to_owned()]));
    assert_eq!(
        normalized
            .columns("TRIPS_0")
            .unwrap()
            .iter()
            .map(|column| (column.name().to_owned(), column.sql_type().to_owned()))
            .collect::<Vec<_>>(),
        vec![("Driver".to_owned(), "TEXT".to_owned()), ("Destination".to_owned(), "TEXT".to_owned())]
    );
    assert_eq!(
        normalized.distinct_projection(
            "TRIPS_0",
            &[Attribute::from("Driver"), Attribute::from("Destination")]
        ),
        Ok(vec![vec![text("Alex"), text("Liege")], vec![text("Sam"), text("Namur")]])
    );

    let inherited = normalized.catalog_load().unwrap();
    assert_eq!(
        inherited[0],
        FuncDep::new("TRIPS_0", AttributeSet::parse("Driver"), Attribute::from("Destination"))
    );
    assert_eq!(inherited.len(), 5);
    for dep in &inherited[1..] {
        assert_eq!(dep.table(), "TRIPS_1");
        assert_eq!(dep.lhs(), &AttributeSet::parse("Date"));
    }
}

#[test]
fn normalize_replaces_the_previous_output_store() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join(OUTPUT_STORE);
    let store = trip_store();

    normalize(&store, &output).unwrap();
    normalize(&store, &output).unwrap();

    let normalized = Store::open(&output).unwrap();
    assert_eq!(normalized.user_tables(), Ok(vec!["TRIPS_0".to_owned()]));
}
