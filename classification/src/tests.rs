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
use definition::{Attribute, AttributeSet, ColumnDef};

fn trips_table() -> TableDef {
    TableDef::new(
        "TRIPS",
        vec![
            ColumnDef::new("Date", "TEXT", 0),
            ColumnDef::new("Number_Plate", "TEXT", 1),
            ColumnDef::new("Departure_Time", "TEXT", 2),
            ColumnDef::new("Driver", "TEXT", 3),
            ColumnDef::new("Destination", "TEXT", 4),
        ],
    )
}

fn dep(lhs: &str, rhs: &str) -> FuncDep {
    FuncDep::new("TRIPS", AttributeSet::parse(lhs), Attribute::from(rhs))
}

fn date_determines_everything() -> Vec<FuncDep> {
    vec![
        dep("Date", "Departure_Time"),
        dep("Date", "Destination"),
        dep("Date", "Number_Plate"),
        dep("Date", "Driver"),
    ]
}

#[test]
fn key_determinants_violate_nothing() {
    let classification = classify(&trips_table(), &date_determines_everything());

    assert!(classification.is_bcnf());
    assert!(classification.is_third_nf());
}

#[test]
fn non_key_determinant_with_rhs_outside_candidate_keys() {
    let mut deps = date_determines_everything();
    deps.push(dep("Driver", "Destination"));

    let classification = classify(&trips_table(), &deps);
    assert!(!classification.is_bcnf());
    assert!(!classification.is_third_nf());
    assert_eq!(classification.bcnf_violations(), &[dep("Driver", "Destination")]);
    assert_eq!(classification.third_nf_violations(), &[dep("Driver", "Destination")]);
}

#[test]
fn rhs_inside_a_candidate_key_is_tolerated_by_third_nf() {
    // candidate keys are {Date, Driver} and {Date, Destination}; Driver -> Destination
    // is not a key determinant, but Destination sits inside a candidate key
    let table = TableDef::new(
        "TRIPS",
        vec![
            ColumnDef::new("Date", "TEXT", 0),
            ColumnDef::new("Driver", "TEXT", 1),
            ColumnDef::new("Destination", "TEXT", 2),
        ],
    );
    let deps = vec![dep("Date Driver", "Destination"), dep("Driver", "Destination"), dep("Destination", "Driver")];

    let classification = classify(&table, &deps);
    assert!(!classification.is_bcnf());
    assert!(classification.is_third_nf());
    assert_eq!(
        classification.bcnf_violations(),
        &[dep("Driver", "Destination"), dep("Destination", "Driver")]
    );
}

#[test]
fn violations_keep_catalog_order() {
    let mut deps = date_determines_everything();
    deps.push(dep("Driver", "Destination"));
    deps.push(dep("Departure_Time", "Destination"));

    assert_eq!(
        third_nf_violations(&trips_table(), &deps),
        vec![dep("Driver", "Destination"), dep("Departure_Time", "Destination")]
    );
}

#[test]
fn tables_without_dependencies_are_in_both_normal_forms() {
    let classification = classify(&trips_table(), &[]);

    assert!(classification.is_bcnf());
    assert!(classification.is_third_nf());
}
