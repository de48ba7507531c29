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

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::iter::FromIterator;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attribute(String);

impl Attribute {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Attribute {
    fn from(name: &str) -> Attribute {
        Attribute(name.to_owned())
    }
}

impl From<String> for Attribute {
    fn from(name: String) -> Attribute {
        Attribute(name)
    }
}

impl AsRef<str> for Attribute {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An unordered set of attributes. The textual form is whitespace-separated
/// attribute names; duplicates collapse and token order does not matter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeSet {
    attributes: BTreeSet<Attribute>,
}

impl AttributeSet {
    pub fn new() -> AttributeSet {
        AttributeSet::default()
    }

    pub fn parse(text: &str) -> AttributeSet {
        text.split_whitespace().map(Attribute::from).collect()
    }

    pub fn contains(&self, attribute: &Attribute) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn is_subset_of(&self, other: &AttributeSet) -> bool {
        self.attributes.is_subset(&other.attributes)
    }

    pub fn union(&self, other: &AttributeSet) -> AttributeSet {
        self.attributes.union(&other.attributes).cloned().collect()
    }

    pub fn difference(&self, other: &AttributeSet) -> AttributeSet {
        self.attributes.difference(&other.attributes).cloned().collect()
    }

    pub fn with(&self, attribute: Attribute) -> AttributeSet {
        let mut attributes = self.attributes.clone();
        attributes.insert(attribute);
        AttributeSet { attributes }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> AttributeSet {
        AttributeSet {
            attributes: iter.into_iter().collect(),
        }
    }
}

impl From<&str> for AttributeSet {
    fn from(text: &str) -> AttributeSet {
        AttributeSet::parse(text)
    }
}

impl Display for AttributeSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut attributes = self.attributes.iter();
        if let Some(first) = attributes.next() {
            write!(f, "{}", first)?;
            for attribute in attributes {
                write!(f, " {}", attribute)?;
            }
        }
        Ok(())
    }
}

/// A functional dependency over a single table: whenever two rows agree on
/// every `lhs` attribute they must agree on the `rhs` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDep {
    table: String,
    lhs: AttributeSet,
    rhs: Attribute,
}

impl FuncDep {
    pub fn new<T: ToString>(table: T, lhs: AttributeSet, rhs: Attribute) -> FuncDep {
        FuncDep {
            table: table.to_string(),
            lhs,
            rhs,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn lhs(&self) -> &AttributeSet {
        &self.lhs
    }

    pub fn rhs(&self) -> &Attribute {
        &self.rhs
    }

    pub fn attributes(&self) -> AttributeSet {
        self.lhs.with(self.rhs.clone())
    }
}

impl Display for FuncDep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.table, self.lhs, self.rhs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    name: String,
    sql_type: String,
    ord_num: usize,
}

impl ColumnDef {
    pub fn new<N: ToString, S: ToString>(name: N, sql_type: S, ord_num: usize) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            ord_num,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn index(&self) -> usize {
        self.ord_num
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    name: String,
    columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new<N: ToString>(name: N, columns: Vec<ColumnDef>) -> TableDef {
        TableDef {
            name: name.to_string(),
            columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    pub fn has_column(&self, column_name: &str) -> bool {
        self.columns.iter().any(|column| column.name == column_name)
    }

    pub fn attributes(&self) -> AttributeSet {
        self.columns.iter().map(|column| Attribute::from(column.name.as_str())).collect()
    }

    /// Columns of this table that belong to `wanted`, in declaration order.
    pub fn columns_among(&self, wanted: &AttributeSet) -> Vec<ColumnDef> {
        self.columns
            .iter()
            .filter(|column| wanted.contains(&Attribute::from(column.name.as_str())))
            .cloned()
            .collect()
    }
}
