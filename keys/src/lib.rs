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

use definition::{Attribute, AttributeSet, FuncDep, TableDef};

/// Attributes of one table (and of its declared dependencies) enumerated as
/// bit positions, so that attribute sets become `u64` masks with trivial
/// subset tests. Table columns occupy the low bits in declaration order.
struct AttributeSpace {
    attributes: Vec<Attribute>,
    table_mask: u64,
    deps: Vec<(u64, u64)>,
}

impl AttributeSpace {
    fn new(table: &TableDef, deps: &[FuncDep]) -> AttributeSpace {
        let mut attributes: Vec<Attribute> = table
            .columns()
            .iter()
            .map(|column| Attribute::from(column.name()))
            .collect();
        for dep in deps {
            for attribute in dep.attributes().iter() {
                if !attributes.contains(attribute) {
                    attributes.push(attribute.clone());
                }
            }
        }
        assert!(
            attributes.len() <= 64,
            "attribute space of table {} does not fit in a 64-bit mask",
            table.name()
        );

        let table_mask = match table.columns().len() {
            0 => 0,
            columns => u64::MAX >> (64 - columns),
        };
        // safe to unwrap below, every dependency attribute was enumerated above
        let position =
            |attribute: &Attribute, attributes: &[Attribute]| attributes.iter().position(|known| known == attribute);
        let deps = deps
            .iter()
            .map(|dep| {
                let lhs = dep
                    .lhs()
                    .iter()
                    .map(|attribute| 1u64 << position(attribute, &attributes).unwrap())
                    .fold(0, |mask, bit| mask | bit);
                let rhs = 1u64 << position(dep.rhs(), &attributes).unwrap();
                (lhs, rhs)
            })
            .collect();

        AttributeSpace {
            attributes,
            table_mask,
            deps,
        }
    }

    fn mask_of(&self, attributes: &AttributeSet) -> u64 {
        attributes
            .iter()
            .filter_map(|attribute| self.attributes.iter().position(|known| known == attribute))
            .fold(0, |mask, index| mask | 1u64 << index)
    }

    fn set_of(&self, mask: u64) -> AttributeSet {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(index, _)| mask & (1u64 << index) != 0)
            .map(|(_, attribute)| attribute.clone())
            .collect()
    }

    fn closure_of(&self, mask: u64) -> u64 {
        let mut result = mask;
        let mut growing = true;
        while growing {
            growing = false;
            for (lhs, rhs) in &self.deps {
                if result & lhs == *lhs && result & rhs != *rhs {
                    result |= rhs;
                    growing = true;
                }
            }
        }
        result
    }

    fn covers_table(&self, mask: u64) -> bool {
        self.closure_of(mask) & self.table_mask == self.table_mask
    }
}

pub fn is_key(table: &TableDef, deps: &[FuncDep], candidate: &AttributeSet) -> bool {
    let space = AttributeSpace::new(table, deps);
    space.covers_table(space.mask_of(candidate))
}

/// Every subset of the table's attributes whose closure covers the whole
/// table. Enumeration counts through the powerset of the column set.
pub fn superkeys(table: &TableDef, deps: &[FuncDep]) -> Vec<AttributeSet> {
    let space = AttributeSpace::new(table, deps);
    let mut found = vec![];
    for mask in 0..=space.table_mask {
        if space.covers_table(mask) {
            found.push(space.set_of(mask));
        }
    }
    found.sort_by(|this, that| this.len().cmp(&that.len()).then_with(|| this.to_string().cmp(&that.to_string())));
    found
}

/// The minimum-cardinality superkeys.
pub fn candidate_keys(table: &TableDef, deps: &[FuncDep]) -> Vec<AttributeSet> {
    let all = superkeys(table, deps);
    let smallest = match all.first() {
        Some(key) => key.len(),
        None => return vec![],
    };
    all.into_iter().take_while(|key| key.len() == smallest).collect()
}
