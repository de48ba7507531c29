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

use catalog::FuncDepCatalog;
use definition::AttributeSet;
use itertools::Itertools;
use std::fmt::Display;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use storage::{Row, Store, Value};

const HELP: &str = "\
connect <db>          open a database
disconnect            commit and close the database
tables                list user tables
fields <table>        list the columns of a table
list [table]          list declared dependencies
add <table> <lhs...> <rhs>   declare a dependency
del <table> <lhs...> <rhs>   remove a declaration
check [table]         verify the declared dependencies against the data
purge                 drop every declaration
clean                 drop stale and derivable declarations
closure <attr...>     attribute closure under the whole catalog
key <table>           candidate keys of a table
super_key <table>     superkeys of a table
3nf                   3NF report per table
bcnf                  BCNF report per table
normalize             write the decomposed database
source <file>         run a SQL script against the database
exit                  leave";

enum Control {
    Proceed,
    Leave,
}

struct Session {
    name: String,
    store: Store,
}

pub struct Shell {
    session: Option<Session>,
}

impl Shell {
    pub fn new() -> Shell {
        Shell { session: None }
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<()> {
        writeln!(output, "========= FUNC DEP CLI =========")?;
        writeln!(output, "version {}, type help to list the commands", env!("CARGO_PKG_VERSION"))?;
        let mut line = String::new();
        loop {
            match &self.session {
                Some(session) => write!(output, "({}) >> ", session.name)?,
                None => write!(output, ">> ")?,
            }
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            let tokens = line.split_whitespace().collect::<Vec<&str>>();
            if tokens.is_empty() {
                continue;
            }
            if let Control::Leave = self.dispatch(&tokens, output)? {
                return Ok(());
            }
        }
    }

    fn dispatch<W: Write>(&mut self, tokens: &[&str], output: &mut W) -> io::Result<Control> {
        match tokens[0] {
            "connect" => self.connect(&tokens[1..], output)?,
            "disconnect" => self.disconnect(output)?,
            "tables" => self.tables(output)?,
            "fields" => self.fields(&tokens[1..], output)?,
            "list" => self.list(&tokens[1..], output)?,
            "add" => self.add(&tokens[1..], output)?,
            "del" => self.del(&tokens[1..], output)?,
            "check" => self.check(&tokens[1..], output)?,
            "purge" => self.purge(output)?,
            "clean" => self.clean(output)?,
            "closure" => self.closure(&tokens[1..], output)?,
            "key" => self.candidate_keys(&tokens[1..], output)?,
            "super_key" => self.superkeys(&tokens[1..], output)?,
            "3nf" => self.third_nf_report(output)?,
            "bcnf" => self.bcnf_report(output)?,
            "normalize" => self.normalize(output)?,
            "source" => self.source(&tokens[1..], output)?,
            "help" | "?" => writeln!(output, "{}", HELP)?,
            "exit" => {
                self.disconnect(output)?;
                writeln!(output, "bye")?;
                return Ok(Control::Leave);
            }
            unknown => writeln!(output, "ERROR: unknown command \"{}\", type help to list the commands", unknown)?,
        }
        Ok(Control::Proceed)
    }

    fn connected<W: Write>(&self, output: &mut W) -> io::Result<Option<&Store>> {
        match &self.session {
            Some(session) => Ok(Some(&session.store)),
            None => {
                writeln!(output, "ERROR: no database connected")?;
                Ok(None)
            }
        }
    }

    fn connect<W: Write>(&mut self, args: &[&str], output: &mut W) -> io::Result<()> {
        if self.session.is_some() {
            return writeln!(output, "ERROR: already connected");
        }
        let name = match args {
            [name] => (*name).to_owned(),
            _ => return writeln!(output, "usage: connect <db>"),
        };
        match Store::open(&name) {
            Ok(store) => {
                self.session = Some(Session { name, store });
                Ok(())
            }
            Err(error) => report(output, error),
        }
    }

    fn disconnect<W: Write>(&mut self, output: &mut W) -> io::Result<()> {
        if let Some(session) = self.session.take() {
            if let Err(error) = session.store.close() {
                return report(output, error);
            }
        }
        Ok(())
    }

    fn tables<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        match store.user_tables() {
            Ok(tables) => print_lines(output, tables),
            Err(error) => report(output, error),
        }
    }

    fn fields<W: Write>(&self, args: &[&str], output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        let table_name = match args {
            [table_name] => table_name,
            _ => return writeln!(output, "usage: fields <table>"),
        };
        match store.columns(table_name) {
            Ok(columns) => print_lines(
                output,
                columns
                    .iter()
                    .map(|column| format!("{} {}", column.name(), column.sql_type()).trim_end().to_owned()),
            ),
            Err(error) => report(output, error),
        }
    }

    fn list<W: Write>(&self, args: &[&str], output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        let catalog = FuncDepCatalog::from(store);
        let listed = match args {
            [] => catalog.list(),
            [table_name] => catalog.list_for(table_name),
            _ => return writeln!(output, "usage: list [table]"),
        };
        match listed {
            Ok(deps) => print_lines(output, deps),
            Err(error) => report(output, error),
        }
    }

    fn add<W: Write>(&self, args: &[&str], output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        let (table_name, lhs, rhs) = match split_dep_args(args) {
            Some(parts) => parts,
            None => return writeln!(output, "usage: add <table> <attribute...> <attribute>"),
        };
        match FuncDepCatalog::from(store).add(table_name, &lhs, rhs) {
            Ok(_) => Ok(()),
            Err(error) => report(output, error),
        }
    }

    fn del<W: Write>(&self, args: &[&str], output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        let (table_name, lhs, rhs) = match split_dep_args(args) {
            Some(parts) => parts,
            None => return writeln!(output, "usage: del <table> <attribute...> <attribute>"),
        };
        match FuncDepCatalog::from(store).delete(table_name, &lhs, rhs) {
            Ok(_) => Ok(()),
            Err(error) => report(output, error),
        }
    }

    fn check<W: Write>(&self, args: &[&str], output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        let reports = match args {
            [] => validation::check_all(store),
            [table_name] => validation::check_table(store, table_name),
            _ => return writeln!(output, "usage: check [table]"),
        };
        match reports {
            Ok(reports) => {
                for report in reports {
                    if report.holds() {
                        writeln!(output, "{} ok", report.dep())?;
                    } else {
                        writeln!(output, "{}", report.dep())?;
                        writeln!(output, "this dependency is not respected")?;
                        for row in report.conflicting_rows() {
                            writeln!(output, "\t- {}", render_row(row))?;
                        }
                    }
                }
                Ok(())
            }
            Err(error) => report(output, error),
        }
    }

    fn purge<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        match FuncDepCatalog::from(store).purge() {
            Ok(()) => Ok(()),
            Err(error) => report(output, error),
        }
    }

    fn clean<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        match FuncDepCatalog::from(store).clean() {
            Ok(removed) => print_lines(output, removed.iter().map(|dep| format!("dropped {}", dep))),
            Err(error) => report(output, error),
        }
    }

    fn closure<W: Write>(&self, args: &[&str], output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        if args.is_empty() {
            return writeln!(output, "usage: closure <attribute...>");
        }
        match store.catalog_load() {
            Ok(deps) => {
                let attributes = args.iter().map(|token| definition::Attribute::from(*token)).collect::<AttributeSet>();
                print_lines(output, derivation::closure(&attributes, &deps).iter())
            }
            Err(error) => report(output, error),
        }
    }

    fn candidate_keys<W: Write>(&self, args: &[&str], output: &mut W) -> io::Result<()> {
        self.keys_of(args, output, "usage: key <table>", keys::candidate_keys)
    }

    fn superkeys<W: Write>(&self, args: &[&str], output: &mut W) -> io::Result<()> {
        self.keys_of(args, output, "usage: super_key <table>", keys::superkeys)
    }

    fn keys_of<W: Write>(
        &self,
        args: &[&str],
        output: &mut W,
        usage: &str,
        enumerate: fn(&definition::TableDef, &[definition::FuncDep]) -> Vec<AttributeSet>,
    ) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        let table_name = match args {
            [table_name] => table_name,
            _ => return writeln!(output, "{}", usage),
        };
        let keys = store
            .table_definition(table_name)
            .and_then(|table| Ok((table, store.catalog_load_for(table_name)?)))
            .map(|(table, deps)| enumerate(&table, &deps));
        match keys {
            Ok(keys) => print_lines(output, keys),
            Err(error) => report(output, error),
        }
    }

    fn third_nf_report<W: Write>(&self, output: &mut W) -> io::Result<()> {
        self.normal_form_report(output, |classification| classification.third_nf_violations().to_vec())
    }

    fn bcnf_report<W: Write>(&self, output: &mut W) -> io::Result<()> {
        self.normal_form_report(output, |classification| classification.bcnf_violations().to_vec())
    }

    fn normal_form_report<W: Write>(
        &self,
        output: &mut W,
        violations_of: fn(&classification::Classification) -> Vec<definition::FuncDep>,
    ) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        let gather = || -> Result<Vec<(String, Vec<definition::FuncDep>)>, storage::StorageError> {
            let mut lines = vec![];
            for table_name in store.user_tables()? {
                let table = store.table_definition(&table_name)?;
                let deps = store.catalog_load_for(&table_name)?;
                lines.push((table_name, violations_of(&classification::classify(&table, &deps))));
            }
            Ok(lines)
        };
        match gather() {
            Ok(lines) => {
                for (table_name, violations) in lines {
                    if violations.is_empty() {
                        writeln!(output, "{} ok", table_name)?;
                    } else {
                        writeln!(output, "{}", table_name)?;
                        for violation in violations {
                            writeln!(output, "\t- violated by {}", violation)?;
                        }
                    }
                }
                Ok(())
            }
            Err(error) => report(output, error),
        }
    }

    fn normalize<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        match normalization::normalize(store, Path::new(normalization::OUTPUT_STORE)) {
            Ok(()) => writeln!(output, "decomposition written to {}", normalization::OUTPUT_STORE),
            Err(error) => report(output, error),
        }
    }

    fn source<W: Write>(&self, args: &[&str], output: &mut W) -> io::Result<()> {
        let store = match self.connected(output)? {
            Some(store) => store,
            None => return Ok(()),
        };
        let file = match args {
            [file] => file,
            _ => return writeln!(output, "usage: source <file>"),
        };
        let script = match fs::read_to_string(file) {
            Ok(script) => script,
            Err(error) => return writeln!(output, "ERROR: {}", error),
        };
        match store.execute_script(&script) {
            Ok(()) => Ok(()),
            Err(error) => report(output, error),
        }
    }
}

fn split_dep_args<'a>(args: &[&'a str]) -> Option<(&'a str, String, &'a str)> {
    match args {
        [table_name, lhs @ .., rhs] if !lhs.is_empty() => Some((*table_name, lhs.join(" "), *rhs)),
        _ => None,
    }
}

fn report<W: Write, E: Display>(output: &mut W, error: E) -> io::Result<()> {
    writeln!(output, "ERROR: {}", error)
}

fn print_lines<W: Write, I: IntoIterator<Item = D>, D: Display>(output: &mut W, lines: I) -> io::Result<()> {
    for line in lines {
        writeln!(output, "{}", line)?;
    }
    Ok(())
}

fn render_row(row: &Row) -> String {
    format!("({})", row.iter().map(render_value).join(", "))
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_owned(),
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => value.to_string(),
        Value::Text(value) => value.clone(),
        Value::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}
