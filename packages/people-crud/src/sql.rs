//! Parameterized statements for the `People` table.
//!
//! Every user-supplied value travels as a bound [`Value`]; statement text
//! only ever contains identifiers and `$n` placeholders.

use chrono::NaiveDate;

use crate::record::{NameMatch, NewPerson, Person, PersonFilter};

pub const TABLE: &str = "People";
pub const COL_INDEX: &str = "Index";
pub const COL_NAME: &str = "Name";
pub const COL_DATE_OF_BIRTH: &str = "DateOfBirth";

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Text(String),
    /// `None` binds SQL `NULL`
    Date(Option<NaiveDate>),
}

/// Statement text plus its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter and returns its placeholder.
    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }
}

fn quoted(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn create_table() -> Statement {
    Statement::new(format!(
        "CREATE TABLE {} ({} SERIAL PRIMARY KEY NOT NULL, {} VARCHAR({}) NOT NULL, {} DATE)",
        quoted(TABLE),
        quoted(COL_INDEX),
        quoted(COL_NAME),
        crate::record::MAX_NAME_LEN,
        quoted(COL_DATE_OF_BIRTH),
    ))
}

pub fn drop_table() -> Statement {
    Statement::new(format!("DROP TABLE {} CASCADE", quoted(TABLE)))
}

/// `INSERT … RETURNING "Index"`; the index column is listed only when explicit.
pub fn insert(person: &NewPerson) -> Statement {
    let mut stmt = Statement::new(String::new());
    let mut columns = Vec::with_capacity(3);
    let mut placeholders = Vec::with_capacity(3);

    if let Some(index) = person.index {
        columns.push(quoted(COL_INDEX));
        placeholders.push(stmt.bind(Value::Int(index)));
    }
    columns.push(quoted(COL_NAME));
    placeholders.push(stmt.bind(Value::Text(person.name.clone())));
    columns.push(quoted(COL_DATE_OF_BIRTH));
    placeholders.push(stmt.bind(Value::Date(person.date_of_birth)));

    stmt.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(TABLE),
        columns.join(", "),
        placeholders.join(", "),
        quoted(COL_INDEX),
    );
    stmt
}

/// Rows matching `filter`, ordered by index.
pub fn select(filter: &PersonFilter) -> Statement {
    let mut stmt = Statement::new(String::new());
    let clauses = where_clauses(&mut stmt, filter);
    stmt.sql = format!(
        "SELECT {}, {}, {} FROM {}{} ORDER BY {}",
        quoted(COL_INDEX),
        quoted(COL_NAME),
        quoted(COL_DATE_OF_BIRTH),
        quoted(TABLE),
        clauses,
        quoted(COL_INDEX),
    );
    stmt
}

/// Reassigns every column of the row at `index`.
pub fn update(index: i32, person: &Person) -> Statement {
    let mut stmt = Statement::new(String::new());
    let new_index = stmt.bind(Value::Int(person.index));
    let name = stmt.bind(Value::Text(person.name.clone()));
    let date = stmt.bind(Value::Date(person.date_of_birth));
    let target = stmt.bind(Value::Int(index));
    stmt.sql = format!(
        "UPDATE {} SET {} = {}, {} = {}, {} = {} WHERE {} = {}",
        quoted(TABLE),
        quoted(COL_INDEX),
        new_index,
        quoted(COL_NAME),
        name,
        quoted(COL_DATE_OF_BIRTH),
        date,
        quoted(COL_INDEX),
        target,
    );
    stmt
}

/// Deletes the row at `index`, or every row when `None`.
pub fn delete(index: Option<i32>) -> Statement {
    let mut stmt = Statement::new(String::new());
    let filter = PersonFilter {
        index,
        ..Default::default()
    };
    let clauses = where_clauses(&mut stmt, &filter);
    stmt.sql = format!("DELETE FROM {}{}", quoted(TABLE), clauses);
    stmt
}

fn where_clauses(stmt: &mut Statement, filter: &PersonFilter) -> String {
    let mut clauses = Vec::new();
    if let Some(index) = filter.index {
        let p = stmt.bind(Value::Int(index));
        clauses.push(format!("{} = {}", quoted(COL_INDEX), p));
    }
    match &filter.name {
        Some(NameMatch::Exact(name)) => {
            let p = stmt.bind(Value::Text(name.clone()));
            clauses.push(format!("{} = {}", quoted(COL_NAME), p));
        }
        Some(NameMatch::Like(pattern)) => {
            let p = stmt.bind(Value::Text(pattern.clone()));
            clauses.push(format!("{} LIKE {}", quoted(COL_NAME), p));
        }
        None => {}
    }
    if let Some(date) = filter.date_of_birth {
        let p = stmt.bind(Value::Date(Some(date)));
        clauses.push(format!("{} = {}", quoted(COL_DATE_OF_BIRTH), p));
    }

    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}
