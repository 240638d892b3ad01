//! Sort order over `(created_at, id)` and the keyset condition that resumes
//! after a cursor.

use std::cmp::Ordering;

use sqlx::{QueryBuilder, Sqlite};

use crate::error::AppError;
use crate::query::cursor::Cursor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Absent means descending.
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw {
            None | Some("desc") => Ok(SortDirection::Desc),
            Some("asc") => Ok(SortDirection::Asc),
            Some(other) => Err(AppError::InvalidQuery(format!("Invalid sort: {}", other))),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn comparator(&self) -> &'static str {
        match self {
            SortDirection::Asc => " > ",
            SortDirection::Desc => " < ",
        }
    }

    /// Orders two `(created_at, id)` keys the way the listing returns them.
    pub fn compare(&self, a: (&str, &str), b: (&str, &str)) -> Ordering {
        match self {
            SortDirection::Asc => a.cmp(&b),
            SortDirection::Desc => b.cmp(&a),
        }
    }
}

/// Appends `ORDER BY` for both keys in the same direction.
pub fn push_order_by(direction: SortDirection, qb: &mut QueryBuilder<'_, Sqlite>) {
    let keyword = direction.keyword();
    qb.push(" ORDER BY a.created_at ");
    qb.push(keyword);
    qb.push(", a.id ");
    qb.push(keyword);
}

/// Rows strictly after `cursor` in `direction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorCondition {
    pub direction: SortDirection,
    pub cursor: Cursor,
}

impl CursorCondition {
    pub fn new(direction: SortDirection, cursor: Cursor) -> Self {
        Self { direction, cursor }
    }

    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let cmp = self.direction.comparator();
        qb.push("(a.created_at");
        qb.push(cmp);
        qb.push_bind(self.cursor.value.clone());
        qb.push(" OR (a.created_at = ");
        qb.push_bind(self.cursor.value.clone());
        qb.push(" AND a.id");
        qb.push(cmp);
        qb.push_bind(self.cursor.id.clone());
        qb.push("))");
    }

    /// In-memory form of the SQL condition.
    pub fn admits(&self, created_at: &str, id: &str) -> bool {
        let key = (created_at, id);
        let after = (self.cursor.value.as_str(), self.cursor.id.as_str());
        self.direction.compare(key, after) == Ordering::Greater
    }
}
