//! Query parameter validation and filter predicates.

use chrono::{DateTime, Days, Utc};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::error::AppError;
use crate::query::cursor::{self, Cursor};
use crate::query::order::SortDirection;
use crate::timestamp::{self, Instant};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Raw listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentQueryParams {
    pub cursor: Option<String>,
    pub teacher: Option<String>,
    pub batch: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Student,
    Teacher,
}

/// Validated listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentQuery {
    pub cursor: Option<Cursor>,
    pub teacher: Option<String>,
    pub batch: Option<String>,
    pub limit: i64,
    pub sort: SortDirection,
    pub status: Option<Status>,
    pub from: Option<Instant>,
    pub to: Option<Instant>,
    pub resource: Option<Resource>,
}

impl Default for AssignmentQuery {
    fn default() -> Self {
        Self {
            cursor: None,
            teacher: None,
            batch: None,
            limit: DEFAULT_LIMIT,
            sort: SortDirection::default(),
            status: None,
            from: None,
            to: None,
            resource: None,
        }
    }
}

// Empty query values (`?batch=`) count as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AssignmentQuery {
    pub fn parse(params: &AssignmentQueryParams) -> Result<Self, AppError> {
        let cursor = present(&params.cursor).map(cursor::decode).transpose()?;

        let limit = match present(&params.limit) {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::InvalidQuery(format!("Invalid limit: {}", raw)))?
                .clamp(1, MAX_LIMIT),
            None => DEFAULT_LIMIT,
        };

        let sort = SortDirection::parse(present(&params.sort))?;

        let status = match present(&params.status) {
            None => None,
            Some("pending") => Some(Status::Pending),
            Some("completed") => Some(Status::Completed),
            Some(other) => {
                return Err(AppError::InvalidQuery(format!("Invalid status: {}", other)));
            }
        };

        let resource = match present(&params.resource) {
            None => None,
            Some("student") => Some(Resource::Student),
            Some("teacher") => Some(Resource::Teacher),
            Some(other) => {
                return Err(AppError::InvalidQuery(format!("Invalid resource: {}", other)));
            }
        };

        Ok(Self {
            cursor,
            teacher: present(&params.teacher).map(str::to_string),
            batch: present(&params.batch).map(str::to_string),
            limit,
            sort,
            status,
            from: parse_instant("from", present(&params.from))?,
            to: parse_instant("to", present(&params.to))?,
            resource,
        })
    }
}

fn parse_instant(name: &str, raw: Option<&str>) -> Result<Option<Instant>, AppError> {
    raw.map(|raw| {
        Instant::parse(raw)
            .ok_or_else(|| AppError::InvalidQuery(format!("Invalid {} date: {}", name, raw)))
    })
    .transpose()
}

/// One independent condition on the `assignments a` relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    BatchEquals(String),
    TeacherEquals(String),
    /// `created_at >= value`
    CreatedFrom(String),
    /// `created_at < value`
    CreatedBefore(String),
    /// `created_at <= value`
    CreatedUntil(String),
    /// `submission_date < value`
    DueBefore(String),
    /// `submission_date > value`
    DueAfter(String),
}

impl Predicate {
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let (column, op, value) = match self {
            Predicate::BatchEquals(v) => ("a.batch", " = ", v),
            Predicate::TeacherEquals(v) => ("a.teacher_id", " = ", v),
            Predicate::CreatedFrom(v) => ("a.created_at", " >= ", v),
            Predicate::CreatedBefore(v) => ("a.created_at", " < ", v),
            Predicate::CreatedUntil(v) => ("a.created_at", " <= ", v),
            Predicate::DueBefore(v) => ("a.submission_date", " < ", v),
            Predicate::DueAfter(v) => ("a.submission_date", " > ", v),
        };
        qb.push(column);
        qb.push(op);
        qb.push_bind(value.clone());
    }
}

/// Translates the user-supplied filters of `query` into predicates.
///
/// `resource` is not handled here; see [`crate::query::scope`].
pub fn compile(query: &AssignmentQuery, now: DateTime<Utc>) -> Result<Vec<Predicate>, AppError> {
    let mut predicates = Vec::new();

    if let Some(batch) = &query.batch {
        predicates.push(Predicate::BatchEquals(batch.clone()));
    }
    if let Some(teacher) = &query.teacher {
        predicates.push(Predicate::TeacherEquals(teacher.clone()));
    }
    if let Some(from) = &query.from {
        predicates.push(Predicate::CreatedFrom(timestamp::format(
            timestamp::round_up_millis(from.start()),
        )));
    }
    match query.to {
        // A bare date covers the whole day.
        Some(Instant::Date(date)) => {
            let next_day = date
                .checked_add_days(Days::new(1))
                .ok_or_else(|| AppError::InvalidQuery("Invalid to date".to_string()))?;
            predicates.push(Predicate::CreatedBefore(timestamp::format(
                Instant::Date(next_day).start(),
            )));
        }
        Some(Instant::DateTime(dt)) => {
            predicates.push(Predicate::CreatedUntil(timestamp::format(dt)));
        }
        None => {}
    }
    match query.status {
        Some(Status::Completed) => predicates.push(Predicate::DueBefore(timestamp::format(now))),
        Some(Status::Pending) => predicates.push(Predicate::DueAfter(timestamp::format(now))),
        None => {}
    }

    Ok(predicates)
}
