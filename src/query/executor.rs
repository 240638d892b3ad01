use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::AppError;
use crate::models::{Assignment, AssignmentRow};
use crate::query::cursor;
use crate::query::filter::Predicate;
use crate::query::order::{self, CursorCondition, SortDirection};

/// Everything needed to fetch one page, already validated and authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPlan {
    pub predicates: Vec<Predicate>,
    pub owner: Option<String>,
    pub direction: SortDirection,
    pub after: Option<CursorCondition>,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentPage {
    /// Present whenever the page is non-empty. Only an empty page marks the end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub assignments: Vec<Assignment>,
}

impl ListPlan {
    pub fn build_query(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(AssignmentRow::SELECT_COLUMNS);
        qb.push(" FROM assignments a INNER JOIN users u ON a.teacher_id = u.id");
        if let Some(owner) = &self.owner {
            qb.push(" AND a.teacher_id = ");
            qb.push_bind(owner.clone());
        }

        let mut clauses = 0;
        for predicate in &self.predicates {
            qb.push(if clauses == 0 { " WHERE " } else { " AND " });
            predicate.push_sql(&mut qb);
            clauses += 1;
        }
        if let Some(after) = &self.after {
            qb.push(if clauses == 0 { " WHERE " } else { " AND " });
            after.push_sql(&mut qb);
        }

        order::push_order_by(self.direction, &mut qb);
        qb.push(" LIMIT ");
        qb.push_bind(self.limit);
        qb
    }
}

pub async fn list_assignments(db: &SqlitePool, plan: &ListPlan) -> Result<AssignmentPage, AppError> {
    let mut qb = plan.build_query();
    debug!("listing assignments: {}", qb.sql());

    let rows = qb.build_query_as::<AssignmentRow>().fetch_all(db).await?;
    let assignments = rows
        .into_iter()
        .map(Assignment::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let cursor = assignments
        .last()
        .map(|last| cursor::encode(&last.id, &last.created_at));

    debug!("fetched {} assignments (more: {})", assignments.len(), cursor.is_some());
    Ok(AssignmentPage { cursor, assignments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::cursor::Cursor;

    #[test]
    fn test_bare_plan_sql() {
        let plan = ListPlan {
            predicates: vec![],
            owner: None,
            direction: SortDirection::Desc,
            after: None,
            limit: 20,
        };
        let qb = plan.build_query();
        let sql = qb.sql();
        assert!(sql.ends_with(
            " FROM assignments a INNER JOIN users u ON a.teacher_id = u.id \
             ORDER BY a.created_at DESC, a.id DESC LIMIT ?"
        ));
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_full_plan_sql() {
        let plan = ListPlan {
            predicates: vec![
                Predicate::BatchEquals("X".into()),
                Predicate::DueAfter("now".into()),
            ],
            owner: Some("t-1".into()),
            direction: SortDirection::Asc,
            after: Some(CursorCondition::new(SortDirection::Asc, Cursor::new("id", "v"))),
            limit: 5,
        };
        let qb = plan.build_query();
        assert!(qb.sql().contains(
            "ON a.teacher_id = u.id AND a.teacher_id = ? \
             WHERE a.batch = ? AND a.submission_date > ? \
             AND (a.created_at > ? OR (a.created_at = ? AND a.id > ?)) \
             ORDER BY a.created_at ASC, a.id ASC LIMIT ?"
        ));
    }
}
