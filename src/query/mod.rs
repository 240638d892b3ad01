//! Cursor-paginated assignment listing.
//!
//! A request flows through four pure stages before touching the database:
//! parameter validation ([`filter::AssignmentQuery::parse`]), scope
//! resolution ([`scope::resolve`]), filter compilation ([`filter::compile`])
//! and keyset ordering ([`order`]). The resulting [`ListPlan`] is then run by
//! [`executor::list_assignments`].

pub mod cursor;
pub mod executor;
pub mod filter;
pub mod order;
pub mod scope;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::AppError;
use crate::models::Caller;

pub use executor::{AssignmentPage, ListPlan};
pub use filter::{AssignmentQuery, AssignmentQueryParams, Predicate};
pub use order::{CursorCondition, SortDirection};
pub use scope::Scope;

/// Validates, authorizes and compiles a listing request.
pub fn plan(
    caller: Option<&Caller>,
    params: &AssignmentQueryParams,
    now: DateTime<Utc>,
) -> Result<ListPlan, AppError> {
    let query = AssignmentQuery::parse(params)?;
    let scope = scope::resolve(caller, query.resource)?;

    let mut predicates = filter::compile(&query, now)?;
    if let Some(batch) = scope.batch {
        predicates.push(Predicate::BatchEquals(batch));
    }

    let after = query
        .cursor
        .map(|cursor| CursorCondition::new(query.sort, cursor));

    Ok(ListPlan {
        predicates,
        owner: scope.owner,
        direction: query.sort,
        after,
        limit: query.limit,
    })
}

pub async fn query_assignments(
    db: &SqlitePool,
    caller: Option<&Caller>,
    params: &AssignmentQueryParams,
) -> Result<AssignmentPage, AppError> {
    let plan = plan(caller, params, Utc::now())?;
    debug!(
        "assignment listing plan: {} predicates, owner={:?}, direction={:?}, limit={}",
        plan.predicates.len(),
        plan.owner,
        plan.direction,
        plan.limit
    );
    executor::list_assignments(db, &plan).await
}
