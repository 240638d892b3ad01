//! Role-based narrowing of the assignment listing.

use crate::error::AppError;
use crate::models::{Caller, Role};
use crate::query::filter::Resource;

/// Mandatory restrictions derived from who is asking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    /// Only assignments of this batch.
    pub batch: Option<String>,
    /// Only assignments owned by this user; applied to the teacher join.
    pub owner: Option<String>,
}

pub fn resolve(caller: Option<&Caller>, resource: Option<Resource>) -> Result<Scope, AppError> {
    match resource {
        None => {
            if caller.is_none() {
                return Err(AppError::Unauthorized);
            }
            Ok(Scope::default())
        }
        Some(Resource::Student) => {
            let caller = caller
                .filter(|c| c.batch.is_some() && c.has_role(&[Role::Student, Role::Admin]))
                .ok_or_else(forbidden)?;

            let batch = match (&caller.id, &caller.batch) {
                (Some(_), Some(batch)) => Some(batch.clone()),
                _ => None,
            };
            Ok(Scope { batch, owner: None })
        }
        Some(Resource::Teacher) => {
            let caller = caller
                .filter(|c| c.has_role(&[Role::Teacher, Role::Admin]))
                .ok_or_else(forbidden)?;

            Ok(Scope {
                batch: None,
                owner: caller.id.clone(),
            })
        }
    }
}

fn forbidden() -> AppError {
    AppError::Forbidden("You are not allowed to access this resource".to_string())
}
