use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::limits::{
    MAX_LINK_LENGTH, MAX_LINKS_PER_TASK, MAX_TASK_REMARKS_LENGTH, MAX_TASK_TITLE_LENGTH,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub assignment_id: String,
    pub title: String,
    pub remarks: Option<String>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: String,
    pub assignment_id: String,
    pub title: String,
    pub remarks: Option<String>,
    pub links: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let links: Vec<String> = serde_json::from_str(&row.links).map_err(|e| {
            tracing::error!("corrupt links column for task {}: {}", row.id, e);
            AppError::InternalServerError
        })?;

        Ok(Task {
            id: row.id,
            assignment_id: row.assignment_id,
            title: row.title,
            remarks: row.remarks,
            links,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaskRequest {
    pub title: String,
    pub remarks: Option<String>,
    pub links: Option<Vec<String>>,
}

impl NewTaskRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_remarks(self.remarks.as_deref())?;
        validate_links(self.links.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub remarks: Option<String>,
    pub links: Option<Vec<String>>,
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        validate_remarks(self.remarks.as_deref())?;
        if let Some(links) = &self.links {
            validate_links(links)?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::BadRequest("Task title is required".to_string()));
    }
    if title.chars().count() > MAX_TASK_TITLE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Tasks title can't exceed {} characters",
            MAX_TASK_TITLE_LENGTH
        )));
    }
    Ok(())
}

fn validate_remarks(remarks: Option<&str>) -> Result<(), AppError> {
    match remarks {
        Some(remarks) if remarks.chars().count() > MAX_TASK_REMARKS_LENGTH => {
            Err(AppError::BadRequest(format!(
                "Task remarks can't exceed {} characters",
                MAX_TASK_REMARKS_LENGTH
            )))
        }
        _ => Ok(()),
    }
}

fn validate_links(links: &[String]) -> Result<(), AppError> {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = URL_REGEX
        .get_or_init(|| Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("Invalid URL regex"));

    if links.len() > MAX_LINKS_PER_TASK {
        return Err(AppError::BadRequest(format!(
            "Task can't have more than {} links",
            MAX_LINKS_PER_TASK
        )));
    }

    for link in links {
        if link.chars().count() > MAX_LINK_LENGTH {
            return Err(AppError::BadRequest(format!(
                "Links can't exceed {} characters",
                MAX_LINK_LENGTH
            )));
        }
        if !re.is_match(link) {
            return Err(AppError::BadRequest(format!("Invalid link: {}", link)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_links(links: &[&str]) -> NewTaskRequest {
        NewTaskRequest {
            title: "Read chapter 3".to_string(),
            remarks: Some("Focus on recursion".to_string()),
            links: Some(links.iter().map(|l| l.to_string()).collect()),
        }
    }

    #[test]
    fn test_accepts_http_links() {
        let task = with_links(&["https://example.com/notes.pdf", "http://10.0.0.1:8080/a?b=c"]);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_links() {
        assert!(with_links(&["ftp://example.com"]).validate().is_err());
        assert!(with_links(&["not a url"]).validate().is_err());
        assert!(with_links(&["https://"]).validate().is_err());

        let long = format!("https://example.com/{}", "a".repeat(MAX_LINK_LENGTH));
        assert!(with_links(&[long.as_str()]).validate().is_err());

        let many = vec!["https://example.com"; MAX_LINKS_PER_TASK + 1];
        assert!(with_links(&many).validate().is_err());
    }

    #[test]
    fn test_update_validates_only_present_fields() {
        assert!(UpdateTaskRequest::default().validate().is_ok());

        let update = UpdateTaskRequest {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_row_links_are_decoded() {
        let row = TaskRow {
            id: "t1".into(),
            assignment_id: "a1".into(),
            title: "title".into(),
            remarks: None,
            links: r#"["https://example.com"]"#.into(),
        };
        let task = Task::try_from(row).unwrap();
        assert_eq!(task.links, vec!["https://example.com".to_string()]);
    }
}
