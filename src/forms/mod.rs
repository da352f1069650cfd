// Form payloads and their local validation. A form that fails validation
// never reaches the network; failures are reported per field.
use std::collections::HashMap;

use serde::Deserialize;
use uuid::Uuid;

pub type FieldErrors = HashMap<String, String>;

/// Single-field error map, for checks that happen after the form-level pass.
pub fn field_error(field: &str, message: &str) -> FieldErrors {
    HashMap::from([(field.to_string(), message.to_string())])
}

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if !is_valid_email(&self.email) {
            errors.insert("email".to_string(), "Invalid email".to_string());
        }
        if self.password.len() < 6 {
            errors.insert(
                "password".to_string(),
                "Password must be at least 6 characters".to_string(),
            );
        }
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectForm {
    /// Present when the form is submitting an edit, absent for a create.
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ProjectForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.name.is_empty() {
            errors.insert("name".to_string(), "Project name is required".to_string());
        }
        if self.description.is_empty() {
            errors.insert("description".to_string(), "Description is required".to_string());
        }
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskForm {
    pub id: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub project_id: String,
}

impl TaskForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.title.is_empty() {
            errors.insert("title".to_string(), "Task title is required".to_string());
        }
        if self.status.is_empty() {
            errors.insert("status".to_string(), "Task Status is required".to_string());
        }
        if self.project_id.is_empty() {
            errors.insert("project_id".to_string(), "Task Project is required".to_string());
        }
        errors
    }
}

/// Just enough of an email check to catch obvious typos; the store performs
/// its own validation on sign-up.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}
