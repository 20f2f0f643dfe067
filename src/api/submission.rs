//! Submission state and validation.
//!
//! A [`Submission`] is the caller-owned state of the "analyse" form. It is
//! validated as a whole so every field error can be reported at once.

use crate::models::NewCommunication;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Longest text accepted for a "save" submission, in characters.
pub const MAX_CONTENT_CHARS: usize = 1000;

/// What to do with a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Send text content for analysis.
    Save,
    /// Upload a file for analysis.
    Upload,
}

/// Field-level validation failures, keyed by the form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", describe(.fields))]
pub struct ValidationErrors {
    pub fields: BTreeMap<&'static str, String>,
}

fn describe(fields: &BTreeMap<&'static str, String>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    fn single(field: &'static str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    fn add(&mut self, field: &'static str, message: &str) {
        self.fields.insert(field, message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Unvalidated form state.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub operation: Option<Operation>,
    pub model_name: String,
    pub content: String,
    pub file: Option<PathBuf>,
}

/// A submission that passed validation, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedSubmission {
    Save(NewCommunication),
    Upload { path: PathBuf, model_name: String },
}

impl Submission {
    /// Text submission for the given model.
    pub fn save(model_name: &str, content: &str) -> Self {
        Self {
            operation: Some(Operation::Save),
            model_name: model_name.to_string(),
            content: content.to_string(),
            file: None,
        }
    }

    /// File upload for the given model.
    pub fn upload(model_name: &str, file: PathBuf) -> Self {
        Self {
            operation: Some(Operation::Upload),
            model_name: model_name.to_string(),
            content: String::new(),
            file: Some(file),
        }
    }

    /// Check every field and either return the request to send or all the
    /// errors found.
    pub fn validate(&self) -> Result<ValidatedSubmission, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.operation.is_none() {
            errors.add("operation", "Please select an operation.");
        }
        if self.model_name.trim().is_empty() {
            errors.add("modelName", "Please select a model.");
        }

        match self.operation {
            Some(Operation::Save) if self.content.is_empty() => {
                errors.add("content", "Content is required.");
            }
            Some(Operation::Save) if self.content.chars().count() > MAX_CONTENT_CHARS => {
                errors.add(
                    "content",
                    &format!("Content must be at most {} characters.", MAX_CONTENT_CHARS),
                );
            }
            Some(Operation::Upload) if self.file.is_none() => {
                errors.add("file", "Please select a file.");
            }
            _ => {}
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        match (self.operation, &self.file) {
            (Some(Operation::Upload), Some(path)) => Ok(ValidatedSubmission::Upload {
                path: path.clone(),
                model_name: self.model_name.clone(),
            }),
            _ => Ok(ValidatedSubmission::Save(NewCommunication {
                content: self.content.clone(),
                model_name: self.model_name.clone(),
            })),
        }
    }
}

fn require_text(
    field: &'static str,
    value: &str,
    message: &str,
) -> Result<String, ValidationErrors> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationErrors::single(field, message));
    }
    Ok(value.to_string())
}

/// Reject blank model names.
pub fn validate_model_name(name: &str) -> Result<String, ValidationErrors> {
    require_text("name", name, "Model name cannot be empty!")
}

/// Reject blank category names.
pub fn validate_category_name(name: &str) -> Result<String, ValidationErrors> {
    require_text("name", name, "Category name cannot be empty!")
}

/// Reject blank association words.
pub fn validate_word(word: &str) -> Result<String, ValidationErrors> {
    require_text("word", word, "Word cannot be empty!")
}
