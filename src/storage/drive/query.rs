//! Builders for the `q` search expressions of the Drive `files.list` method.

use crate::types::DRIVE_FOLDER_MIME_TYPE;

/// Escapes a value placed inside a single-quoted string of a Drive query.
pub fn escape_query_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn folder_query(parent_id: Option<&str>, name: &str) -> String {
    let mut query = format!(
        "mimeType='{}' and name='{}' and trashed=false",
        DRIVE_FOLDER_MIME_TYPE,
        escape_query_value(name)
    );
    if let Some(parent_id) = parent_id {
        query.push_str(&format!(
            " and '{}' in parents",
            escape_query_value(parent_id)
        ));
    }
    query
}

pub fn children_query(parent_id: &str) -> String {
    format!(
        "'{}' in parents and trashed=false",
        escape_query_value(parent_id)
    )
}
