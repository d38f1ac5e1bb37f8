use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An error entry as persisted by an error log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggedError {
    pub id: String,
    pub application: String,
    pub host_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub source: String,
    pub message: String,
    pub detail: String,
    pub user: String,
    pub status_code: i64,
    pub time: NaiveDateTime,
}

impl Default for LoggedError {
    fn default() -> Self {
        Self {
            id: String::new(),
            application: String::new(),
            host_name: String::new(),
            type_name: String::new(),
            source: String::new(),
            message: String::new(),
            detail: String::new(),
            user: String::new(),
            status_code: 0,
            time: NaiveDateTime::default(),
        }
    }
}
