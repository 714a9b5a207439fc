use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "print_job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrintJobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    pub id: i64,
    pub order_id: i64,
    pub status: PrintJobStatus,
    pub printer_name: Option<String>,
    pub error_message: Option<String>,
    pub printed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
