use serde::{Deserialize, Serialize};

use crate::dtos::sales_order::SalesOrderResponse;
use crate::error::AppError;
use crate::models::print_job::{PrintJob, PrintJobStatus};
use crate::services::receipt::Receipt;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrintJobRequest {
    pub order_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrintJobStatusRequest {
    pub status: Option<String>,
    pub printer_name: Option<String>,
    pub error_message: Option<String>,
}

impl UpdatePrintJobStatusRequest {
    pub fn parsed_status(&self) -> Result<PrintJobStatus, AppError> {
        let raw = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::validation("status is required"))?;
        match raw {
            "pending" => Ok(PrintJobStatus::Pending),
            "processing" => Ok(PrintJobStatus::Processing),
            "completed" => Ok(PrintJobStatus::Completed),
            "failed" => Ok(PrintJobStatus::Failed),
            other => Err(AppError::validation(format!("status has an invalid value: {other}"))),
        }
    }
}

/// A job together with the order snapshot and receipt the printer needs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJobDetailResponse {
    #[serde(flatten)]
    pub job: PrintJob,
    pub order: SalesOrderResponse,
    pub receipt: Receipt,
    pub receipt_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: Option<&str>) -> UpdatePrintJobStatusRequest {
        UpdatePrintJobStatusRequest {
            status: status.map(String::from),
            printer_name: None,
            error_message: None,
        }
    }

    #[test]
    fn status_values() {
        assert_eq!(request(Some("completed")).parsed_status().unwrap(), PrintJobStatus::Completed);
        assert_eq!(request(Some(" failed ")).parsed_status().unwrap(), PrintJobStatus::Failed);
        assert_eq!(request(None).parsed_status().unwrap_err().to_string(), "status is required");
        assert!(request(Some("printed")).parsed_status().is_err());
    }
}
