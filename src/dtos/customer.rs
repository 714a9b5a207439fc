use serde::{Deserialize, Serialize};

use crate::models::customer::Customer;
use crate::models::movement::OutRecord;

#[derive(Debug, Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetailResponse {
    #[serde(flatten)]
    pub customer: Customer,
    pub out_records: Vec<OutRecord>,
}
