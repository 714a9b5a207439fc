use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SupplierRequest {
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}
