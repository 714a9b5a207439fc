//! Receipt layout derived from a sales order snapshot. Read-only; the physical
//! printing happens in an external worker that polls `/print-jobs/pending`.

use serde::Serialize;

use crate::dtos::sales_order::SalesOrderResponse;
use crate::models::sales_order::SalesOrderStatus;
use crate::services::numerals::amount_in_words;

const TITLE: &str = "销售单";
const VOIDED_TITLE: &str = "销售单（已作废）";
const PAGE_INFO: &str = "第1页共1页";
const FOOTER: &str = "货物当面点清，过后概不负责。";
const RULE: &str = "----------------------------------------";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub no: usize,
    pub code: String,
    pub name: String,
    pub specification: String,
    pub quantity: f64,
    pub unit: String,
    pub price: String,
    pub amount: String,
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub title: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub order_number: String,
    pub date: String,
    pub page_info: String,
    pub products: Vec<ReceiptLine>,
    pub total_quantity: f64,
    pub total_amount: String,
    pub total_amount_in_words: String,
    pub previous_debt: String,
    pub operator: String,
    pub remark: String,
}

pub fn build_receipt(order: &SalesOrderResponse) -> Receipt {
    let products: Vec<ReceiptLine> = order
        .products
        .iter()
        .enumerate()
        .map(|(index, line)| ReceiptLine {
            no: index + 1,
            code: line.code.clone(),
            name: line.name.clone(),
            specification: line.description.clone().unwrap_or_default(),
            quantity: line.quantity,
            unit: line.unit_name.clone(),
            price: format!("{:.2}", line.price),
            amount: format!("{:.2}", line.total_amount),
            remark: String::new(),
        })
        .collect();

    let title = match order.status {
        SalesOrderStatus::Voided => VOIDED_TITLE,
        _ => TITLE,
    };

    Receipt {
        title: title.to_string(),
        customer_name: order.customer_name.clone(),
        customer_phone: order.customer_phone.clone().unwrap_or_default(),
        customer_address: order.customer_address.clone().unwrap_or_default(),
        order_number: order.order_number.clone(),
        date: order.created_at.format("%Y.%m.%d").to_string(),
        page_info: PAGE_INFO.to_string(),
        total_quantity: products.iter().map(|p| p.quantity).sum(),
        products,
        total_amount: format!("{:.2}", order.total_amount),
        total_amount_in_words: amount_in_words(order.total_amount),
        previous_debt: "0.00".to_string(),
        operator: String::new(),
        remark: FOOTER.to_string(),
    }
}

impl Receipt {
    /// Plain-text rendering for text-mode receipt printers.
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            self.title.clone(),
            format!("客户: {}  电话: {}", self.customer_name, self.customer_phone),
        ];
        if !self.customer_address.is_empty() {
            lines.push(format!("地址: {}", self.customer_address));
        }
        lines.push(format!("单号: {}  日期: {}  {}", self.order_number, self.date, self.page_info));
        lines.push(RULE.to_string());
        lines.push("序号 编码 名称 规格 数量 单位 单价 金额".to_string());
        for p in &self.products {
            let spec = if p.specification.is_empty() { "-" } else { p.specification.as_str() };
            lines.push(format!(
                "{} {} {} {} {} {} {} {}",
                p.no,
                p.code,
                p.name,
                spec,
                format_quantity(p.quantity),
                p.unit,
                p.price,
                p.amount
            ));
        }
        lines.push(RULE.to_string());
        lines.push(format!(
            "合计数量: {}  合计金额: {}",
            format_quantity(self.total_quantity),
            self.total_amount
        ));
        lines.push(format!("大写金额: {}", self.total_amount_in_words));
        lines.push(format!("上次欠款: {}", self.previous_debt));
        lines.push(self.remark.clone());
        lines.join("\n")
    }
}

/// `2.0` → `2`, `2.50` → `2.5`.
pub fn format_quantity(quantity: f64) -> String {
    let formatted = format!("{quantity:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::sales_order::SalesOrderLineResponse;
    use chrono::{TimeZone, Utc};

    fn snapshot(status: SalesOrderStatus) -> SalesOrderResponse {
        SalesOrderResponse {
            id: 7,
            order_number: "SO1741000000000000".into(),
            customer_id: 3,
            customer_name: "Lucky Mart".into(),
            customer_contact: Some("Ms. Wang".into()),
            customer_phone: Some("13800000000".into()),
            customer_address: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 9, 8, 30, 0).unwrap(),
            status,
            product_count: 2,
            total_amount: 1005.03,
            remark: String::new(),
            products: vec![
                SalesOrderLineResponse {
                    id: 1,
                    product_id: 1,
                    name: "Jasmine Rice".into(),
                    code: "R001".into(),
                    description: Some("25kg sack".into()),
                    product_unit_id: Some(11),
                    unit_name: "box".into(),
                    conversion_rate: 12.0,
                    quantity: 2.0,
                    base_quantity: 24.0,
                    price: 500.0,
                    total_amount: 1000.0,
                },
                SalesOrderLineResponse {
                    id: 2,
                    product_id: 2,
                    name: "Soy Sauce".into(),
                    code: "S002".into(),
                    description: None,
                    product_unit_id: None,
                    unit_name: "斤".into(),
                    conversion_rate: 1.0,
                    quantity: 1.5,
                    base_quantity: 1.5,
                    price: 3.353,
                    total_amount: 5.03,
                },
            ],
        }
    }

    #[test]
    fn receipt_fields() {
        let receipt = build_receipt(&snapshot(SalesOrderStatus::Completed));
        assert_eq!(receipt.title, "销售单");
        assert_eq!(receipt.date, "2025.03.09");
        assert_eq!(receipt.page_info, "第1页共1页");
        assert_eq!(receipt.total_amount, "1005.03");
        assert_eq!(receipt.total_amount_in_words, "壹仟零伍元叁分");
        assert_eq!(receipt.total_quantity, 3.5);
        assert_eq!(receipt.customer_address, "");

        let first = &receipt.products[0];
        assert_eq!(first.no, 1);
        assert_eq!(first.specification, "25kg sack");
        assert_eq!(first.unit, "box");
        assert_eq!(first.price, "500.00");
        assert_eq!(receipt.products[1].price, "3.35");
    }

    #[test]
    fn voided_orders_are_marked() {
        let receipt = build_receipt(&snapshot(SalesOrderStatus::Voided));
        assert_eq!(receipt.title, "销售单（已作废）");
    }

    #[test]
    fn text_rendering_contains_lines_and_totals() {
        let text = build_receipt(&snapshot(SalesOrderStatus::Completed)).to_text();
        assert!(text.starts_with("销售单\n"));
        assert!(text.contains("1 R001 Jasmine Rice 25kg sack 2 box 500.00 1000.00"));
        assert!(text.contains("2 S002 Soy Sauce - 1.5 斤 3.35 5.03"));
        assert!(text.contains("合计数量: 3.5  合计金额: 1005.03"));
        assert!(text.contains("大写金额: 壹仟零伍元叁分"));
        assert!(text.ends_with("货物当面点清，过后概不负责。"));
        assert!(!text.contains("地址:"));
    }

    #[test]
    fn quantities_drop_trailing_zeros() {
        assert_eq!(format_quantity(2.0), "2");
        assert_eq!(format_quantity(2.5), "2.5");
        assert_eq!(format_quantity(0.25), "0.25");
        assert_eq!(format_quantity(10.0), "10");
        assert_eq!(format_quantity(0.0), "0");
    }
}
