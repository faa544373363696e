//! Typed views over the two CRM order collections.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::normalize::{self, Document, FieldKind};

// Column names of the CRM export.
const COL_SUBJECT: &str = "Assunto";
const COL_STATUS: &str = "Status";
const COL_CREATED: &str = "Hora de Criação";
const COL_PAYMENT_TERM: &str = "Condição de Pagamento";
const COL_CHILD_FLAG: &str = "Pedido Filho?";
const COL_QTY_SOLD: &str = "Quantidade Total";
const COL_SALES_PRODUCT: &str = "Produtos";
const COL_PURCHASE_PRODUCT: &str = "Nome Produto";
const COL_QTY_PAID: &str = "Quantidade Paga";
const COL_WAREHOUSE: &str = "Armazém";
const COL_REFERENCE: &str = "Pedido de Compra";
const COL_SEQUENCE: &str = "Número do Pedido";

#[derive(Debug, Clone, PartialEq)]
pub struct SalesOrder {
    pub subject: String,
    pub status: String,
    pub created_at: Option<NaiveDateTime>,
    pub payment_term: String,
    /// Opaque categorical value; filtering treats it as set membership.
    pub child_flag: String,
    pub quantity_sold: f64,
    pub product: String,
    /// Local date component of `created_at`. `None` excludes the record from
    /// date-filtered views.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseOrder {
    pub reference: String,
    pub product: String,
    pub quantity_paid: f64,
    pub warehouse: String,
    pub created_at: Option<NaiveDateTime>,
    /// Source sequence number, or assigned 1-based by load order when the
    /// source lacks one.
    pub sequence: u64,
    pub date: Option<NaiveDate>,
}

fn text(doc: &Document, column: &str) -> String {
    match doc.get(column) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

pub fn sales_from_documents(mut docs: Vec<Document>) -> Vec<SalesOrder> {
    normalize::normalize_documents(
        &mut docs,
        &[
            (COL_QTY_SOLD, FieldKind::Decimal),
            (COL_CREATED, FieldKind::Timestamp),
        ],
    );

    docs.iter()
        .map(|doc| {
            let created_at = normalize::stored_timestamp(doc.get(COL_CREATED));
            SalesOrder {
                subject: text(doc, COL_SUBJECT),
                status: text(doc, COL_STATUS),
                created_at,
                payment_term: text(doc, COL_PAYMENT_TERM),
                child_flag: text(doc, COL_CHILD_FLAG),
                quantity_sold: normalize::stored_decimal(doc.get(COL_QTY_SOLD)),
                product: text(doc, COL_SALES_PRODUCT),
                date: created_at.map(|ts| ts.date()),
            }
        })
        .collect()
}

pub fn purchases_from_documents(mut docs: Vec<Document>) -> Vec<PurchaseOrder> {
    normalize::normalize_documents(
        &mut docs,
        &[
            (COL_QTY_PAID, FieldKind::Decimal),
            (COL_CREATED, FieldKind::Timestamp),
        ],
    );

    docs.iter()
        .enumerate()
        .map(|(index, doc)| {
            let created_at = normalize::stored_timestamp(doc.get(COL_CREATED));
            let sequence = doc
                .get(COL_SEQUENCE)
                .and_then(sequence_value)
                .unwrap_or(index as u64 + 1);
            PurchaseOrder {
                reference: text(doc, COL_REFERENCE),
                product: text(doc, COL_PURCHASE_PRODUCT),
                quantity_paid: normalize::stored_decimal(doc.get(COL_QTY_PAID)),
                warehouse: text(doc, COL_WAREHOUSE),
                created_at,
                sequence,
                date: created_at.map(|ts| ts.date()),
            }
        })
        .collect()
}

fn sequence_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
