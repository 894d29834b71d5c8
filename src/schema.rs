use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One configured external business-data connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Source {
    pub id: i64,
    pub alias: String,
    pub api_url: String,
    pub api_user: String,
    #[serde(default, skip_serializing)]
    pub api_password: String,
    #[serde(default)]
    pub refresh_seconds: u32,
}

/// The eight collections every source exposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Invoices,
    InvoiceItems,
    Purchases,
    Receivables,
    Payables,
    Products,
    Customers,
    Sellers,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Invoices,
        EntityKind::InvoiceItems,
        EntityKind::Purchases,
        EntityKind::Receivables,
        EntityKind::Payables,
        EntityKind::Products,
        EntityKind::Customers,
        EntityKind::Sellers,
    ];

    /// Path segment under `/v1/adm/` that serves this collection.
    pub fn endpoint(self) -> &'static str {
        match self {
            EntityKind::Invoices => "invoices",
            EntityKind::InvoiceItems => "invoiceitems",
            EntityKind::Purchases => "purchases",
            EntityKind::Receivables => "accreceivables",
            EntityKind::Payables => "accpayables",
            EntityKind::Products => "products",
            EntityKind::Customers => "customers",
            EntityKind::Sellers => "sellers",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Invoices => "invoices",
            EntityKind::InvoiceItems => "invoice items",
            EntityKind::Purchases => "purchases",
            EntityKind::Receivables => "receivables",
            EntityKind::Payables => "payables",
            EntityKind::Products => "products",
            EntityKind::Customers => "customers",
            EntityKind::Sellers => "sellers",
        };
        f.write_str(label)
    }
}

/// Sales invoice header.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Invoice {
    #[schemars(description = "Document number, the business key of the invoice")]
    pub numerod: Option<String>,
    #[schemars(description = "Customer code")]
    pub codclie: Option<String>,
    #[schemars(description = "Seller code")]
    pub codvend: Option<String>,
    #[schemars(description = "Emission timestamp, 'YYYY-MM-DD HH:MM:SS'")]
    pub fechae: Option<String>,
    #[schemars(description = "Due timestamp, 'YYYY-MM-DD HH:MM:SS'")]
    pub fechav: Option<String>,
    #[schemars(description = "Net total of the document")]
    pub mtototal: Option<f64>,
    #[schemars(description = "Portion paid in cash")]
    pub contado: Option<f64>,
    #[schemars(description = "Portion sold on credit")]
    pub credito: Option<f64>,
    #[schemars(description = "Cost of the goods sold on this document")]
    pub costoprd: Option<f64>,
    #[schemars(description = "VAT charged")]
    pub mtotax: Option<f64>,
    #[schemars(description = "VAT withheld by the customer")]
    pub reteniva: Option<f64>,
}

/// One line of a sales invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct InvoiceItem {
    pub numerod: Option<String>,
    #[schemars(description = "Product code of the line")]
    pub coditem: Option<String>,
    pub descrip1: Option<String>,
    pub fechae: Option<String>,
    pub cantidad: Option<f64>,
    #[schemars(description = "Unit price")]
    pub precio: Option<f64>,
    #[schemars(description = "Line total")]
    pub totalitem: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Purchase {
    pub numerod: Option<String>,
    pub codprov: Option<String>,
    pub descrip: Option<String>,
    pub fechae: Option<String>,
    pub mtototal: Option<f64>,
    pub contado: Option<f64>,
    pub credito: Option<f64>,
    pub mtotax: Option<f64>,
    pub reteniva: Option<f64>,
}

/// Accounts-receivable entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Receivable {
    pub numerod: Option<String>,
    pub codclie: Option<String>,
    pub fechae: Option<String>,
    #[schemars(description = "Due timestamp, 'YYYY-MM-DD HH:MM:SS'")]
    pub fechav: Option<String>,
    pub monto: Option<f64>,
    #[schemars(description = "Outstanding balance")]
    pub saldo: Option<f64>,
}

/// Accounts-payable entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Payable {
    pub numerod: Option<String>,
    pub codprov: Option<String>,
    pub fechae: Option<String>,
    pub fechav: Option<String>,
    pub monto: Option<f64>,
    pub saldo: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Product {
    pub codprod: Option<String>,
    pub descrip: Option<String>,
    #[schemars(description = "1 when the product is active")]
    pub activo: Option<i32>,
    #[schemars(description = "Current unit cost")]
    pub costact: Option<f64>,
    pub precio1: Option<f64>,
    pub existen: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Customer {
    pub codclie: Option<String>,
    pub descrip: Option<String>,
    pub activo: Option<i32>,
    pub saldo: Option<f64>,
    pub codvend: Option<String>,
    pub email: Option<String>,
    pub telef: Option<String>,
    pub limitecred: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Seller {
    pub codvend: Option<String>,
    pub descrip: Option<String>,
    pub activo: Option<i32>,
    pub email: Option<String>,
    pub telef: Option<String>,
}

pub(crate) fn is_active(flag: Option<i32>) -> bool {
    flag == Some(1)
}
