//! Contact entity - phone numbers, emails, addresses and social links.
//!
//! At most one row per [`ContactType`] carries `is_primary`; rows are displayed
//! in `order_index` order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of contact entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    /// Telephone or WhatsApp number
    #[sea_orm(string_value = "phone")]
    Phone,
    /// Email address
    #[sea_orm(string_value = "email")]
    Email,
    /// Physical address or map link
    #[sea_orm(string_value = "location")]
    Location,
    /// Social media profile
    #[sea_orm(string_value = "social")]
    Social,
}

/// Contact database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Kind of contact
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    /// Display label (e.g. "Tata Usaha")
    pub label: String,
    /// The number, address, or URL
    pub value: String,
    /// Optional icon name
    pub icon: Option<String>,
    /// Display position, ascending
    pub order_index: i32,
    /// Preferred entry among rows of the same type
    pub is_primary: bool,
}

/// Contacts have no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
