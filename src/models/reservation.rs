use crate::models::MembershipType;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    #[serde(rename = "cash")]
    Cash,
    #[sea_orm(string_value = "member_card")]
    #[serde(rename = "member_card")]
    MemberCard,
    #[sea_orm(string_value = "card")]
    #[serde(rename = "card")]
    Card,
    #[sea_orm(string_value = "wechat")]
    #[serde(rename = "wechat")]
    Wechat,
    #[sea_orm(string_value = "alipay")]
    #[serde(rename = "alipay")]
    Alipay,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::MemberCard => write!(f, "member_card"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Wechat => write!(f, "wechat"),
            PaymentMethod::Alipay => write!(f, "alipay"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailableSlotsQuery {
    #[schema(example = "2025-06-10")]
    pub date: String,
    pub provider_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    #[schema(example = "2025-06-10")]
    pub date: String, // YYYY-MM-DD
    #[schema(example = "14:00")]
    pub time_slot: String,
    pub customer_id: i64,
    pub provider_id: Option<i64>,
    pub note: Option<String>,
}

/// 店员对已有预约的就地修改，字段缺省表示不动。
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateReservationRequest {
    pub note: Option<String>,
    #[schema(example = 45000)]
    pub final_price: Option<i64>,
    #[schema(example = "KRW")]
    pub currency: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub deposit_paid: Option<bool>,
    pub is_acknowledged: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    pub id: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub customer_id: i64,
    pub provider_id: Option<i64>,
    pub note: Option<String>,
    pub final_price: Option<i64>,
    pub currency: String,
    pub payment_method: Option<PaymentMethod>,
    pub deposit_paid: Option<bool>,
    pub is_acknowledged: bool,
    pub membership_snapshot: MembershipType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entities::reservations::Model> for ReservationResponse {
    fn from(model: crate::entities::reservations::Model) -> Self {
        Self {
            id: model.id,
            date: model.date,
            time_slot: model.time_slot,
            customer_id: model.customer_id,
            provider_id: model.provider_id,
            note: model.note,
            final_price: model.final_price,
            currency: model.currency,
            payment_method: model.payment_method,
            deposit_paid: model.deposit_paid,
            is_acknowledged: model.is_acknowledged,
            membership_snapshot: model.membership_snapshot,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
