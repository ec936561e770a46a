use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum MembershipType {
    #[sea_orm(string_value = "free")]
    #[serde(rename = "free")]
    Free,
    #[sea_orm(string_value = "vip")]
    #[serde(rename = "vip")]
    Vip,
}

impl std::fmt::Display for MembershipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipType::Free => write!(f, "free"),
            MembershipType::Vip => write!(f, "vip"),
        }
    }
}

/// 余额查询的参照点：当前，或某次预约之前（按 date + time_slot 的预约顺序）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalancePoint {
    Now,
    Before { date: NaiveDate, time_slot: String },
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    pub id: i64,
    pub name: String,
    pub login_channel: Option<String>,
    pub phone: Option<String>,
    pub membership_type: MembershipType,
    pub total_recharged: i64,
}

impl From<crate::entities::customers::Model> for CustomerResponse {
    fn from(model: crate::entities::customers::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            login_channel: model.login_channel,
            phone: model.phone,
            membership_type: model.membership_type,
            total_recharged: model.total_recharged,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub customer_id: i64,
    /// 会员卡余额，永不为负
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RechargeRequest {
    #[schema(example = 50000)]
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RechargeResponse {
    pub customer_id: i64,
    pub new_balance: i64,
    /// 充值后一律为 vip
    pub membership_type: MembershipType,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MembershipResponse {
    pub customer_id: i64,
    pub membership_type: MembershipType,
}

/// 历史记录里的单条预约，附带该次预约扣款前的余额快照。
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryItem {
    pub reservation: crate::models::ReservationResponse,
    pub balance_before: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
