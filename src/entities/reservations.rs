use crate::models::{MembershipType, PaymentMethod};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

/// 一条预约。`(date, time_slot, provider_id)` 在 provider_id 非空时唯一，
/// 由数据库部分唯一索引保证，插入冲突即重复预约。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub customer_id: i64,
    pub provider_id: Option<i64>,
    pub note: Option<String>,
    pub final_price: Option<i64>,
    pub currency: String,
    pub payment_method: Option<PaymentMethod>,
    /// 定金：已收 / 未收 / 未谈
    pub deposit_paid: Option<bool>,
    pub is_acknowledged: bool,
    /// 下单时顾客的会员等级，落单即冻结
    pub membership_snapshot: MembershipType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
