use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum StaffRole {
    #[sea_orm(string_value = "manager")]
    #[serde(rename = "manager")]
    Manager,
    #[sea_orm(string_value = "staff")]
    #[serde(rename = "staff")]
    Staff,
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffRole::Manager => write!(f, "manager"),
            StaffRole::Staff => write!(f, "staff"),
        }
    }
}

/// 认证中间件验证令牌后放进请求扩展的身份信息。
/// 令牌的签发在别的系统里，这里只消费。
#[derive(Debug, Clone)]
pub struct StaffIdentity {
    pub provider_id: i64,
    pub role: StaffRole,
}

impl StaffIdentity {
    pub fn is_manager(&self) -> bool {
        self.role == StaffRole::Manager
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderResponse {
    pub id: i64,
    pub name: String,
    pub skill_tier: String,
    pub role: StaffRole,
}

impl From<crate::entities::providers::Model> for ProviderResponse {
    fn from(model: crate::entities::providers::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            skill_tier: model.skill_tier,
            role: model.role,
        }
    }
}
