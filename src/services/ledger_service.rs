use crate::catalog;
use crate::database::DbPool;
use crate::entities::{customers, recharge_records, reservations};
use crate::error::{AppError, AppResult};
use crate::models::{
    BalancePoint, CustomerResponse, HistoryItem, MembershipResponse, MembershipType,
    PaginatedResponse, PaginationParams, PaymentMethod, RechargeResponse, StaffIdentity,
};
use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};

#[derive(Clone)]
pub struct LedgerService {
    db: DbPool,
}

impl LedgerService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// 当前会员卡余额。
    pub async fn balance(&self, customer_id: i64) -> AppResult<i64> {
        self.balance_as_of(customer_id, BalancePoint::Now).await
    }

    /// 顾客概要，展示财务状态时用。
    pub async fn customer(&self, customer_id: i64) -> AppResult<CustomerResponse> {
        let customer = self.find_customer(customer_id).await?;
        Ok(customer.into())
    }

    /// 参照点处的余额：总充值减去此前所有会员卡扣款，向零封底。
    ///
    /// 每次查询都从全量历史重算，不维护增量账本。小店规模下 O(n) 读
    /// 无所谓，换来的是余额永远可对账。
    pub async fn balance_as_of(&self, customer_id: i64, point: BalancePoint) -> AppResult<i64> {
        let customer = self.find_customer(customer_id).await?;
        let charges = self.member_card_charges(customer_id).await?;

        Ok(balance_at_point(customer.total_recharged, &charges, &point))
    }

    /// 顾客全部预约按预约顺序排列，每条带扣款前的余额快照。
    pub async fn history(
        &self,
        customer_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<HistoryItem>> {
        let customer = self.find_customer(customer_id).await?;

        let rows = reservations::Entity::find()
            .filter(reservations::Column::CustomerId.eq(customer_id))
            .order_by_asc(reservations::Column::Date)
            .order_by_asc(reservations::Column::TimeSlot)
            .all(&self.db)
            .await?;

        // 一次正向遍历：余额快照取的是该次预约扣款之前的状态
        let mut spent: i64 = 0;
        let mut items = Vec::with_capacity(rows.len());
        for model in rows {
            let balance_before = (customer.total_recharged - spent).max(0);
            if model.payment_method == Some(PaymentMethod::MemberCard)
                && let Some(price) = model.final_price
            {
                spent += price;
            }
            items.push(HistoryItem {
                reservation: model.into(),
                balance_before,
            });
        }

        let total = items.len() as i64;
        let page_items: Vec<HistoryItem> = items
            .into_iter()
            .skip(params.get_offset())
            .take(params.get_per_page() as usize)
            .collect();

        Ok(PaginatedResponse::new(page_items, params, total))
    }

    /// 充值：记账、累加总充值、强制 VIP，同一事务内完成。
    pub async fn recharge(&self, customer_id: i64, amount: i64) -> AppResult<RechargeResponse> {
        if amount <= 0 {
            return Err(AppError::InvalidInput(
                "Recharge amount must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let customer = customers::Entity::find_by_id(customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {customer_id} not found")))?;

        recharge_records::ActiveModel {
            customer_id: Set(customer_id),
            amount: Set(amount),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let new_total = customer.total_recharged + amount;
        let mut active: customers::ActiveModel = customer.into();
        active.total_recharged = Set(new_total);
        // 充过值即 VIP，回退只能店长手动操作
        active.membership_type = Set(MembershipType::Vip);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        txn.commit().await?;

        log::info!("Customer {customer_id} recharged {amount}");

        let new_balance = self.balance(customer_id).await?;
        Ok(RechargeResponse {
            customer_id,
            new_balance,
            membership_type: MembershipType::Vip,
        })
    }

    /// 店长手动把顾客降回普通会员。充值带来的 VIP 不会自动消失。
    pub async fn revert_membership(
        &self,
        customer_id: i64,
        viewer: &StaffIdentity,
    ) -> AppResult<MembershipResponse> {
        if !viewer.is_manager() {
            return Err(AppError::PermissionDenied);
        }

        let customer = self.find_customer(customer_id).await?;
        let mut active: customers::ActiveModel = customer.into();
        active.membership_type = Set(MembershipType::Free);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;

        log::info!("Customer {customer_id} membership reverted to free");

        Ok(MembershipResponse {
            customer_id,
            membership_type: MembershipType::Free,
        })
    }

    async fn find_customer(&self, customer_id: i64) -> AppResult<customers::Model> {
        customers::Entity::find_by_id(customer_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer {customer_id} not found")))
    }

    /// 该顾客所有会员卡支付的预约，按预约顺序。
    async fn member_card_charges(&self, customer_id: i64) -> AppResult<Vec<reservations::Model>> {
        let rows = reservations::Entity::find()
            .filter(reservations::Column::CustomerId.eq(customer_id))
            .filter(reservations::Column::PaymentMethod.eq(PaymentMethod::MemberCard))
            .order_by_asc(reservations::Column::Date)
            .order_by_asc(reservations::Column::TimeSlot)
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}

/// 余额恒等式：max(0, 总充值 − 扣款之和)。所有余额展示最终都对账到这里。
pub fn balance_after_charges<I>(total_recharged: i64, charges: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    let spent: i64 = charges.into_iter().sum();
    (total_recharged - spent).max(0)
}

/// 预约顺序：先比日期，再比时段在时段表里的序号。
pub fn booking_order_key(date: NaiveDate, time_slot: &str) -> (NaiveDate, usize) {
    (
        date,
        catalog::position(time_slot).unwrap_or(catalog::SLOT_LABELS.len()),
    )
}

fn balance_at_point(
    total_recharged: i64,
    charges: &[reservations::Model],
    point: &BalancePoint,
) -> i64 {
    let deductions = charges
        .iter()
        .filter(|r| match point {
            BalancePoint::Now => true,
            // 参照点取「该次预约扣款之前」，所以是严格小于
            BalancePoint::Before { date, time_slot } => {
                booking_order_key(r.date, &r.time_slot) < booking_order_key(*date, time_slot)
            }
        })
        // 没谈好价的会员卡单不扣款
        .filter_map(|r| r.final_price);

    balance_after_charges(total_recharged, deductions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn charge(date: &str, slot: &str, price: i64) -> reservations::Model {
        reservations::Model {
            id: format!("res-{date}-{slot}"),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time_slot: slot.to_string(),
            customer_id: 1,
            provider_id: Some(1),
            note: None,
            final_price: Some(price),
            currency: "KRW".to_string(),
            payment_method: Some(PaymentMethod::MemberCard),
            deposit_paid: Some(true),
            is_acknowledged: true,
            membership_snapshot: MembershipType::Vip,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn customer(total_recharged: i64) -> customers::Model {
        customers::Model {
            id: 1,
            name: "김지우".to_string(),
            login_channel: Some("kakao:jiwoo".to_string()),
            phone: Some("010-1234-5678".to_string()),
            membership_type: MembershipType::Vip,
            total_recharged,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_balance_after_charges_basic() {
        assert_eq!(balance_after_charges(50000, [10000]), 40000);
        assert_eq!(balance_after_charges(50000, []), 50000);
    }

    #[test]
    fn test_balance_never_negative() {
        assert_eq!(balance_after_charges(50000, [10000, 45000]), 0);
        assert_eq!(balance_after_charges(0, [5000]), 0);
    }

    #[test]
    fn test_recharge_raises_balance_by_exact_amount() {
        // 没有并发扣款时，充 a 元余额恰好多 a 元
        let charges = [10000, 5000];
        let before = balance_after_charges(50000, charges);
        let after = balance_after_charges(50000 + 20000, charges);
        assert_eq!(after, before + 20000);
    }

    #[test]
    fn test_balance_recompute_is_deterministic() {
        let charges = vec![10000, 45000, 5000];
        let first = balance_after_charges(50000, charges.clone());
        let second = balance_after_charges(50000, charges);
        assert_eq!(first, second);
    }

    #[test]
    fn test_booking_order_key() {
        let d1 = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        // 同一天比时段，跨天日期优先
        assert!(booking_order_key(d1, "10:00") < booking_order_key(d1, "19:00"));
        assert!(booking_order_key(d1, "19:00") < booking_order_key(d2, "10:00"));
    }

    #[test]
    fn test_balance_at_point_scenario() {
        // 充 50000，按顺序三笔会员卡消费 10000 / 45000 / 5000
        let charges = vec![
            charge("2025-06-01", "10:00", 10000),
            charge("2025-06-02", "12:00", 45000),
            charge("2025-06-03", "14:00", 5000),
        ];

        let before = |date: &str, slot: &str| BalancePoint::Before {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time_slot: slot.to_string(),
        };

        // 第一笔之前分文未扣
        assert_eq!(balance_at_point(50000, &charges, &before("2025-06-01", "10:00")), 50000);
        // 第二笔之前扣了 10000
        assert_eq!(balance_at_point(50000, &charges, &before("2025-06-02", "12:00")), 40000);
        // 第三笔之前已经穿底，封在零
        assert_eq!(balance_at_point(50000, &charges, &before("2025-06-03", "14:00")), 0);
        // 当前余额同样是零
        assert_eq!(balance_at_point(50000, &charges, &BalancePoint::Now), 0);
    }

    #[test]
    fn test_unpriced_member_card_charge_deducts_nothing() {
        let mut unpriced = charge("2025-06-01", "10:00", 0);
        unpriced.final_price = None;
        let charges = vec![unpriced, charge("2025-06-02", "12:00", 20000)];

        assert_eq!(balance_at_point(50000, &charges, &BalancePoint::Now), 30000);
    }

    #[tokio::test]
    async fn test_balance_recomputed_from_store() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![customer(50000)]])
            .append_query_results([vec![
                charge("2025-06-01", "10:00", 10000),
                charge("2025-06-02", "12:00", 45000),
            ]])
            .into_connection();

        let balance = LedgerService::new(db).balance(1).await.unwrap();
        assert_eq!(balance, 0);
    }

    #[tokio::test]
    async fn test_balance_unknown_customer() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<customers::Model>::new()])
            .into_connection();

        let result = LedgerService::new(db).balance(404).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_carries_balance_before_each_booking() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![customer(50000)]])
            .append_query_results([vec![
                charge("2025-06-01", "10:00", 10000),
                charge("2025-06-02", "12:00", 45000),
                charge("2025-06-03", "14:00", 5000),
            ]])
            .into_connection();

        let params = PaginationParams::new(None, None);
        let page = LedgerService::new(db).history(1, &params).await.unwrap();

        let balances: Vec<i64> = page.items.iter().map(|i| i.balance_before).collect();
        assert_eq!(balances, vec![50000, 40000, 0]);
        assert_eq!(page.pagination.total, 3);
    }
}
