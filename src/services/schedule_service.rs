use crate::catalog;
use crate::database::DbPool;
use crate::entities::{customers, providers, reservations};
use crate::error::{AppError, AppResult};
use crate::external::NotifierService;
use crate::models::{
    CreateReservationRequest, ProviderResponse, ReservationResponse, StaffIdentity,
    UpdateReservationRequest,
};
use crate::utils::{month_bounds, parse_date};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, SqlErr,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct ScheduleService {
    db: DbPool,
    notifier: NotifierService,
}

impl ScheduleService {
    pub fn new(db: DbPool, notifier: NotifierService) -> Self {
        Self { db, notifier }
    }

    /// 某天某美甲师还空着的时段，按时段表顺序。
    ///
    /// 不存在的美甲师查出来占用为空，照样返回整张时段表，历史行为如此，
    /// 前端依赖这个兜底。
    pub async fn available_slots(
        &self,
        date: &str,
        provider_id: i64,
    ) -> AppResult<Vec<&'static str>> {
        let date = parse_date(date)?;

        let reserved: Vec<String> = reservations::Entity::find()
            .filter(reservations::Column::Date.eq(date))
            .filter(reservations::Column::ProviderId.eq(provider_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|r| r.time_slot)
            .collect();

        Ok(catalog::free_slots(&reserved))
    }

    /// 创建预约并返回完整落库行。
    ///
    /// 冲突检测不做先查后插：指派了美甲师的 (date, time_slot, provider_id)
    /// 由部分唯一索引在插入时拦截，两个并发请求最多成功一个。
    /// 调用方在超时后重试前应先按内容查重，插入本身不能盲目重发。
    pub async fn create_reservation(
        &self,
        request: CreateReservationRequest,
    ) -> AppResult<ReservationResponse> {
        if !catalog::contains(&request.time_slot) {
            return Err(AppError::InvalidInput(format!(
                "Unknown time slot: {}",
                request.time_slot
            )));
        }
        let date = parse_date(&request.date)?;

        let customer = customers::Entity::find_by_id(request.customer_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        let now = Utc::now();
        let model = reservations::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            date: Set(date),
            time_slot: Set(request.time_slot.clone()),
            customer_id: Set(customer.id),
            provider_id: Set(request.provider_id),
            note: Set(request.note.clone()),
            final_price: Set(None),
            currency: Set("KRW".to_string()),
            payment_method: Set(None),
            deposit_paid: Set(None),
            is_acknowledged: Set(false),
            // 会员等级在下单这一刻冻结
            membership_snapshot: Set(customer.membership_type),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = match model.insert(&self.db).await {
            Ok(inserted) => inserted,
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(AppError::SlotConflict(format!(
                        "{} {} already booked for provider {:?}",
                        request.date, request.time_slot, request.provider_id
                    )));
                }
                return Err(err.into());
            }
        };

        let response = ReservationResponse::from(inserted);

        // 通知不阻塞下单，失败由 notifier 自己记日志
        let notifier = self.notifier.clone();
        let event = response.clone();
        tokio::spawn(async move { notifier.booking_created(&event).await });

        Ok(response)
    }

    pub async fn get_reservation(&self, id: &str) -> AppResult<ReservationResponse> {
        let model = reservations::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation {id} not found")))?;

        Ok(model.into())
    }

    /// 店员对预约的就地修改：备注、结算价、定金、已读标记等。
    pub async fn update_reservation(
        &self,
        id: &str,
        request: UpdateReservationRequest,
    ) -> AppResult<ReservationResponse> {
        if let Some(price) = request.final_price
            && price < 0
        {
            return Err(AppError::InvalidInput(
                "final_price must be non-negative".to_string(),
            ));
        }

        let model = reservations::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation {id} not found")))?;

        let mut active: reservations::ActiveModel = model.into();
        if let Some(note) = request.note {
            active.note = Set(Some(note));
        }
        if let Some(price) = request.final_price {
            active.final_price = Set(Some(price));
        }
        if let Some(currency) = request.currency {
            active.currency = Set(currency);
        }
        if let Some(method) = request.payment_method {
            active.payment_method = Set(Some(method));
        }
        if let Some(deposit) = request.deposit_paid {
            active.deposit_paid = Set(Some(deposit));
        }
        if let Some(acknowledged) = request.is_acknowledged {
            active.is_acknowledged = Set(acknowledged);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        Ok(updated.into())
    }

    /// 取消即硬删，删完异步发取消通知。
    pub async fn cancel_reservation(&self, id: &str) -> AppResult<()> {
        let model = reservations::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation {id} not found")))?;

        let response = ReservationResponse::from(model);

        reservations::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;

        let notifier = self.notifier.clone();
        tokio::spawn(async move { notifier.booking_cancelled(&response).await });

        log::info!("Reservation {id} cancelled");
        Ok(())
    }

    /// 整月预约，按 (日期, 时段) 排序。店员只看到自己名下和未指派的预约，
    /// 店长全量。客户端月缓存的一个条目就是这里的一次完整快照。
    pub async fn month_reservations(
        &self,
        month: &str,
        viewer: &StaffIdentity,
    ) -> AppResult<Vec<ReservationResponse>> {
        let (first, next_first) = month_bounds(month)?;

        let mut query = reservations::Entity::find()
            .filter(reservations::Column::Date.gte(first))
            .filter(reservations::Column::Date.lt(next_first))
            .order_by_asc(reservations::Column::Date)
            .order_by_asc(reservations::Column::TimeSlot);

        if !viewer.is_manager() {
            query = query.filter(
                Condition::any()
                    .add(reservations::Column::ProviderId.eq(viewer.provider_id))
                    .add(reservations::Column::ProviderId.is_null()),
            );
        }

        let rows = query.all(&self.db).await?;
        Ok(rows.into_iter().map(ReservationResponse::from).collect())
    }

    /// 美甲师名单，下单选人用。
    pub async fn providers(&self) -> AppResult<Vec<ProviderResponse>> {
        let rows = providers::Entity::find()
            .order_by_asc(providers::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(ProviderResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifierConfig;
    use crate::models::MembershipType;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service(db: DbPool) -> ScheduleService {
        ScheduleService::new(db, NotifierService::new(NotifierConfig::default()))
    }

    fn reservation_fixture(slot: &str) -> reservations::Model {
        reservations::Model {
            id: format!("res-{slot}"),
            date: chrono::NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            time_slot: slot.to_string(),
            customer_id: 1,
            provider_id: Some(1),
            note: None,
            final_price: None,
            currency: "KRW".to_string(),
            payment_method: None,
            deposit_paid: None,
            is_acknowledged: false,
            membership_snapshot: MembershipType::Free,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_available_slots_subtracts_reserved() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reservation_fixture("12:00")]])
            .into_connection();

        let slots = service(db).available_slots("2025-06-10", 1).await.unwrap();
        assert_eq!(slots, vec!["10:00", "14:00", "16:00", "19:00"]);
    }

    #[tokio::test]
    async fn test_available_slots_full_catalog_when_nothing_reserved() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reservations::Model>::new()])
            .into_connection();

        let slots = service(db).available_slots("2025-06-10", 999).await.unwrap();
        assert_eq!(slots, catalog::SLOT_LABELS.to_vec());
    }

    #[tokio::test]
    async fn test_available_slots_rejects_malformed_date() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).available_slots("06/10/2025", 1).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_reservation_rejects_unknown_slot() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let request = CreateReservationRequest {
            date: "2025-06-10".to_string(),
            time_slot: "11:00".to_string(),
            customer_id: 1,
            provider_id: Some(1),
            note: None,
        };
        let result = service(db).create_reservation(request).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
