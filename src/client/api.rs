use crate::client::monthly::MonthlyCache;
use crate::client::store::{DISPLAY_MODE_KEY, LocalStore};
use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, ReservationResponse, UpdateReservationRequest};
use chrono::NaiveDate;
use reqwest::Client;

/// 控制台访问服务端的薄 HTTP 客户端。
#[derive(Clone)]
pub struct CalendarApi {
    client: Client,
    base_url: String,
    token: String,
}

impl CalendarApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// 整月预约快照。服务端按登录身份过滤，这边拿到什么存什么。
    pub async fn fetch_month(&self, month_key: &str) -> AppResult<Vec<ReservationResponse>> {
        let url = format!("{}/api/v1/schedule/months/{month_key}", self.base_url);
        let body: ApiResponse<Vec<ReservationResponse>> = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .json()
            .await?;

        body.data
            .ok_or_else(|| AppError::InternalError(format!("Empty month response: {month_key}")))
    }

    pub async fn update_reservation(
        &self,
        reservation_id: &str,
        request: &UpdateReservationRequest,
    ) -> AppResult<ReservationResponse> {
        let url = format!(
            "{}/api/v1/schedule/reservations/{reservation_id}",
            self.base_url
        );
        let body: ApiResponse<ReservationResponse> = self
            .client
            .patch(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?
            .json()
            .await?;

        body.data.ok_or_else(|| {
            AppError::InternalError(format!("Empty update response: {reservation_id}"))
        })
    }
}

/// 一次控制台会话：HTTP 客户端 + 月缓存 + 展示偏好。
///
/// 启动即两阶段：先把详情页回传的删除信号对账掉，再恢复缓存，
/// 最后清掉过期月份。之后的月视图先问缓存，不命中才回源。
pub struct CalendarSession {
    api: CalendarApi,
    cache: MonthlyCache,
    store: LocalStore,
}

impl CalendarSession {
    /// 缓存保留的回看窗口。
    const RETAIN_DAYS: i64 = 90;

    pub fn start(
        api: CalendarApi,
        store: LocalStore,
        deleted_ids: &[String],
        today: NaiveDate,
    ) -> Self {
        let mut cache = MonthlyCache::open(store.clone(), deleted_ids);
        cache.evict_older_than(Self::RETAIN_DAYS, today);

        Self { api, cache, store }
    }

    /// 月视图：命中直接回，不命中拉服务端整月快照并落缓存。
    pub async fn month_view(&mut self, month_key: &str) -> AppResult<Vec<ReservationResponse>> {
        if let Some(rows) = self.cache.get(month_key) {
            return Ok(rows.to_vec());
        }

        if self.cache.begin_fetch(month_key) {
            match self.api.fetch_month(month_key).await {
                Ok(rows) => self.cache.complete_fetch(month_key, rows),
                Err(e) => {
                    self.cache.abort_fetch(month_key);
                    return Err(e);
                }
            }
        }

        Ok(self
            .cache
            .get(month_key)
            .map(|rows| rows.to_vec())
            .unwrap_or_default())
    }

    /// 强制刷新：作废后回源。
    pub async fn refresh_month(&mut self, month_key: &str) -> AppResult<Vec<ReservationResponse>> {
        self.cache.invalidate(month_key);
        self.month_view(month_key).await
    }

    /// 打开预约详情时的乐观已读标记：先改本地，服务端失败再回滚。
    pub async fn acknowledge(&mut self, reservation_id: &str) -> AppResult<()> {
        let undo = self
            .cache
            .patch_locally(reservation_id, |row| row.is_acknowledged = true);

        let request = UpdateReservationRequest {
            note: None,
            final_price: None,
            currency: None,
            payment_method: None,
            deposit_paid: None,
            is_acknowledged: Some(true),
        };

        match self.api.update_reservation(reservation_id, &request).await {
            Ok(_) => Ok(()),
            Err(e) => {
                if let Some(undo) = undo {
                    self.cache.undo_patch(undo);
                }
                Err(e)
            }
        }
    }

    /// 详情页取消预约后带回的删除信号。
    pub fn reconcile_deletion(&mut self, reservation_id: &str) -> bool {
        self.cache.reconcile_deletion(reservation_id)
    }

    pub fn display_mode(&self) -> Option<String> {
        self.store.read_json(DISPLAY_MODE_KEY)
    }

    pub fn set_display_mode(&self, mode: &str) {
        self.store.write_json(DISPLAY_MODE_KEY, &mode);
    }
}
