use crate::config::NotifierConfig;
use crate::models::ReservationResponse;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct BookingEvent {
    event: &'static str,
    reservation_id: String,
    date: String,
    time_slot: String,
    customer_id: i64,
    provider_id: Option<i64>,
}

/// 预约创建/取消后的站外通知。发送方不关心结果，失败只记日志。
#[derive(Clone)]
pub struct NotifierService {
    client: Client,
    config: NotifierConfig,
}

impl NotifierService {
    pub fn new(config: NotifierConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    pub async fn booking_created(&self, reservation: &ReservationResponse) {
        self.send(BookingEvent {
            event: "booking_created",
            reservation_id: reservation.id.clone(),
            date: reservation.date.format("%Y-%m-%d").to_string(),
            time_slot: reservation.time_slot.clone(),
            customer_id: reservation.customer_id,
            provider_id: reservation.provider_id,
        })
        .await;
    }

    pub async fn booking_cancelled(&self, reservation: &ReservationResponse) {
        self.send(BookingEvent {
            event: "booking_cancelled",
            reservation_id: reservation.id.clone(),
            date: reservation.date.format("%Y-%m-%d").to_string(),
            time_slot: reservation.time_slot.clone(),
            customer_id: reservation.customer_id,
            provider_id: reservation.provider_id,
        })
        .await;
    }

    async fn send(&self, event: BookingEvent) {
        if self.config.webhook_url.is_empty() {
            log::debug!("Notifier disabled, skipping {} event", event.event);
            return;
        }

        let result = self
            .client
            .post(&self.config.webhook_url)
            .json(&event)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                log::info!(
                    "Sent {} notification for reservation {}",
                    event.event,
                    event.reservation_id
                );
            }
            Ok(response) => {
                log::warn!(
                    "Notifier returned {} for reservation {}",
                    response.status(),
                    event.reservation_id
                );
            }
            Err(e) => {
                log::warn!(
                    "Failed to send {} notification for reservation {}: {e}",
                    event.event,
                    event.reservation_id
                );
            }
        }
    }
}
