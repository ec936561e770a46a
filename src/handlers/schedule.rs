use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::error::AppError;
use crate::models::*;
use crate::services::ScheduleService;

fn staff_identity(req: &HttpRequest) -> Option<StaffIdentity> {
    req.extensions().get::<StaffIdentity>().cloned()
}

#[utoipa::path(
    get,
    path = "/schedule/available-slots",
    tag = "schedule",
    params(
        ("date" = String, Query, description = "日期 YYYY-MM-DD"),
        ("provider_id" = i64, Query, description = "美甲师ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "空闲时段列表，按时段表顺序"),
        (status = 400, description = "日期格式错误"),
        (status = 401, description = "未授权")
    )
)]
pub async fn available_slots(
    schedule_service: web::Data<ScheduleService>,
    query: web::Query<AvailableSlotsQuery>,
) -> Result<HttpResponse> {
    match schedule_service
        .available_slots(&query.date, query.provider_id)
        .await
    {
        Ok(slots) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": slots
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/schedule/reservations",
    tag = "schedule",
    request_body = CreateReservationRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建预约成功", body = ReservationResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "顾客不存在"),
        (status = 409, description = "该时段已被预约"),
        (status = 401, description = "未授权")
    )
)]
pub async fn create_reservation(
    schedule_service: web::Data<ScheduleService>,
    request: web::Json<CreateReservationRequest>,
) -> Result<HttpResponse> {
    match schedule_service
        .create_reservation(request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/schedule/reservations/{id}",
    tag = "schedule",
    params(
        ("id" = String, Path, description = "预约ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "预约详情", body = ReservationResponse),
        (status = 404, description = "预约不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_reservation(
    schedule_service: web::Data<ScheduleService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match schedule_service.get_reservation(&path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/schedule/reservations/{id}",
    tag = "schedule",
    params(
        ("id" = String, Path, description = "预约ID")
    ),
    request_body = UpdateReservationRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "修改预约成功", body = ReservationResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "预约不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn update_reservation(
    schedule_service: web::Data<ScheduleService>,
    path: web::Path<String>,
    request: web::Json<UpdateReservationRequest>,
) -> Result<HttpResponse> {
    match schedule_service
        .update_reservation(&path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/schedule/reservations/{id}",
    tag = "schedule",
    params(
        ("id" = String, Path, description = "预约ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "取消预约成功"),
        (status = 404, description = "预约不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn cancel_reservation(
    schedule_service: web::Data<ScheduleService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match schedule_service.cancel_reservation(&path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/schedule/months/{month}",
    tag = "schedule",
    params(
        ("month" = String, Path, description = "月份 YYYY-MM")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "整月预约快照，店员只含自己名下与未指派的"),
        (status = 400, description = "月份格式错误"),
        (status = 401, description = "未授权")
    )
)]
pub async fn month_reservations(
    schedule_service: web::Data<ScheduleService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let Some(viewer) = staff_identity(&req) else {
        return Ok(AppError::AuthError("Missing staff identity".to_string()).error_response());
    };

    match schedule_service
        .month_reservations(&path.into_inner(), &viewer)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/schedule/providers",
    tag = "schedule",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "美甲师名单"),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_providers(
    schedule_service: web::Data<ScheduleService>,
) -> Result<HttpResponse> {
    match schedule_service.providers().await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn schedule_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/schedule")
            .route("/available-slots", web::get().to(available_slots))
            .route("/providers", web::get().to(list_providers))
            .route("/reservations", web::post().to(create_reservation))
            .route("/reservations/{id}", web::get().to(get_reservation))
            .route("/reservations/{id}", web::patch().to(update_reservation))
            .route("/reservations/{id}", web::delete().to(cancel_reservation))
            .route("/months/{month}", web::get().to(month_reservations)),
    );
}
