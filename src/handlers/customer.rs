use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::error::AppError;
use crate::models::*;
use crate::services::LedgerService;

fn staff_identity(req: &HttpRequest) -> Option<StaffIdentity> {
    req.extensions().get::<StaffIdentity>().cloned()
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = "customer",
    params(
        ("id" = i64, Path, description = "顾客ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "顾客概要", body = CustomerResponse),
        (status = 404, description = "顾客不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_customer(
    ledger_service: web::Data<LedgerService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match ledger_service.customer(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customers/{id}/balance",
    tag = "customer",
    params(
        ("id" = i64, Path, description = "顾客ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "当前会员卡余额，永不为负", body = BalanceResponse),
        (status = 404, description = "顾客不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_balance(
    ledger_service: web::Data<LedgerService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let customer_id = path.into_inner();
    match ledger_service.balance(customer_id).await {
        Ok(balance) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": BalanceResponse {
                customer_id,
                balance,
            }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customers/{id}/history",
    tag = "customer",
    params(
        ("id" = i64, Path, description = "顾客ID"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "按预约顺序的历史记录，每条带扣款前余额"),
        (status = 404, description = "顾客不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_history(
    ledger_service: web::Data<LedgerService>,
    path: web::Path<i64>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let params = PaginationParams::new(query.page, query.per_page);
    match ledger_service.history(path.into_inner(), &params).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/customers/{id}/recharge",
    tag = "customer",
    params(
        ("id" = i64, Path, description = "顾客ID")
    ),
    request_body = RechargeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "充值成功，顾客转为 VIP", body = RechargeResponse),
        (status = 400, description = "金额必须为正"),
        (status = 404, description = "顾客不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn recharge(
    ledger_service: web::Data<LedgerService>,
    path: web::Path<i64>,
    request: web::Json<RechargeRequest>,
) -> Result<HttpResponse> {
    match ledger_service
        .recharge(path.into_inner(), request.amount)
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
    post,
    path = "/customers/{id}/revert-membership",
    tag = "customer",
    params(
        ("id" = i64, Path, description = "顾客ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "降级成功", body = MembershipResponse),
        (status = 403, description = "仅店长可操作"),
        (status = 404, description = "顾客不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn revert_membership(
    ledger_service: web::Data<LedgerService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let Some(viewer) = staff_identity(&req) else {
        return Ok(AppError::AuthError("Missing staff identity".to_string()).error_response());
    };

    match ledger_service
        .revert_membership(path.into_inner(), &viewer)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn customer_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/customers")
            .route("/{id}", web::get().to(get_customer))
            .route("/{id}/balance", web::get().to(get_balance))
            .route("/{id}/history", web::get().to(get_history))
            .route("/{id}/recharge", web::post().to(recharge))
            .route("/{id}/revert-membership", web::post().to(revert_membership)),
    );
}
