use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::schedule::available_slots,
        handlers::schedule::create_reservation,
        handlers::schedule::get_reservation,
        handlers::schedule::update_reservation,
        handlers::schedule::cancel_reservation,
        handlers::schedule::month_reservations,
        handlers::schedule::list_providers,
        handlers::customer::get_customer,
        handlers::customer::get_balance,
        handlers::customer::get_history,
        handlers::customer::recharge,
        handlers::customer::revert_membership,
    ),
    components(
        schemas(
            AvailableSlotsQuery,
            CreateReservationRequest,
            UpdateReservationRequest,
            ReservationResponse,
            PaymentMethod,
            MembershipType,
            StaffRole,
            CustomerResponse,
            ProviderResponse,
            BalanceResponse,
            RechargeRequest,
            RechargeResponse,
            MembershipResponse,
            HistoryItem,
            HistoryQuery,
            PaginationInfo,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "schedule", description = "Reservation scheduling API"),
        (name = "customer", description = "Customer balance and membership API"),
    ),
    info(
        title = "Unnie Nails Backend API",
        version = "1.0.0",
        description = "Nail salon booking console REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
