use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    CreditTransactionKind, MembershipStatus, MembershipTier, OrderItemType, OrderStatus,
    PaymentMethod, TicketStatus, UserRole, WaitlistStatus,
};
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
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::event::list_events,
        handlers::event::get_event,
        handlers::event::list_products,
        handlers::order::checkout,
        handlers::order::confirm,
        handlers::order::get_orders,
        handlers::order::get_order,
        handlers::ticket::get_tickets,
        handlers::ticket::get_ticket,
        handlers::ticket::scan_ticket,
        handlers::membership::create_membership_intent,
        handlers::membership::confirm_membership,
        handlers::membership::get_membership,
        handlers::membership::cancel_membership,
        handlers::membership::redeem_credit,
        handlers::waitlist::join_waitlist,
        handlers::waitlist::get_waitlist_entries,
        handlers::waitlist::checkout_reservation,
        handlers::admin::create_event,
        handlers::admin::create_ticket_type,
        handlers::admin::adjust_capacity,
        handlers::admin::create_product,
        handlers::admin::promote_waitlist,
        handlers::admin::expire_pending_orders,
        handlers::health::health,
    ),
    components(
        schemas(
            UserResponse,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            AuthResponse,
            UpdateUserRequest,
            UserRole,
            EventResponse,
            EventDetailResponse,
            TicketTypeResponse,
            CreateEventRequest,
            CreateTicketTypeRequest,
            AdjustCapacityRequest,
            ProductResponse,
            CreateProductRequest,
            CheckoutLineItem,
            CheckoutRequest,
            CheckoutResponse,
            ConfirmOrderRequest,
            OrderResponse,
            OrderItemResponse,
            OrderDetailResponse,
            OrderStatus,
            PaymentMethod,
            OrderItemType,
            TicketResponse,
            ScanTicketRequest,
            ScanTicketResponse,
            TicketStatus,
            CreateMembershipIntentRequest,
            CreateMembershipIntentResponse,
            ConfirmMembershipRequest,
            ConfirmMembershipResponse,
            MembershipResponse,
            MembershipTier,
            MembershipStatus,
            CreditTransactionKind,
            RedeemCreditRequest,
            RedeemCreditResponse,
            JoinWaitlistRequest,
            WaitlistEntryResponse,
            PromoteWaitlistResponse,
            WaitlistStatus,
            HealthResponse,
            ComponentHealth,
            HealthStatus,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication API"),
        (name = "user", description = "User management API"),
        (name = "event", description = "Event catalog API"),
        (name = "product", description = "Product catalog API"),
        (name = "order", description = "Order & checkout API"),
        (name = "ticket", description = "Ticket & check-in API"),
        (name = "membership", description = "Membership & credit API"),
        (name = "waitlist", description = "Waitlist API"),
        (name = "admin", description = "Admin API"),
        (name = "health", description = "Health check"),
    ),
    info(
        title = "StagePass Backend API",
        version = "1.0.0",
        description = "StagePass ticketing backend REST API documentation"
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
