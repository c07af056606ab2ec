//! OpenAPI / Swagger UI documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::{
    BalanceResponse, CounterpartDto, HealthResponse, HistoryItem, HistoryResponse,
    TransferApiRequest, TransferResponse,
};
use crate::gateway::types::ErrorBody;

/// Bearer JWT security scheme for the private routes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "HS256 bearer token issued by the external auth layer; \
                             the `sub` claim is the account id",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fundflow Transfer API",
        version = "1.0.0",
        description = "Atomic two-account transfers with idempotency keys, \
                       optimistic versioning and cursor-paged history.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::create_transfer,
        crate::gateway::handlers::get_history,
        crate::gateway::handlers::get_balance,
    ),
    components(
        schemas(
            HealthResponse,
            TransferApiRequest,
            TransferResponse,
            HistoryItem,
            HistoryResponse,
            CounterpartDto,
            BalanceResponse,
            ErrorBody,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Transfer", description = "Fund transfers and history (auth required)"),
        (name = "Account", description = "Balance queries (auth required)"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
