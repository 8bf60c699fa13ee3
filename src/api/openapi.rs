//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, lends, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfmark API",
        version = "0.1.0",
        description = "Library catalog and lending REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::import_books,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Lends
        lends::create_lend,
        lends::get_book_stock,
        lends::get_book_lends,
        lends::get_user_lends,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::NewBook,
            crate::models::book::UpdateBook,
            books::ImportUpload,
            crate::models::import_report::ImportSummary,
            crate::models::import_report::RowFailure,
            // Users
            crate::models::user::User,
            crate::models::user::NewUser,
            crate::models::user::UpdateUser,
            // Lends
            crate::models::lend::Lend,
            lends::LendRequest,
            lends::LendResponse,
            lends::StockResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog and bulk import"),
        (name = "users", description = "User management"),
        (name = "lends", description = "Lending and stock")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
