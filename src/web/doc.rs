use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::courses::course_outline_handler,
        crate::web::routes::courses::slide_get_handler,
        crate::web::routes::courses::slide_complete_handler,
        crate::web::routes::courses::progress_get_handler,
        crate::web::routes::courses::exam_start_handler,
        crate::web::routes::exam::session_state_handler,
        crate::web::routes::exam::session_answer_handler,
        crate::web::routes::exam::session_review_handler,
        crate::web::routes::certificates::certificate_issue_handler,
        crate::web::routes::certificates::certificate_get_handler,
        crate::web::routes::certificates::certificate_document_handler,
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;
