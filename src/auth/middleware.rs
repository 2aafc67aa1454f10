use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::{Value, json};

fn reject(req: ServiceRequest, body: Value) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(body);
    req.into_response(resp.map_into_boxed_body())
}

/// Verifies the bearer token and stores the caller as an [`AuthUser`] extension.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => h.to_str().map_err(|_| {
            actix_web::error::ErrorUnauthorized(
                json!({"error": "Invalid Authorization header encoding"}),
            )
        })?,
        None => return Ok(reject(req, json!({"error": "Missing Authorization header"}))),
    };

    let Some(token) = header_value.strip_prefix("Bearer ") else {
        return Ok(reject(
            req,
            json!({"error": "Authorization header must start with Bearer"}),
        ));
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            return Ok(reject(
                req,
                json!({"error": "Invalid or expired token", "details": e}),
            ));
        }
    };

    let Some(role) = Role::from_id(claims.role) else {
        return Ok(reject(req, json!({"error": "Invalid role"})));
    };

    tracing::debug!(user = %claims.sub, ?role, employee_id = ?claims.employee_id, "Authenticated");

    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
    });

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::testing::token;
    use crate::models::TokenType;
    use actix_web::middleware::from_fn;
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};

    async fn whoami(auth: AuthUser) -> HttpResponse {
        HttpResponse::Ok().json(json!({ "employeeId": auth.employee_id }))
    }

    fn config() -> Config {
        Config::for_tests("mw-secret")
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config()))
                .wrap(from_fn(auth_middleware))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_token_reaches_handler() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config()))
                .wrap(from_fn(auth_middleware))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let bearer = format!("Bearer {}", token(3, Some(1001), TokenType::Access, "mw-secret"));
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", bearer))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["employeeId"], 1001);
    }

    #[actix_web::test]
    async fn unknown_role_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config()))
                .wrap(from_fn(auth_middleware))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let bearer = format!("Bearer {}", token(42, None, TokenType::Access, "mw-secret"));
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", bearer))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
