use crate::model::role::Role;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorForbidden,
    error::ErrorUnauthorized,
};
use futures::future::{Ready, ready};

/// Caller identity placed in request extensions by [`auth_middleware`](super::middleware::auth_middleware).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Missing token")),
        )
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ErrorForbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if self.role.can_review_attendance() {
            Ok(())
        } else {
            Err(ErrorForbidden("HR/Admin only"))
        }
    }

    /// The employee record this caller checks in and out as.
    pub fn require_employee_id(&self) -> actix_web::Result<u64> {
        self.employee_id
            .ok_or_else(|| ErrorForbidden("No employee profile"))
    }
}
