use crate::{api::attendance, auth::middleware::auth_middleware, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Per-IP limiter for the protected scope
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("replenish interval and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(build_limiter(config.rate_protected_per_min)) // rate limiting
            .service(
                web::scope("/attendance")
                    .route("/check-in", web::post().to(attendance::check_in))
                    .route("/check-out", web::post().to(attendance::check_out))
                    .route("/me", web::get().to(attendance::my_attendance))
                    .route("/stats", web::get().to(attendance::attendance_stats))
                    .route(
                        "/employee/{employee_id}",
                        web::get().to(attendance::employee_attendance),
                    )
                    // /attendance/{id}
                    .route("/{attendance_id}", web::patch().to(attendance::update_attendance)),
            ),
    );
}
