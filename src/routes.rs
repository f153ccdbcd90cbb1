use crate::{
    api::{attendance, department, user, work_hours},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Per-route limiter; a zero rate is clamped to one request per minute.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .configure(api_routes),
    );
}

/// Routes behind the access-token middleware, relative to the API prefix.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::check)
        .service(
            web::scope("/attendance")
                .route("/token", web::get().to(attendance::generate_token))
                .route("/token/check", web::post().to(attendance::check_token))
                .route("/submit", web::post().to(attendance::submit_attendance))
                .route("/today", web::get().to(attendance::today))
                .route("/monthly", web::get().to(attendance::monthly))
                .route("/employee", web::get().to(attendance::employee_monthly)),
        )
        .service(
            web::resource("/work-hours")
                .route(web::get().to(work_hours::current))
                .route(web::post().to(work_hours::supersede)),
        )
        .service(web::resource("/departments").route(web::get().to(department::list_departments)))
        .service(
            web::scope("/users")
                // /users
                .service(
                    web::resource("")
                        .route(web::get().to(user::list_users))
                        .route(web::post().to(user::create_user)),
                )
                // /users/search must win over /users/{id}
                .service(web::resource("/search").route(web::get().to(user::search_users)))
                // /users/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(user::get_user))
                        .route(web::put().to(user::edit_user)),
                ),
        );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ATTENDANCE
//  └─ GET token → POST token/check (optional) → POST submit
