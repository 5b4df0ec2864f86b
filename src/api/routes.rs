// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Public
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::list_games))
        .route("/login", web::post().to(handlers::login))
        .route("/logout", web::get().to(handlers::logout))
        // Session required (see auth::SessionGate)
        .route("/game/{id}", web::get().to(handlers::game_page))
        .route("/game/{id}/action", web::post().to(handlers::game_action))
        .route("/user", web::get().to(handlers::user_dashboard))
        .route("/user/votes", web::get().to(handlers::user_votes))
        .route("/user/follows", web::get().to(handlers::user_follows))
        .service(
            web::resource("/settings")
                .route(web::get().to(handlers::get_settings))
                .route(web::post().to(handlers::update_settings)),
        );
}
