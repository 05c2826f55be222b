use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/videos", video_routes(config))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn video_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::video::upload_video,
            handlers::video::download_all_videos
        ))
        .routes(routes!(handlers::video::search_videos))
        .routes(routes!(handlers::video::download_flagged_videos))
        .routes(routes!(
            handlers::video::download_video,
            handlers::video::delete_video
        ))
        .routes(routes!(handlers::video::get_video_metadata))
        .routes(routes!(handlers::video::flag_video))
        .routes(routes!(handlers::video::reset_video_flags))
        .layer(handlers::video::upload_body_limit(config))
}
