// HTTP request handlers for API endpoints

use actix_web::{cookie::Cookie, http::header, web, HttpRequest, HttpResponse};

use super::auth::{session_token, CookieConfig, SessionUser, SESSION_COOKIE};
use super::error::ApiError;
use super::models::*;
use crate::accounts::{self, LoginForm};
use crate::database_ops::activity::{self, FollowState};
use crate::database_ops::db::Db;
use crate::database_ops::games::{self, Game};
use crate::database_ops::users::{self, ProfileUpdate};
use crate::normalization::VoteScore;

pub const GAMES_PER_PAGE: u32 = 12;
pub const ACTIVITY_PER_PAGE: u32 = 10;
pub const COMMENTS_SHOWN: u32 = 20;

type ApiResult = Result<HttpResponse, ApiError>;

fn ok<T: serde::Serialize>(data: T) -> ApiResult {
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

async fn require_game(db: &Db, id: &str) -> Result<Game, ApiError> {
    games::get_game(db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Game '{id}' not found.")))
}

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>) -> ApiResult {
    let database = if db.ping().await { "connected" } else { "disconnected" };
    ok(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
    })
}

/// Catalog listing, public. Ranked by default, `?order=recent` for newest first.
pub async fn list_games(db: web::Data<Db>, query: web::Query<CatalogQuery>) -> ApiResult {
    let page = games::list_games(&db, query.order, query.page(), GAMES_PER_PAGE).await?;
    ok(page)
}

pub async fn login(
    db: web::Data<Db>,
    cookies: web::Data<CookieConfig>,
    query: web::Query<NextQuery>,
    form: web::Json<LoginForm>,
) -> ApiResult {
    let (user, session) = accounts::login(&db, &form).await?;
    Ok(HttpResponse::Ok()
        .cookie(cookies.session_cookie(session.token))
        .json(ApiResponse::success(LoginResponse {
            username: user.username,
            next: query.target(),
        })))
}

pub async fn logout(req: HttpRequest, db: web::Data<Db>) -> ApiResult {
    if let Some(token) = session_token(&req) {
        if users::delete_session(&db, &token).await? {
            tracing::info!("session closed");
        }
    }
    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .cookie(removal)
        .finish())
}

/// `/game/{id}` serves the detail view; `/game/{id}.json` the flat document.
pub async fn game_page(
    db: web::Data<Db>,
    user: web::ReqData<SessionUser>,
    path: web::Path<String>,
) -> ApiResult {
    let raw = path.into_inner();
    match raw.strip_suffix(".json") {
        Some(id) => game_json(&db, id).await,
        None => game_detail(&db, user.user_id, &raw).await,
    }
}

async fn game_detail(db: &Db, user_id: i64, id: &str) -> ApiResult {
    let game = require_game(db, id).await?;
    let stats = games::game_stats(db, id).await?;
    let comments = activity::recent_comments(db, id, COMMENTS_SHOWN).await?;
    let user_vote = activity::user_vote(db, user_id, id).await?.map(|v| v.score);
    let user_follow = activity::is_following(db, user_id, id).await?;
    ok(GameDetail {
        game,
        stats,
        comments,
        user_vote,
        user_follow,
    })
}

async fn game_json(db: &Db, id: &str) -> ApiResult {
    let Some(game) = games::get_game(db, id).await? else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({ "error": "Game not found" })));
    };
    let stats = games::game_stats(db, id).await?;
    Ok(HttpResponse::Ok().json(GameJson::new(game, &stats)))
}

pub async fn game_action(
    db: web::Data<Db>,
    user: web::ReqData<SessionUser>,
    path: web::Path<String>,
    action: web::Json<GameAction>,
) -> ApiResult {
    let game = require_game(&db, &path).await?;
    let user_id = user.user_id;

    let result = match action.into_inner() {
        GameAction::Vote { score } => {
            let score =
                VoteScore::new(score).ok_or_else(|| ApiError::BadRequest("Invalid vote score.".into()))?;
            activity::cast_vote(&db, user_id, &game.id, score).await?;
            ActionResult {
                message: format!("Your vote ({}) has been recorded.", score.get()),
                follow: None,
            }
        }
        GameAction::Follow => {
            let state = activity::toggle_follow(&db, user_id, &game.id).await?;
            let message = match state {
                FollowState::Following => format!("You are now following {}.", game.title),
                FollowState::Unfollowed => format!("You have unfollowed {}.", game.title),
            };
            ActionResult {
                message,
                follow: Some(state),
            }
        }
        GameAction::Comment { body } => {
            let body = body.trim();
            if body.is_empty() {
                return Err(ApiError::BadRequest("Could not post your comment.".into()));
            }
            activity::add_comment(&db, user_id, &game.id, body).await?;
            ActionResult {
                message: "Your comment has been posted.".to_string(),
                follow: None,
            }
        }
    };

    tracing::info!(user_id, game_id = %game.id, message = %result.message, "game action");
    ok(result)
}

pub async fn user_dashboard(db: web::Data<Db>, user: web::ReqData<SessionUser>) -> ApiResult {
    let account = users::find_user(&db, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".into()))?;
    let profile = users::get_profile(&db, account.id).await?;
    let display_name = profile
        .as_ref()
        .map(|p| p.display_name(&account.username).to_string())
        .unwrap_or_else(|| account.username.clone());
    let stats = users::user_stats(&db, account.id).await?;
    ok(Dashboard {
        username: account.username,
        display_name,
        stats,
    })
}

pub async fn user_votes(
    db: web::Data<Db>,
    user: web::ReqData<SessionUser>,
    query: web::Query<PageQuery>,
) -> ApiResult {
    ok(activity::user_votes(&db, user.user_id, query.page(), ACTIVITY_PER_PAGE).await?)
}

pub async fn user_follows(
    db: web::Data<Db>,
    user: web::ReqData<SessionUser>,
    query: web::Query<PageQuery>,
) -> ApiResult {
    ok(activity::user_follows(&db, user.user_id, query.page(), ACTIVITY_PER_PAGE).await?)
}

async fn load_settings(db: &Db, user_id: i64) -> Result<Settings, ApiError> {
    let account = users::find_user(db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".into()))?;
    let profile = users::get_profile(db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found.".into()))?;
    Ok(Settings {
        display_name: profile.display_name(&account.username).to_string(),
        profile,
    })
}

pub async fn get_settings(db: web::Data<Db>, user: web::ReqData<SessionUser>) -> ApiResult {
    ok(load_settings(&db, user.user_id).await?)
}

pub async fn update_settings(
    db: web::Data<Db>,
    user: web::ReqData<SessionUser>,
    update: web::Json<ProfileUpdate>,
) -> ApiResult {
    if update.font_family.trim().is_empty() {
        return Err(ApiError::BadRequest("Font family is required.".into()));
    }
    users::update_profile(&db, user.user_id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found.".into()))?;
    ok(load_settings(&db, user.user_id).await?)
}
