use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use crate::session_manager::{SessionError, SessionManager};
use hangman_persistence::PlayerRepository;
use hangman_types::{CreatePlayerRequest, ErrorKind, ErrorResponse, GuessRequest};

pub mod config;
pub mod session_manager;

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn create_routes(
    session_manager: Arc<SessionManager>,
    player_repository: Arc<PlayerRepository>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let session_manager_filter = warp::any().map({
        let session_manager = session_manager.clone();
        move || session_manager.clone()
    });

    let player_repository_filter = warp::any().map({
        let player_repository = player_repository.clone();
        move || player_repository.clone()
    });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let start_game = warp::path!("api" / "games" / "start" / String)
        .and(warp::post())
        .and(session_manager_filter.clone())
        .and_then(handle_start_request);

    let guess = warp::path!("api" / "games" / "guess")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<GuessRequest>())
        .and(session_manager_filter.clone())
        .and_then(handle_guess_request);

    let all_games = warp::path!("api" / "games")
        .and(warp::get())
        .and(session_manager_filter.clone())
        .and_then(handle_all_games_request);

    let player_games = warp::path!("api" / "games" / "player" / String)
        .and(warp::get())
        .and(session_manager_filter.clone())
        .and_then(handle_player_games_request);

    let create_player = warp::path!("api" / "players")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<CreatePlayerRequest>())
        .and(player_repository_filter.clone())
        .and_then(handle_create_player_request);

    let list_players = warp::path!("api" / "players")
        .and(warp::get())
        .and(player_repository_filter.clone())
        .and_then(handle_list_players_request);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    health
        .or(start_game)
        .or(guess)
        .or(all_games)
        .or(player_games)
        .or(create_player)
        .or(list_players)
        .recover(handle_rejection)
        .with(cors)
        .with(warp::log("hangman"))
}

fn json_reply<T: Serialize>(value: &T, status: StatusCode) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(value), status)
}

fn error_reply(kind: ErrorKind, message: impl Into<String>) -> WithStatus<Json> {
    let status = match kind {
        ErrorKind::PlayerNotFound | ErrorKind::NoWordsAvailable => StatusCode::NOT_FOUND,
        ErrorKind::NoActiveSession => StatusCode::CONFLICT,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_reply(&ErrorResponse::new(kind, message), status)
}

fn session_error_reply(err: SessionError) -> WithStatus<Json> {
    match &err {
        SessionError::Storage(source) => {
            tracing::error!("Storage failure: {:?}", source);
            error_reply(ErrorKind::InternalError, "Internal server error")
        }
        _ => error_reply(err.kind(), err.to_string()),
    }
}

/// Report unreadable request bodies in the same shape as other errors
async fn handle_rejection(err: warp::Rejection) -> Result<WithStatus<Json>, warp::Rejection> {
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(error_reply(
            ErrorKind::InvalidInput,
            format!("Invalid request body: {}", e),
        ));
    }
    Err(err)
}

fn parse_player_id(player_id: &str) -> Result<Uuid, WithStatus<Json>> {
    Uuid::parse_str(player_id)
        .map_err(|_| error_reply(ErrorKind::InvalidInput, "Invalid player ID format"))
}

async fn handle_start_request(
    player_id: String,
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let player_id = match parse_player_id(&player_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };

    match session_manager.start_session(player_id).await {
        Ok(view) => Ok(json_reply(&view, StatusCode::OK)),
        Err(err) => Ok(session_error_reply(err)),
    }
}

async fn handle_guess_request(
    request: GuessRequest,
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match session_manager
        .guess(request.player_id, &request.letter)
        .await
    {
        Ok(view) => Ok(json_reply(&view, StatusCode::OK)),
        Err(err) => Ok(session_error_reply(err)),
    }
}

async fn handle_all_games_request(
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match session_manager.list_games().await {
        Ok(games) => Ok(json_reply(&games, StatusCode::OK)),
        Err(err) => Ok(session_error_reply(err)),
    }
}

async fn handle_player_games_request(
    player_id: String,
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let player_id = match parse_player_id(&player_id) {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };

    match session_manager.list_games_for_player(player_id).await {
        Ok(games) => Ok(json_reply(&games, StatusCode::OK)),
        Err(err) => Ok(session_error_reply(err)),
    }
}

async fn handle_create_player_request(
    request: CreatePlayerRequest,
    player_repository: Arc<PlayerRepository>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if request.name.trim().is_empty() {
        return Ok(error_reply(
            ErrorKind::InvalidInput,
            "Player name must not be empty",
        ));
    }

    match player_repository.create_player(&request.name).await {
        Ok(player) => Ok(json_reply(&player, StatusCode::CREATED)),
        Err(err) => {
            tracing::error!("Failed to create player: {}", err);
            Ok(error_reply(ErrorKind::InternalError, "Failed to create player"))
        }
    }
}

async fn handle_list_players_request(
    player_repository: Arc<PlayerRepository>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match player_repository.list_players().await {
        Ok(players) => Ok(json_reply(&players, StatusCode::OK)),
        Err(err) => {
            tracing::error!("Failed to list players: {}", err);
            Ok(error_reply(ErrorKind::InternalError, "Failed to list players"))
        }
    }
}
