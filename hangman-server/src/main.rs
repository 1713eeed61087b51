use std::sync::Arc;
use tokio::signal;
use tracing::info;

use hangman_core::WordList;
use hangman_persistence::{
    ActiveSessionRepository, GameRecordRepository, PlayerRepository, WordRepository,
    connection::connect_and_migrate,
};
use hangman_server::{
    config::Config,
    create_routes,
    session_manager::{SessionManager, SessionStores},
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Hangman server...");

    let config = Config::new();

    // Initialize database connection and run migrations
    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let word_repository = WordRepository::new(db.clone());

    if let Some(words_file) = &config.words_file {
        info!("Loading words from file: {}", words_file);
        let word_list = match WordList::from_file(words_file) {
            Ok(list) => list,
            Err(e) => {
                tracing::error!("Failed to load word list '{}': {:#}", words_file, e);
                std::process::exit(1);
            }
        };

        match word_repository.insert_words(word_list.words()).await {
            Ok(inserted) => info!("Seeded {} new words", inserted),
            Err(e) => {
                tracing::error!("Failed to seed words: {}", e);
                std::process::exit(1);
            }
        }
    }

    match word_repository.count_unused().await {
        Ok(0) => tracing::warn!("Word pool is empty; new games cannot start until words are seeded"),
        Ok(count) => info!("{} unused words available", count),
        Err(e) => tracing::warn!("Could not count unused words: {}", e),
    }

    let player_repository = Arc::new(PlayerRepository::new(db.clone()));
    let session_manager = Arc::new(SessionManager::new(SessionStores {
        players: player_repository.clone(),
        words: Arc::new(word_repository),
        sessions: Arc::new(ActiveSessionRepository::new(db.clone())),
        history: Arc::new(GameRecordRepository::new(db)),
    }));

    let routes = create_routes(session_manager, player_repository);

    info!("Server starting on {}:{}", config.host, config.port);

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
