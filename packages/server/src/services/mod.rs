pub mod assistant;
pub mod catalog;
pub mod code_runner;
pub mod file_service;
pub mod game_service;
pub mod meeting_service;
pub mod role_service;
pub mod room_service;
pub mod sabotage_engine;
pub mod sabotage_service;
pub mod voting;
