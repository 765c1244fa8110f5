pub mod chat;
pub mod code_file;
pub mod config;
pub mod meeting;
pub mod player;
pub mod role;
pub mod room;
pub mod sabotage;
pub mod vote;
