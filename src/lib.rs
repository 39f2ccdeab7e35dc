pub mod config;
pub mod differential;
pub mod elo;
pub mod error;
pub mod match_record;
pub mod pipeline;
pub mod ranking;
pub mod season_file;
pub mod standings;
