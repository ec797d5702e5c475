pub mod analysis;
pub mod config;
pub mod enhance;
pub mod export;
pub mod game_script;
pub mod http_client;
pub mod impact;
pub mod injury;
pub mod injury_report;
pub mod logging;
pub mod model;
pub mod report_fetch;
pub mod scoring;
pub mod slate;
pub mod teammates;
pub mod variance;
