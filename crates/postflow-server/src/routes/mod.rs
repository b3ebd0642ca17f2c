pub mod accounts;
pub mod auth;
pub mod cron;
pub mod generate;
pub mod health;
pub mod oauth;
pub mod posts;
pub mod uploads;
