pub mod auth;
pub mod hashing;
pub mod jwt;
pub mod rate_limit;
pub mod realtime;
pub mod security;
pub mod tasks;
