pub mod controller;
pub mod crud;
pub mod routes;
pub mod schema;

pub use routes::auth_routes;
