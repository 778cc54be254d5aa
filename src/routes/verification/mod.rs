pub mod handlers;
mod routes;
pub mod schemas;
pub use routes::verification_route;
