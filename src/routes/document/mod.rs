pub mod handlers;
mod routes;
pub mod schemas;
pub use routes::document_route;
