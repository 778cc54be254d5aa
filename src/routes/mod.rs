pub mod document;
mod route;
pub mod util;
pub mod verification;

pub use document::document_route;
pub use route::main_route;
pub use util::util_route;
pub use verification::verification_route;
