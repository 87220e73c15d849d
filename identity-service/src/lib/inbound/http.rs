pub mod handlers;
pub mod middleware;
pub mod public_paths;
pub mod router;
