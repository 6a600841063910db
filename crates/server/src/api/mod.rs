mod downloads;
mod handlers;
mod metrics;
mod routes;

pub use routes::create_router;
