pub mod auth;
pub mod diagrams;
pub mod middleware;
pub mod response;
pub mod state;
pub mod tokens;

pub use response::ApiResponse;
pub use state::AppState;
