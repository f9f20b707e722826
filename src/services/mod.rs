pub mod auth;
pub mod oauth;
pub mod providers;
pub mod recommendations;

pub use auth::TokenIssuer;
pub use oauth::GoogleOAuth;
pub use recommendations::RecommendationSelector;
