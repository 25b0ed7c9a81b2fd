pub mod movie;
pub mod review;
pub mod user;

pub use movie::{poster_url, release_year, MovieMatch, MovieMetadata, MovieSummary};
pub use review::{validate_review_fields, Review, ReviewView, MAX_RATING, MIN_RATING};
pub use user::UserProfile;
