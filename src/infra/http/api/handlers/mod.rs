mod annonces;
mod health;
mod profiles;
mod publishing;

pub use annonces::{list_annonces, publish_annonce, unpublish_annonce};
pub use health::healthz;
pub use profiles::get_profile;
pub use publishing::get_publishing_config;
