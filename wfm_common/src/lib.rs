mod helpers;
mod kopecks;
mod secret;

pub use helpers::parse_boolean_flag;
pub use kopecks::{Kopecks, RUB_CURRENCY_CODE};
pub use secret::Secret;
