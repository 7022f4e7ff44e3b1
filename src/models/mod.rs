pub mod user;
pub mod stock;
pub mod news_item;
pub mod integration;

pub use user::{CurrentUser, NewUser, User};
pub use stock::Stock;
pub use news_item::NewsItem;
pub use integration::{key_name, Integration, Provider};
