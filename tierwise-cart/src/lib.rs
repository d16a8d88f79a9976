pub mod summary;
pub mod notify;
pub mod hub;

pub use summary::{CartItemSummary, CartSummary, SummaryBuilder};
pub use notify::{LastNotification, NotificationPolicy};
pub use hub::{HubConfig, SummaryHub};
