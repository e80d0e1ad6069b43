pub mod hub;
pub mod retry;
pub mod single_flight;

pub use hub::{Listener, Subscription, SubscriptionHub};
pub use retry::RetryPolicy;
pub use single_flight::SingleFlight;
