pub mod engagement;
pub mod lifecycle;
pub mod notify;
pub mod registration;
pub mod subscriptions;
