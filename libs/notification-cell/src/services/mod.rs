pub mod push;
pub mod subscriptions;
