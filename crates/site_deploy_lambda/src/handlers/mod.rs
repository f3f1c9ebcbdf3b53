pub mod deployment;
pub mod invalidator;
pub mod notification;
pub mod publisher;
pub mod signaler;
