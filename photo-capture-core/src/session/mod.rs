pub mod authorizer;
pub mod catalog;
pub mod focus;
pub mod logging;
pub mod notifications;
pub mod orchestrator;
pub mod processor;
pub mod published;
pub mod queue;

#[cfg(test)]
pub(crate) mod fakes;
