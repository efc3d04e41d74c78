/// Defines the handler that receives decoded messages
pub mod handler;

/// Implements the finalization of incoming deliveries
pub mod delivery;

/// Defines the inbound transporting mechanism
pub mod subscriber;
