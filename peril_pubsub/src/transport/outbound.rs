/// Defines the outbound transporting mechanism
pub mod publisher;
