pub mod client;

pub use client::UpdateCenterClient;
