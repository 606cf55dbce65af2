//! Admin surface: allow-list gate and the operations it protects

pub mod gate;
pub mod service;

pub use gate::{parse_allow_list, AdminGate, ADMIN_EMAILS_ENV};
pub use service::{
    AdminConfiguration, AdminService, ConnectionTestResult, DiscoveredModels, ModelAvailability,
    UpdateServerRequest, UpdateServerResult,
};
