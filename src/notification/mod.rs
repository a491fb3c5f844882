// Declare submodules
pub mod notification_helper;
pub mod notification_models;
pub mod notification_service;

// Re-export public items
pub use notification_service::NotificationDispatcher;
