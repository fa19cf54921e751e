pub mod content_service;
pub mod dashboard_service;
pub mod export_service;
pub mod identity_service;
pub mod migration_service;
pub mod notification_service;
pub mod otp_service;
pub mod participants_service;
pub mod registration_service;
pub mod validation_service;
