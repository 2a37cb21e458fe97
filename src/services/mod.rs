pub mod password;

pub mod token;
pub use token::{Claims, Role, TokenService};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, Identity, LojistaLogin};
pub use auth_service_impl::SeaOrmAuthService;

pub mod two_factor_service;
pub use two_factor_service::{TwoFactorEnrollment, TwoFactorService};

pub mod password_reset_service;
pub use password_reset_service::PasswordResetService;

pub mod verification_service;
pub use verification_service::EmailVerificationService;

pub mod security_service;
pub use security_service::SecurityIncidentService;
