//! Components shared across pages.

pub mod auth_modal;
pub mod guarded;
pub mod navigation;
pub mod toasts;

pub use auth_modal::AuthModal;
pub use guarded::Guarded;
pub use navigation::Navigation;
pub use toasts::Toasts;
