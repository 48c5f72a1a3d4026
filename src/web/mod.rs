pub mod account;
pub mod form;
pub mod login;
pub mod logout;
pub mod pipeline;
pub mod submission;

use validator::ValidationError;

/// Rejects values that trim to nothing. Length checks alone pass
/// whitespace-only input, which handlers would then trim and store empty.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    account::configure(conf);
    form::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    pipeline::configure(conf);
    submission::configure(conf);
}
