//! User authentication: private cookie handling, the log-in flow, and the
//! middleware that resolves a [RequestContext] for protected routes.

mod context;
pub(crate) mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod token;

pub use context::{RequestContext, Role};
pub use cookie::{invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub(crate) use redirect::normalize_redirect_url;
pub(super) use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
#[cfg(test)]
pub(crate) use middleware::AuthState;
