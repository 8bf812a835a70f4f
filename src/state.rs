//! Shared handler state.

use std::sync::Arc;

use crate::email::mailer::Mailer;
use crate::email::templates::TemplateStore;
use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub templates: Arc<TemplateStore>,
    pub mailer: Arc<dyn Mailer>,
    pub rate_limiter: Arc<RateLimiter>,
}
