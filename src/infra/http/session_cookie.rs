use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use metrics::counter;

use crate::application::sessions::CookieDirective;
use crate::infra::telemetry::SESSIONS_ISSUED_TOTAL;

pub const SESSION_COOKIE: &str = "qid";

#[derive(Debug, Clone)]
pub struct SessionCookieSettings {
    pub secure: bool,
    pub max_age: Duration,
}

impl SessionCookieSettings {
    pub fn apply(&self, jar: CookieJar, directive: CookieDirective) -> CookieJar {
        match directive {
            CookieDirective::Keep => jar,
            CookieDirective::Issue(id) => {
                counter!(SESSIONS_ISSUED_TOTAL).increment(1);
                jar.add(self.cookie(id))
            }
            CookieDirective::Clear => jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        }
    }

    fn cookie(&self, id: String) -> Cookie<'static> {
        let max_age = time::Duration::try_from(self.max_age).unwrap_or(time::Duration::MAX);
        Cookie::build((SESSION_COOKIE, id))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(max_age)
            .build()
    }
}
