use std::sync::Arc;

use tracing::{info, warn};

use crate::api::PantryApi;
use crate::auth::{Session, SessionData};
use crate::cache::CacheManager;
use crate::models::User;

use super::{ScreenError, ScreenResult};

/// Characters allowed as the "special" character class in passwords.
const PASSWORD_SPECIALS: &str = "@$!%*?&";

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login, sign-up, email verification and logout.
///
/// Owns the session. Any change of account clears the shared cache so the
/// next screen cannot show the previous user's data.
pub struct AccountScreen {
    api: Arc<dyn PantryApi>,
    cache: Arc<CacheManager>,
    session: Session,
}

impl AccountScreen {
    pub fn new(api: Arc<dyn PantryApi>, cache: Arc<CacheManager>) -> Self {
        Self {
            api,
            cache,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    /// Swap the API implementation, e.g. for one carrying the new token.
    pub fn set_api(&mut self, api: Arc<dyn PantryApi>) {
        self.api = api;
    }

    /// Resume a previously stored session. Expired sessions are ignored.
    pub fn restore(&mut self, data: SessionData) -> bool {
        if data.is_expired() {
            return false;
        }
        self.replace_session(data);
        true
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> ScreenResult<SessionData> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ScreenError::Validation("Please enter your email".to_string()));
        }
        if password.trim().is_empty() {
            return Err(ScreenError::Validation("Please enter your password".to_string()));
        }

        let data = self.api.sign_in(email, password).await.map_err(|e| {
            warn!(email = %email, error = %e, "Sign in failed");
            ScreenError::from(e)
        })?;

        info!(user = %data.user.id, "Signed in");
        self.replace_session(data.clone());
        Ok(data)
    }

    pub async fn sign_up(&mut self, form: &SignUpForm) -> ScreenResult<()> {
        let email = form.email.trim();
        if email.is_empty() {
            return Err(ScreenError::Validation("Please enter your email".to_string()));
        }
        if !is_valid_email(email) {
            return Err(ScreenError::Validation("Please enter a valid email address".to_string()));
        }
        if form.password.trim().is_empty() {
            return Err(ScreenError::Validation("Please enter a password".to_string()));
        }
        if !is_strong_password(&form.password) {
            return Err(ScreenError::Validation(
                "Password must be at least 8 characters with uppercase, lowercase, number, and special character"
                    .to_string(),
            ));
        }
        if form.password != form.confirm_password {
            return Err(ScreenError::Validation("Passwords do not match".to_string()));
        }

        self.api.sign_up(email, &form.password).await?;
        info!(email = %email, "Account created, verification pending");
        Ok(())
    }

    pub async fn verify_email(&mut self, code: &str) -> ScreenResult<()> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ScreenError::Validation("Please enter the verification code".to_string()));
        }

        self.api.verify_email(code).await?;
        if let Some(data) = self.session.data.as_mut() {
            data.user.email_verified = true;
        }
        Ok(())
    }

    pub async fn resend_verification(&self) -> ScreenResult<()> {
        let user = self.session.user().ok_or(ScreenError::NotSignedIn)?;
        if user.email_verified {
            return Err(ScreenError::Validation("Email already verified".to_string()));
        }
        self.api.resend_verification(user.id).await?;
        Ok(())
    }

    /// Sign out locally and on the server. Local state is always cleared,
    /// even if the server call fails; that failure is still returned.
    pub async fn logout(&mut self, all_devices: bool) -> ScreenResult<()> {
        let result = self.api.logout(all_devices).await;
        if let Err(ref e) = result {
            warn!(error = %e, all_devices, "Server logout failed, clearing local session anyway");
        }

        self.session.clear();
        self.cache.clear();
        info!(all_devices, "Logged out");
        result.map_err(ScreenError::from)
    }

    fn replace_session(&mut self, data: SessionData) {
        let had_session = self.session.data.is_some();
        if let Some(previous) = self.session.update(data) {
            info!(previous = %previous, "Account switched, clearing cache");
            self.cache.clear();
        } else if !had_session {
            // Nothing is known about whoever used the cache before.
            self.cache.clear();
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn is_strong_password(password: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}
