// Password-reset codes: issue, verify and consume

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{info, warn};

use crate::auth::{
    error::AuthError,
    models::PendingOtp,
    password::PasswordService,
    repository::UserStore,
};
use crate::notify::{Delivery, Dispatcher, Mail};
use crate::validation::normalize_email;

/// How long a reset code stays valid
pub const OTP_TTL_MINUTES: i64 = 10;

/// A freshly issued code; the code itself only travels by email
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpIssued {
    pub expires_at: DateTime<Utc>,
    pub delivery: Delivery,
}

/// Six-digit code in 100000..=999999
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

#[derive(Clone)]
pub struct OtpService {
    users: Arc<dyn UserStore>,
    dispatcher: Dispatcher,
    ttl: Duration,
}

impl OtpService {
    pub fn new(users: Arc<dyn UserStore>, dispatcher: Dispatcher) -> Self {
        Self {
            users,
            dispatcher,
            ttl: Duration::minutes(OTP_TTL_MINUTES),
        }
    }

    pub async fn request_reset(&self, email: &str) -> Result<OtpIssued, AuthError> {
        self.request_reset_at(email, Utc::now()).await
    }

    /// Store a new code for the account (replacing any pending one) and email it
    ///
    /// The code is persisted before delivery, so a failed email still leaves
    /// a usable code behind; the caller learns about it through `delivery`.
    pub async fn request_reset_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpIssued, AuthError> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let code = generate_code();
        let expires_at = now + self.ttl;
        let stored = self
            .users
            .set_otp(
                user.id,
                PendingOtp {
                    code: code.clone(),
                    expires_at,
                },
            )
            .await?;
        if !stored {
            return Err(AuthError::UserNotFound);
        }

        info!("Reset code issued for user_id={}", user.id);

        let delivery = self
            .dispatcher
            .deliver(Mail::otp_code(&user.email, &code, self.ttl.num_minutes()))
            .await;
        if !delivery.is_sent() {
            warn!("Reset code for user_id={} was not delivered", user.id);
        }

        Ok(OtpIssued { expires_at, delivery })
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<(), AuthError> {
        self.verify_at(email, code, Utc::now()).await
    }

    /// Check a code without consuming it
    pub async fn verify_at(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let email = normalize_email(email);
        match self.users.find_by_valid_otp(&email, code, now).await? {
            Some(_) => Ok(()),
            None => Err(AuthError::InvalidOrExpiredOtp),
        }
    }

    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.reset_password_at(email, code, new_password, Utc::now()).await
    }

    /// Consume the code and replace the password in one store operation
    pub async fn reset_password_at(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        PasswordService::validate_password_strength(new_password)?;
        let email = normalize_email(email);

        let password_hash = PasswordService::hash_blocking(new_password.to_string()).await?;
        let user = self
            .users
            .consume_otp(&email, code, &password_hash, now)
            .await?
            .ok_or(AuthError::InvalidOrExpiredOtp)?;

        info!("Password reset for user_id={}", user.id);
        self.dispatcher.dispatch(Mail::reset_confirmation(&user.email));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{NewUser, Role};
    use crate::memory::MemoryStore;
    use crate::notify::{Notifier, NotifyError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration as StdDuration;

    #[derive(Default)]
    struct Inbox {
        sent: Mutex<Vec<Mail>>,
    }

    impl Inbox {
        /// The code in the most recent reset email
        fn last_code(&self) -> String {
            let sent = self.sent.lock().unwrap();
            let mail = sent
                .iter()
                .rev()
                .find(|mail| mail.subject.contains("reset code"))
                .expect("no reset email sent");
            mail.text_body
                .split_whitespace()
                .find_map(|word| {
                    let digits = word.trim_end_matches('.');
                    (digits.len() == 6 && digits.chars().all(|c| c.is_ascii_digit()))
                        .then(|| digits.to_string())
                })
                .expect("no code in reset email")
        }
    }

    #[async_trait]
    impl Notifier for Inbox {
        async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    struct Bouncing;

    #[async_trait]
    impl Notifier for Bouncing {
        async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
            Err(NotifyError::InvalidAddress(mail.to.clone()))
        }
    }

    async fn setup(notifier: Arc<dyn Notifier>) -> (OtpService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        UserStore::insert(
            &*store,
            NewUser {
                username: "asha".to_string(),
                phone: "9876543210".to_string(),
                email: "asha@example.com".to_string(),
                password_hash: PasswordService::hash_password("secret1").unwrap(),
                role: Role::User,
            },
        )
        .await
        .unwrap();

        let dispatcher = Dispatcher::new(notifier, StdDuration::from_secs(1));
        (OtpService::new(store.clone(), dispatcher), store)
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code: u32 = generate_code().parse().unwrap();
            assert!((100_000..=999_999).contains(&code));
        }
    }

    #[tokio::test]
    async fn test_unknown_email_is_not_found() {
        let (service, _) = setup(Arc::new(Inbox::default())).await;
        let result = service.request_reset("nobody@example.com").await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_issue_then_consume_once() {
        let inbox = Arc::new(Inbox::default());
        let (service, store) = setup(inbox.clone()).await;

        let issued = service.request_reset("Asha@Example.com ").await.unwrap();
        assert_eq!(issued.delivery, Delivery::Sent);
        let code = inbox.last_code();

        service.verify("asha@example.com", &code).await.unwrap();
        service
            .reset_password("asha@example.com", &code, "newsecret")
            .await
            .unwrap();

        let second = service
            .reset_password("asha@example.com", &code, "another1")
            .await;
        assert!(matches!(second, Err(AuthError::InvalidOrExpiredOtp)));

        let user = UserStore::find_by_email(&*store, "asha@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(user.otp.is_none());
        assert!(PasswordService::verify_password("newsecret", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_code_expires_after_ten_minutes() {
        let inbox = Arc::new(Inbox::default());
        let (service, _) = setup(inbox.clone()).await;
        let issued_at = Utc::now();

        service
            .request_reset_at("asha@example.com", issued_at)
            .await
            .unwrap();
        let code = inbox.last_code();

        let at_expiry = issued_at + Duration::minutes(OTP_TTL_MINUTES);
        service
            .verify_at("asha@example.com", &code, at_expiry)
            .await
            .unwrap();

        let late = at_expiry + Duration::seconds(1);
        assert!(matches!(
            service.verify_at("asha@example.com", &code, late).await,
            Err(AuthError::InvalidOrExpiredOtp)
        ));
        assert!(matches!(
            service
                .reset_password_at("asha@example.com", &code, "newsecret", late)
                .await,
            Err(AuthError::InvalidOrExpiredOtp)
        ));
    }

    #[tokio::test]
    async fn test_new_code_replaces_old_one() {
        let inbox = Arc::new(Inbox::default());
        let (service, store) = setup(inbox.clone()).await;

        service.request_reset("asha@example.com").await.unwrap();
        service.request_reset("asha@example.com").await.unwrap();
        let latest = inbox.last_code();

        let user = UserStore::find_by_email(&*store, "asha@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.otp.map(|otp| otp.code), Some(latest));
    }

    #[tokio::test]
    async fn test_concurrent_consumes_have_one_winner() {
        let inbox = Arc::new(Inbox::default());
        let (service, _) = setup(inbox.clone()).await;
        service.request_reset("asha@example.com").await.unwrap();
        let code = inbox.last_code();

        let first = {
            let service = service.clone();
            let code = code.clone();
            tokio::spawn(async move {
                service
                    .reset_password("asha@example.com", &code, "first-pass")
                    .await
            })
        };
        let second = {
            let service = service.clone();
            let code = code.clone();
            tokio::spawn(async move {
                service
                    .reset_password("asha@example.com", &code, "second-pass")
                    .await
            })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let winners = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .any(|result| matches!(result, Err(AuthError::InvalidOrExpiredOtp))));
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_code_valid() {
        let (service, store) = setup(Arc::new(Bouncing)).await;

        let issued = service.request_reset("asha@example.com").await.unwrap();
        assert_eq!(issued.delivery, Delivery::Failed);

        let user = UserStore::find_by_email(&*store, "asha@example.com")
            .await
            .unwrap()
            .unwrap();
        let code = user.otp.map(|otp| otp.code).unwrap();
        service.verify("asha@example.com", &code).await.unwrap();
    }
}
