use std::error::Error;

use lettre::{SmtpTransport, Transport};
use log::info;

use crate::helpers::generate_email;
use crate::models::{user_model::User, Config};

/// A trait, necessary for every entity that will deliver notification
/// messages to users. The scheduler takes an implementation as a
/// parameter; there is no module-level send function.
pub trait MessageSender {
    fn send_message(
        &self,
        config: &Config,
        user: &User,
        subject: &str,
        body: &str,
    ) -> Result<(), Box<dyn Error>>;
}

/// Allows SmtpTransport to deliver notifications via its native send
/// method.
impl MessageSender for SmtpTransport {
    fn send_message(
        &self,
        config: &Config,
        user: &User,
        subject: &str,
        body: &str,
    ) -> Result<(), Box<dyn Error>> {
        let email = generate_email(config, user, subject, body)?;
        let code = self.send(&email)?;
        info!("Sent email to {} with response {:?}", user.id, code);
        Ok(())
    }
}
