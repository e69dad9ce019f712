use veriflow_core::{SessionChallengeStore, TotpVerifier, User, UserStore};

use crate::{directory::UserDirectory, error::VerificationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorEnrollment {
    pub provisioning_uri: String,
    pub validated: bool,
}

/// Enroll authenticator use case - issues the TOTP secret for a user
pub struct EnrollAuthenticatorUseCase<U, C, T>
where
    U: UserStore,
    C: SessionChallengeStore,
    T: TotpVerifier,
{
    directory: UserDirectory<U, C>,
    totp: T,
}

impl<U, C, T> EnrollAuthenticatorUseCase<U, C, T>
where
    U: UserStore,
    C: SessionChallengeStore,
    T: TotpVerifier,
{
    pub fn new(directory: UserDirectory<U, C>, totp: T) -> Self {
        Self { directory, totp }
    }

    /// Enrolls on first call. Later calls return the existing secret's
    /// provisioning URI; a secret is never rotated here.
    #[tracing::instrument(
        name = "EnrollAuthenticatorUseCase::execute",
        skip_all,
        fields(user_id = %actor.id())
    )]
    pub async fn execute(
        &self,
        actor: &User,
    ) -> Result<AuthenticatorEnrollment, VerificationError> {
        let account = actor.email().as_str();

        let user = match actor.second_factor() {
            Some(_) => self.directory.get(actor.id()).await?,
            None => {
                let enrollment = self.totp.enroll(account)?;
                tracing::info!("Enrolling authenticator");
                self.directory
                    .enroll_second_factor(actor.id(), enrollment.secret)
                    .await?
            }
        };

        let factor = user
            .second_factor()
            .ok_or(VerificationError::SecondFactorNotEnrolled)?;

        Ok(AuthenticatorEnrollment {
            provisioning_uri: self.totp.provisioning_uri(factor.secret(), account)?,
            validated: factor.is_validated(),
        })
    }
}
