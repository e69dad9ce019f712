use chrono::Utc;
use veriflow_core::{SessionChallengeStore, TotpVerifier, User, UserStore};

use crate::{directory::UserDirectory, error::VerificationError};

/// Validate authenticator use case - the user proves possession of the
/// enrolled secret
pub struct ValidateAuthenticatorUseCase<U, C, T>
where
    U: UserStore,
    C: SessionChallengeStore,
    T: TotpVerifier,
{
    directory: UserDirectory<U, C>,
    totp: T,
}

impl<U, C, T> ValidateAuthenticatorUseCase<U, C, T>
where
    U: UserStore,
    C: SessionChallengeStore,
    T: TotpVerifier,
{
    pub fn new(directory: UserDirectory<U, C>, totp: T) -> Self {
        Self { directory, totp }
    }

    /// Returns true when this call validated the factor, false when it
    /// already was.
    #[tracing::instrument(
        name = "ValidateAuthenticatorUseCase::execute",
        skip_all,
        fields(user_id = %actor.id())
    )]
    pub async fn execute(&self, actor: &User, code: &str) -> Result<bool, VerificationError> {
        let factor = actor
            .second_factor()
            .ok_or(VerificationError::SecondFactorNotEnrolled)?;

        if !self.totp.verify(factor.secret(), code, Utc::now())? {
            return Err(VerificationError::SecondFactorFailed);
        }

        self.directory.mark_second_factor_validated(actor.id()).await
    }
}
