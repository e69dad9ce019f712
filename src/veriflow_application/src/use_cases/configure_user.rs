use veriflow_core::{
    ActionPurpose, IdentityProvider, ProfileDirectory, SessionChallengeStore, User, UserStore,
};

use crate::{directory::UserDirectory, error::VerificationError};

#[derive(Debug, Clone)]
pub struct ConfigureLink {
    pub user: User,
    pub link: String,
}

/// Configure user use case - binds a channel user and hands out a link to
/// the second-factor settings
pub struct ConfigureUserUseCase<U, C, D, I>
where
    U: UserStore,
    C: SessionChallengeStore,
    D: ProfileDirectory,
    I: IdentityProvider,
{
    directory: UserDirectory<U, C>,
    profiles: D,
    identity_provider: I,
}

impl<U, C, D, I> ConfigureUserUseCase<U, C, D, I>
where
    U: UserStore,
    C: SessionChallengeStore,
    D: ProfileDirectory,
    I: IdentityProvider,
{
    pub fn new(directory: UserDirectory<U, C>, profiles: D, identity_provider: I) -> Self {
        Self {
            directory,
            profiles,
            identity_provider,
        }
    }

    /// Refreshes the profile on every call. Touches no verification request.
    #[tracing::instrument(name = "ConfigureUserUseCase::execute", skip(self))]
    pub async fn execute(&self, external_id: &str) -> Result<ConfigureLink, VerificationError> {
        let profile = self.profiles.lookup(external_id).await?;
        let user = self.directory.ensure_user(profile).await?;
        let link = self
            .identity_provider
            .generate_auth_link(ActionPurpose::Configure, user.id().as_str())?;

        Ok(ConfigureLink { user, link })
    }
}
