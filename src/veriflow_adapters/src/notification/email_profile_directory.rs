use veriflow_core::{Email, ProfileDirectory, ProfileDirectoryError, UserId, UserProfile};

/// Profile directory for channels where the external id already is an
/// e-mail address. The profile id is the e-mail itself.
#[derive(Debug, Default, Clone)]
pub struct EmailProfileDirectory;

#[async_trait::async_trait]
impl ProfileDirectory for EmailProfileDirectory {
    async fn lookup(&self, external_id: &str) -> Result<UserProfile, ProfileDirectoryError> {
        let email = Email::parse(external_id)
            .map_err(|_| ProfileDirectoryError::UserNotFound(external_id.to_string()))?;
        let name = email
            .as_str()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();

        Ok(UserProfile {
            id: UserId::new(email.as_str()),
            email,
            name,
            image: None,
        })
    }
}
