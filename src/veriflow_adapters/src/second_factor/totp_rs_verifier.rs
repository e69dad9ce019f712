use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use totp_rs::{Algorithm, Secret as TotpSecret, TOTP};
use veriflow_core::{TotpEnrollment, TotpError, TotpVerifier};

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_IN_SECONDS: u64 = 30;

/// RFC 6238 codes: SHA-1, six digits, 30 second steps, one step of skew
/// either way.
#[derive(Debug, Clone)]
pub struct TotpRsVerifier {
    issuer: String,
}

impl Default for TotpRsVerifier {
    fn default() -> Self {
        Self::new("Veriflow")
    }
}

impl TotpRsVerifier {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    fn totp(&self, secret: &Secret<String>, account: &str) -> Result<TOTP, TotpError> {
        let bytes = TotpSecret::Encoded(secret.expose_secret().clone())
            .to_bytes()
            .map_err(|e| TotpError::InvalidSecret(format!("{e:?}")))?;

        TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW,
            STEP_IN_SECONDS,
            bytes,
            Some(self.issuer.clone()),
            account.to_string(),
        )
        .map_err(|e| TotpError::InvalidSecret(e.to_string()))
    }
}

impl TotpVerifier for TotpRsVerifier {
    fn enroll(&self, account: &str) -> Result<TotpEnrollment, TotpError> {
        let secret = Secret::new(TotpSecret::generate_secret().to_encoded().to_string());
        let provisioning_uri = self.provisioning_uri(&secret, account)?;
        Ok(TotpEnrollment {
            secret,
            provisioning_uri,
        })
    }

    fn provisioning_uri(
        &self,
        secret: &Secret<String>,
        account: &str,
    ) -> Result<String, TotpError> {
        Ok(self.totp(secret, account)?.get_url())
    }

    /// Nothing records used codes, so a code verifies again until its window
    /// (plus skew) has passed.
    fn verify(
        &self,
        secret: &Secret<String>,
        code: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, TotpError> {
        let code = code.trim();
        if code.len() != DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
            return Ok(false);
        }
        let at = u64::try_from(at.timestamp())
            .map_err(|e| TotpError::UnexpectedError(e.to_string()))?;
        // The account label does not take part in code generation.
        Ok(self.totp(secret, "verify")?.check(code, at))
    }
}
