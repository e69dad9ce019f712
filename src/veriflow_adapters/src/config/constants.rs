pub mod env {
    pub const CONFIG_PATH_ENV_VAR: &str = "VERIFLOW_CONFIG";
    pub const ENV_PREFIX: &str = "VERIFLOW";
    pub const ENV_SEPARATOR: &str = "__";
}

pub const DEFAULT_CONFIG_FILE: &str = "veriflow.json";
pub const DEFAULT_COOKIE_NAME: &str = "auth_token";
pub const DEFAULT_CALLBACK_PATH: &str = "/auth/callback";
pub const DEFAULT_STATE_TTL_IN_SECONDS: i64 = 900;
pub const DEFAULT_CHALLENGE_TTL_IN_SECONDS: i64 = 300;

pub mod prod {
    pub const APP_ADDRESS: &str = "0.0.0.0:3000";
    pub const BASE_URL: &str = "http://localhost:3000";

    pub mod email_client {
        pub const BASE_URL: &str = "https://api.postmarkapp.com/";
        pub const SENDER: &str = "veriflow@localhost.localdomain";
        pub const TIMEOUT_IN_MILLIS: u64 = 10_000;
    }

    pub mod slack {
        pub const BASE_URL: &str = "https://slack.com/api/";
    }
}

pub mod test {
    pub const APP_ADDRESS: &str = "127.0.0.1:0";

    pub mod email_client {
        use std::time::Duration;

        pub const SENDER: &str = "test@email.com";
        pub const TIMEOUT: Duration = std::time::Duration::from_millis(200);
    }
}
