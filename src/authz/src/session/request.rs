//! Per-request input to session resolution

use secrecy::SecretString;

use super::fingerprint::ClientSignature;

/// Form field carrying the login name
pub const LOGIN_FIELD: &str = "login";

/// Form field carrying the password
pub const PASSWORD_FIELD: &str = "password";

/// Form field whose presence requests a logout
pub const LOGOUT_FIELD: &str = "logout";

/// Explicit session action submitted with a request
#[derive(Debug)]
pub enum FormAction {
    /// End the current session
    Logout,
    /// Authenticate with a name and password
    Login {
        name: String,
        password: SecretString,
    },
}

impl FormAction {
    /// Reads the action from submitted form fields
    ///
    /// A logout field wins over login fields. Login needs both the name
    /// and the password field; either one alone is no action.
    pub fn from_fields<'a, I>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut name = None;
        let mut password = None;

        for (key, value) in fields {
            match key {
                LOGOUT_FIELD => return Some(Self::Logout),
                LOGIN_FIELD => name = Some(value),
                PASSWORD_FIELD => password = Some(value),
                _ => {}
            }
        }

        match (name, password) {
            (Some(name), Some(password)) => Some(Self::login(name, password)),
            _ => None,
        }
    }

    /// Login action
    pub fn login(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Login {
            name: name.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Everything session resolution needs from the host for one request
#[derive(Debug)]
pub struct RequestContext {
    /// Client attributes the fingerprint is derived from
    pub signature: ClientSignature,

    /// Submitted login or logout, if any
    pub action: Option<FormAction>,
}

impl RequestContext {
    /// Request with no form action
    pub fn new(signature: ClientSignature) -> Self {
        Self {
            signature,
            action: None,
        }
    }

    /// Request carrying the given form fields
    pub fn from_form<'a, I>(signature: ClientSignature, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            signature,
            action: FormAction::from_fields(fields),
        }
    }

    /// Attach a login action
    pub fn with_login(mut self, name: impl Into<String>, password: impl Into<String>) -> Self {
        self.action = Some(FormAction::login(name, password));
        self
    }

    /// Attach a logout action
    pub fn with_logout(mut self) -> Self {
        self.action = Some(FormAction::Logout);
        self
    }
}
