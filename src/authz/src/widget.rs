//! Login widget projection for templates

use pathgate_core::IdentityPath;
use serde::Serialize;

use crate::session::{LOGIN_FIELD, LOGOUT_FIELD, PASSWORD_FIELD};

/// Field a login form must submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    /// Field name
    pub name: &'static str,

    /// Input type hint
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// What the login area of a page should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoginWidget {
    /// Nobody is logged in
    LoginForm { fields: Vec<FormField> },
    /// A user is logged in
    LoggedIn {
        username: String,
        group: Option<String>,
        logout_field: &'static str,
    },
}

impl LoginWidget {
    /// Builds the widget for `identity`
    pub fn for_identity(identity: &IdentityPath) -> Self {
        if !identity.is_authenticated() {
            return Self::LoginForm {
                fields: vec![
                    FormField { name: LOGIN_FIELD, kind: "text" },
                    FormField { name: PASSWORD_FIELD, kind: "password" },
                ],
            };
        }

        Self::LoggedIn {
            username: identity.name().to_string(),
            group: identity.group().map(str::to_string),
            logout_field: LOGOUT_FIELD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_anonymous_gets_form() {
        let widget = LoginWidget::for_identity(&IdentityPath::anonymous());
        assert_eq!(
            serde_json::to_value(widget).unwrap(),
            json!({
                "state": "login_form",
                "fields": [
                    { "name": "login", "type": "text" },
                    { "name": "password", "type": "password" }
                ]
            })
        );
    }

    #[test]
    fn test_grouped_user() {
        let widget = LoginWidget::for_identity(&IdentityPath::new("staff/admins/carol"));
        assert_eq!(
            widget,
            LoginWidget::LoggedIn {
                username: "carol".into(),
                group: Some("staff/admins".into()),
                logout_field: "logout",
            }
        );
    }

    #[test]
    fn test_top_level_user_has_no_group() {
        let widget = LoginWidget::for_identity(&IdentityPath::new("root"));
        let value = serde_json::to_value(widget).unwrap();
        assert_eq!(value["username"], "root");
        assert!(value["group"].is_null());
    }
}
