use serde::Serialize;
use serde_json::{Map, Value};

use super::Payload;
use crate::database::models::{User, UserDetail};
use crate::error::ApiError;

const USERNAME_MAX_LEN: usize = 150;
const RELATIONS_READ_ONLY: &str = "This field is read-only.";

/// User read representation. The password never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct UserRepresentation {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub chats: Vec<i64>,
    pub messages: Vec<i64>,
}

impl From<UserDetail> for UserRepresentation {
    fn from(detail: UserDetail) -> Self {
        let UserDetail { user, chats, messages } = detail;
        let User {
            id,
            username,
            email,
            is_staff,
            is_superuser,
            ..
        } = user;
        Self {
            id,
            username,
            email,
            is_staff,
            is_superuser,
            chats,
            messages,
        }
    }
}

/// Body of `POST /users/create/`
#[derive(Debug, Clone, PartialEq)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl UserCreate {
    pub fn parse(body: Map<String, Value>) -> Result<Self, ApiError> {
        let mut p = Payload::new(body);
        let username = p.string("username", true);
        let password = p.string("password", true);
        let email = p.string("email", false);
        let is_staff = p.boolean("is_staff");
        let is_superuser = p.boolean("is_superuser");
        p.reject("chats", RELATIONS_READ_ONLY);
        p.reject("messages", RELATIONS_READ_ONLY);

        if let Some(username) = &username {
            if let Err(msg) = validate_username(username) {
                p.error("username", msg);
            }
        }
        if let Some(password) = &password {
            if password.is_empty() {
                p.error("password", "This field may not be blank.");
            }
        }
        if let Some(email) = &email {
            if let Err(msg) = validate_email(email) {
                p.error("email", msg);
            }
        }

        p.finish()?;
        match (username, password) {
            (Some(username), Some(password)) => Ok(Self {
                username,
                password,
                email: email.unwrap_or_default(),
                is_staff: is_staff.unwrap_or(false),
                is_superuser: is_superuser.unwrap_or(false),
            }),
            _ => Err(ApiError::bad_request("username and password are required")),
        }
    }
}

/// Body of an admin `PATCH /users/{id}/`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl UserUpdate {
    pub fn parse(body: Map<String, Value>) -> Result<Self, ApiError> {
        let mut p = Payload::new(body);
        let update = Self {
            username: p.string("username", false),
            password: p.string("password", false),
            email: p.string("email", false),
            is_staff: p.boolean("is_staff"),
            is_superuser: p.boolean("is_superuser"),
        };
        p.reject("chats", RELATIONS_READ_ONLY);
        p.reject("messages", RELATIONS_READ_ONLY);

        if let Some(username) = &update.username {
            if let Err(msg) = validate_username(username) {
                p.error("username", msg);
            }
        }
        if let Some(password) = &update.password {
            if password.is_empty() {
                p.error("password", "This field may not be blank.");
            }
        }
        if let Some(email) = &update.email {
            if let Err(msg) = validate_email(email) {
                p.error("email", msg);
            }
        }

        p.finish()?;
        Ok(update)
    }
}

/// Letters, digits and @/./+/-/_ only, at most 150 characters.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("This field may not be blank.");
    }

    if username.chars().count() > USERNAME_MAX_LEN {
        return Err("Ensure this field has no more than 150 characters.");
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.");
    }

    Ok(())
}

/// Empty is allowed; anything else must be a well-formed address.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Ok(());
    }

    if email_address::EmailAddress::is_valid(email) {
        Ok(())
    } else {
        Err("Enter a valid email address.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_reads_flags_but_defaults_them_false() {
        let create = UserCreate::parse(object(json!({ "username": "newuser", "password": "test" }))).unwrap();
        assert_eq!(create.username, "newuser");
        assert_eq!(create.email, "");
        assert!(!create.is_staff);
        assert!(!create.is_superuser);

        let create = UserCreate::parse(object(json!({
            "username": "boss", "password": "test", "is_staff": true, "is_superuser": true
        })))
        .unwrap();
        assert!(create.is_staff && create.is_superuser);
    }

    #[test]
    fn create_requires_password() {
        let err = UserCreate::parse(object(json!({ "username": "newuser" }))).unwrap_err();
        match err {
            ApiError::ValidationError { field_errors, .. } => {
                assert_eq!(field_errors["password"], "This field is required.");
                assert!(!field_errors.contains_key("username"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn create_rejects_bad_username_and_email_together() {
        let err = UserCreate::parse(object(json!({
            "username": "has space", "password": "x", "email": "nope"
        })))
        .unwrap_err();
        match err {
            ApiError::ValidationError { field_errors, .. } => {
                assert!(field_errors.contains_key("username"));
                assert!(field_errors.contains_key("email"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        assert!(validate_email("").is_ok());
        assert!(validate_email("someone@example.com").is_ok());
        for bad in [
            "nope",
            "a..b@example.com",
            ".a@example.com",
            "a.@example.com",
            "a@ex..ample.com",
            "a@-example.com",
            "a(b)@example.com",
        ] {
            assert_eq!(validate_email(bad), Err("Enter a valid email address."), "{bad}");
        }
    }

    #[test]
    fn update_is_partial() {
        let update = UserUpdate::parse(object(json!({ "email": "a@b.co" }))).unwrap();
        assert_eq!(update.email.as_deref(), Some("a@b.co"));
        assert_eq!(update.username, None);
        assert_eq!(update.password, None);
    }

    #[test]
    fn update_rejects_relations() {
        assert!(UserUpdate::parse(object(json!({ "chats": [1, 2] }))).is_err());
    }

    #[test]
    fn usernames() {
        assert!(validate_username("user.name+tag@x_y-z").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("white space").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("").is_ok());
        assert!(validate_email("someone@example.com").is_ok());
        assert!(validate_email("someone@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@example.com").is_err());
    }

    #[test]
    fn representation_hides_password() {
        let detail = UserDetail {
            user: User {
                id: 3,
                username: "u".to_string(),
                password: "$argon2id$secret".to_string(),
                email: String::new(),
                is_staff: false,
                is_superuser: false,
                date_joined: chrono::Utc::now(),
            },
            chats: vec![1],
            messages: vec![4, 5],
        };
        let value = serde_json::to_value(UserRepresentation::from(detail)).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["messages"], json!([4, 5]));
    }
}
