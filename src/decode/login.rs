use super::{required_email, required_password, Violations};
use crate::model::Credentials;
use crate::wire::LoginRequest;

/// Login carries no name or creation data, so only email and password are checked.
pub fn decode_login(req: LoginRequest) -> Result<Credentials, Violations> {
    let mut v = Violations::new();
    let email = required_email(&req.email, "email", &mut v);
    let password = required_password(&req.password, "password", &mut v);
    v.finish()?;
    Ok(Credentials { email, password })
}
