// Appliance root password resource
//
// Create and update both rotate the password; read probes expiration.
// The new password arrives either inline or via a password file, never
// both. The client's connection value is the single owner of the
// stored password -- `change_password` commits it only on confirmed
// success, so a failed rotation leaves the connection usable.

use std::path::PathBuf;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use haven_api::ApplianceClient;

use crate::attributes::Attributes;
use crate::convert::password_expiration_attrs;
use crate::error::CoreError;
use crate::resource::Reconciled;

/// Desired state for the appliance password resource.
#[derive(Debug)]
pub struct PasswordDesired {
    /// IP address of the appliance whose password is rotated.
    pub appliance_address: String,
    pub current_password: SecretString,
    /// New password given inline. Mutually exclusive with `password_file`.
    pub new_password: Option<SecretString>,
    /// File holding the new password (surrounding whitespace trimmed).
    pub password_file: Option<PathBuf>,
    pub service_cert: String,
}

/// Rotate the password and return the confirmation identity.
///
/// The identity is the confirmation timestamp -- password rotations
/// have no server-side object to point at.
pub async fn create(
    client: &mut ApplianceClient,
    desired: &PasswordDesired,
) -> Result<Reconciled, CoreError> {
    if desired.current_password.expose_secret().is_empty() {
        return Err(CoreError::validation("current password cannot be empty"));
    }

    let new_password = resolve_new_password(desired)?;

    client
        .change_password(
            &desired.appliance_address,
            &desired.current_password,
            &new_password,
            &desired.service_cert,
        )
        .await?;

    debug!(appliance = %desired.appliance_address, "root password rotated");

    let attributes = read(client, desired).await?;
    Ok(Reconciled {
        id: Utc::now().timestamp().to_string(),
        attributes,
    })
}

/// Probe password expiration on the appliance.
pub async fn read(
    client: &ApplianceClient,
    desired: &PasswordDesired,
) -> Result<Attributes, CoreError> {
    let expiration = client
        .check_password_expired(&desired.appliance_address, &desired.service_cert)
        .await?;

    let mut attrs = Attributes::new();
    password_expiration_attrs(&mut attrs, &expiration);
    Ok(attrs)
}

/// Update is another rotation.
pub async fn update(
    client: &mut ApplianceClient,
    desired: &PasswordDesired,
) -> Result<Reconciled, CoreError> {
    create(client, desired).await
}

/// Deleting the resource only forgets the identity; the password on the
/// appliance stays as last confirmed.
pub fn delete() {}

/// Resolve the new password from the inline value or the password file.
fn resolve_new_password(desired: &PasswordDesired) -> Result<SecretString, CoreError> {
    match (&desired.new_password, &desired.password_file) {
        (Some(_), Some(_)) => Err(CoreError::validation(
            "either a new password or a password file should be given, but not both",
        )),
        (Some(password), None) => Ok(password.clone()),
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| CoreError::validation(format!("could not read password file: {e}")))?;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(CoreError::validation("password file is empty"));
            }
            Ok(SecretString::from(trimmed.to_owned()))
        }
        (None, None) => Err(CoreError::validation(
            "either a new password or a password file is required",
        )),
    }
}
