//! Password acquisition for CLI commands
//!
//! Passwords come from a masked terminal prompt or, for scripted use, from a
//! file whose first line holds the password.

use std::path::Path;

use crate::crypto::Password;
use crate::error::{ProfilesError, ProfilesResult};

/// Minimum length of a newly chosen password
pub const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable naming a password file
pub const PASSWORD_FILE_ENV: &str = "GITPROFILES_PASSWORD_FILE";

/// Read a password from `file` if given, otherwise prompt for one
///
/// With `confirm` set the prompt asks twice and enforces the minimum length.
pub fn acquire_password(file: Option<&Path>, confirm: bool) -> ProfilesResult<Password> {
    match file {
        Some(path) => read_password_file(path),
        None if confirm => prompt_new_password(),
        None => prompt_password("Backup password: "),
    }
}

/// Read a password from a file, dropping one trailing line ending
pub fn read_password_file(path: &Path) -> ProfilesResult<Password> {
    let mut bytes =
        std::fs::read(path).map_err(|e| ProfilesError::io("reading password file", path, e))?;

    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
    }

    let password = Password::new(bytes);
    if password.is_empty() {
        return Err(ProfilesError::Config(format!(
            "password file {} is empty",
            path.display()
        )));
    }
    Ok(password)
}

/// Prompt for a new password with confirmation
fn prompt_new_password() -> ProfilesResult<Password> {
    loop {
        let first = prompt_password("New backup password: ")?;
        let second = prompt_password("Confirm password: ")?;

        match check_new_password(&first, &second) {
            Ok(()) => return Ok(first),
            Err(reason) => eprintln!("{} Please try again.", reason),
        }
    }
}

fn check_new_password(first: &Password, second: &Password) -> Result<(), &'static str> {
    if first.len() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters.");
    }
    if first != second {
        return Err("Passwords do not match.");
    }
    Ok(())
}

/// Prompt for a password (hidden input)
fn prompt_password(prompt: &str) -> ProfilesResult<Password> {
    rpassword::prompt_password(prompt)
        .map(Password::from)
        .map_err(|e| ProfilesError::Config(format!("Failed to read password: {}", e)))
}
