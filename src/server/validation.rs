use crate::server::response::ApiError;

const MAX_USER_NAME_LEN: usize = 64;
const MAX_RESOURCE_NAME_LEN: usize = 200;

pub fn validate_user_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::bad_request("User name cannot be empty"));
    }
    if name.len() > MAX_USER_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "User name cannot exceed {MAX_USER_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::bad_request(
            "User name can only contain alphanumeric characters, hyphens, and underscores",
        ));
    }
    if name.starts_with('-') || name.starts_with('_') {
        return Err(ApiError::bad_request(
            "User name cannot start with a hyphen or underscore",
        ));
    }
    Ok(())
}

/// Document and project names are free-form display names; only emptiness
/// and length are enforced.
pub fn validate_resource_name(name: &str, entity: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!(
            "{entity} name cannot be empty"
        )));
    }
    if name.len() > MAX_RESOURCE_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "{entity} name cannot exceed {MAX_RESOURCE_NAME_LEN} characters"
        )));
    }
    Ok(())
}
