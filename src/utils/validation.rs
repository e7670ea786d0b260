use crate::utils::error::{MigrateError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(MigrateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(MigrateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// 副檔名只接受英數字，不含前導點
pub fn validate_extensions(field_name: &str, extensions: &[String]) -> Result<()> {
    if extensions.is_empty() {
        return Err(MigrateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: String::new(),
            reason: "At least one file extension is required".to_string(),
        });
    }

    for ext in extensions {
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MigrateError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: ext.clone(),
                reason: "Extensions must be alphanumeric without a leading dot".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_backup_suffix(field_name: &str, suffix: &str) -> Result<()> {
    validate_non_empty_string(field_name, suffix)?;

    if !suffix.starts_with('.') || suffix.len() < 2 {
        return Err(MigrateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: suffix.to_string(),
            reason: "Backup suffix must start with '.' followed by a name".to_string(),
        });
    }

    if suffix.contains('/') || suffix.contains('\\') {
        return Err(MigrateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: suffix.to_string(),
            reason: "Backup suffix cannot contain path separators".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MigrateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("migration.root", "./reports").is_ok());
        assert!(validate_path("migration.root", "").is_err());
        assert!(validate_path("migration.root", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_extensions() {
        let exts = vec!["jrxml".to_string(), "rptdesign".to_string()];
        assert!(validate_extensions("migration.extensions", &exts).is_ok());

        assert!(validate_extensions("migration.extensions", &[]).is_err());
        assert!(validate_extensions("migration.extensions", &[".xml".to_string()]).is_err());
    }

    #[test]
    fn test_validate_backup_suffix() {
        assert!(validate_backup_suffix("output.backup_suffix", ".bak").is_ok());
        assert!(validate_backup_suffix("output.backup_suffix", "bak").is_err());
        assert!(validate_backup_suffix("output.backup_suffix", ".").is_err());
        assert!(validate_backup_suffix("output.backup_suffix", "./x").is_err());
        assert!(validate_backup_suffix("output.backup_suffix", "  ").is_err());
    }
}
