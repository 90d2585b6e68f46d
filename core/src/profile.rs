use anyhow::Result;

use crate::db::Database;
use crate::models::ProfileSummary;
use crate::store::LocalStore;

pub const FIRST_NAME_KEY: &str = "firstName";
pub const LAST_NAME_KEY: &str = "lastName";
pub const EMAIL_KEY: &str = "email";
pub const AVATAR_KEY: &str = "avatar";

pub const PROFILE_KEYS: &[&str] = &[FIRST_NAME_KEY, LAST_NAME_KEY, EMAIL_KEY, AVATAR_KEY];

fn initials(first: &str, last: &str) -> Option<String> {
    let f = first.trim().chars().next()?;
    let l = last.trim().chars().next()?;
    Some(format!("{f}{l}").to_uppercase())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn build_profile_summary(db: &Database) -> Result<ProfileSummary> {
    if let Some(avatar) = non_empty(db.get_setting(AVATAR_KEY)?) {
        return Ok(ProfileSummary {
            avatar: Some(avatar),
            initials: None,
        });
    }

    let first = non_empty(db.get_setting(FIRST_NAME_KEY)?);
    let last = non_empty(db.get_setting(LAST_NAME_KEY)?);
    let initials = match (first, last) {
        (Some(first), Some(last)) => initials(&first, &last),
        _ => None,
    };
    Ok(ProfileSummary {
        avatar: None,
        initials,
    })
}

/// Store or clear one profile field. An empty value removes the key.
pub fn set_profile_field(db: &Database, key: &str, value: &str) -> Result<()> {
    if !PROFILE_KEYS.contains(&key) {
        anyhow::bail!(
            "Invalid profile field '{key}'. Must be one of: {}",
            PROFILE_KEYS.join(", ")
        );
    }
    if value.trim().is_empty() {
        db.delete_setting(key)?;
    } else {
        db.set_setting(key, value.trim())?;
    }
    Ok(())
}

impl LocalStore {
    /// Header badge for the menu screen. Read independently of menu sync;
    /// failures degrade to an empty summary.
    pub async fn profile_summary(&self) -> ProfileSummary {
        self.with_db(build_profile_summary).unwrap_or_else(|e| {
            tracing::error!(error = %format!("{e:#}"), "failed to load profile data");
            ProfileSummary::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_empty() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(build_profile_summary(&db).unwrap(), ProfileSummary::default());
    }

    #[test]
    fn test_summary_initials() {
        let db = Database::open_in_memory().unwrap();
        set_profile_field(&db, FIRST_NAME_KEY, "tilly").unwrap();
        set_profile_field(&db, LAST_NAME_KEY, "mcnair").unwrap();
        let summary = build_profile_summary(&db).unwrap();
        assert_eq!(summary.initials.as_deref(), Some("TM"));
        assert!(summary.avatar.is_none());
    }

    #[test]
    fn test_summary_needs_both_names() {
        let db = Database::open_in_memory().unwrap();
        set_profile_field(&db, FIRST_NAME_KEY, "Tilly").unwrap();
        assert_eq!(build_profile_summary(&db).unwrap(), ProfileSummary::default());
    }

    #[test]
    fn test_avatar_wins_over_initials() {
        let db = Database::open_in_memory().unwrap();
        set_profile_field(&db, FIRST_NAME_KEY, "Tilly").unwrap();
        set_profile_field(&db, LAST_NAME_KEY, "McNair").unwrap();
        set_profile_field(&db, AVATAR_KEY, "file:///avatars/tilly.png").unwrap();
        let summary = build_profile_summary(&db).unwrap();
        assert_eq!(summary.avatar.as_deref(), Some("file:///avatars/tilly.png"));
        assert!(summary.initials.is_none());
    }

    #[test]
    fn test_empty_value_clears_field() {
        let db = Database::open_in_memory().unwrap();
        set_profile_field(&db, AVATAR_KEY, "file:///a.png").unwrap();
        set_profile_field(&db, AVATAR_KEY, "  ").unwrap();
        assert!(db.get_setting(AVATAR_KEY).unwrap().is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(set_profile_field(&db, "password", "hunter2").is_err());
    }

    #[test]
    fn test_initials_multibyte() {
        assert_eq!(initials("émile", "ünal").as_deref(), Some("ÉÜ"));
    }

    #[tokio::test]
    async fn test_store_profile_summary() {
        let store = LocalStore::open_in_memory().unwrap();
        store
            .with_db(|db| {
                set_profile_field(db, FIRST_NAME_KEY, "Adrian")?;
                set_profile_field(db, LAST_NAME_KEY, "Gomez")
            })
            .unwrap();
        assert_eq!(store.profile_summary().await.initials.as_deref(), Some("AG"));
    }
}
