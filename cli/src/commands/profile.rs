use anyhow::{Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;

use lemon_core::db::Database;
use lemon_core::models::ProfileSummary;
use lemon_core::profile::{
    AVATAR_KEY, EMAIL_KEY, FIRST_NAME_KEY, LAST_NAME_KEY, PROFILE_KEYS, build_profile_summary,
    set_profile_field,
};
use lemon_core::store::LocalStore;

use super::helpers::profile_badge;

#[derive(Serialize)]
struct ProfileView {
    fields: BTreeMap<String, String>,
    summary: ProfileSummary,
}

fn load_profile(db: &Database) -> Result<ProfileView> {
    let mut fields = BTreeMap::new();
    for key in PROFILE_KEYS {
        if let Some(value) = db.get_setting(key)? {
            fields.insert((*key).to_string(), value);
        }
    }
    Ok(ProfileView {
        fields,
        summary: build_profile_summary(db)?,
    })
}

pub(crate) fn cmd_profile_show(store: &LocalStore, json: bool) -> Result<()> {
    let view = store.with_db(load_profile)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if view.fields.is_empty() {
        println!("No profile set. Use `lemon profile set` to add one.");
        return Ok(());
    }

    for key in PROFILE_KEYS {
        let value = view.fields.get(*key).map_or("-", String::as_str);
        println!("{key:<10} {value}");
    }
    if let Some(badge) = profile_badge(&view.summary) {
        println!("\nBadge: {badge}");
    }
    Ok(())
}

pub(crate) fn cmd_profile_set(
    store: &LocalStore,
    first_name: Option<&str>,
    last_name: Option<&str>,
    email: Option<&str>,
    avatar: Option<&str>,
    json: bool,
) -> Result<()> {
    let updates: Vec<(&str, &str)> = [
        (FIRST_NAME_KEY, first_name),
        (LAST_NAME_KEY, last_name),
        (EMAIL_KEY, email),
        (AVATAR_KEY, avatar),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| (key, v)))
    .collect();

    if updates.is_empty() {
        bail!("Nothing to set. Pass at least one of --first-name, --last-name, --email, --avatar");
    }

    store.with_db(|db| -> Result<()> {
        for (key, value) in &updates {
            set_profile_field(db, key, value)?;
        }
        Ok(())
    })?;

    if json {
        let view = store.with_db(load_profile)?;
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        for (key, value) in &updates {
            if value.trim().is_empty() {
                println!("Cleared {key}");
            } else {
                println!("Set {key} = {}", value.trim());
            }
        }
    }
    Ok(())
}
