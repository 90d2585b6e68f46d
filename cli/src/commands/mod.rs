mod helpers;
mod menu;
mod profile;

pub(crate) use menu::{cmd_duplicates, cmd_menu, cmd_search, cmd_sync};
pub(crate) use profile::{cmd_profile_set, cmd_profile_show};
