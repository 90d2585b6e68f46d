use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use lemon_core::models::{MenuEntry, ProfileSummary};
use lemon_core::query::CategorySelection;

/// Build a selection by toggling each requested tag on. Repeats cancel out,
/// the same way tapping a chip twice does.
pub(crate) fn selection_from(categories: &[String]) -> Result<CategorySelection> {
    let mut selection = CategorySelection::new();
    for tag in categories {
        selection.toggle(tag)?;
    }
    Ok(selection)
}

pub(crate) fn print_menu_table(entries: &[MenuEntry]) {
    #[derive(Tabled)]
    struct MenuRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    let rows: Vec<MenuRow> = entries
        .iter()
        .map(|e| MenuRow {
            id: e.id,
            name: truncate(&e.name, 30),
            category: e.category.clone(),
            price: format_price(e.price),
            description: truncate(&e.description, 50),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn profile_badge(summary: &ProfileSummary) -> Option<String> {
    match (&summary.avatar, &summary.initials) {
        (Some(avatar), _) => Some(format!("[avatar: {avatar}]")),
        (None, Some(initials)) => Some(format!("[{initials}]")),
        (None, None) => None,
    }
}

pub(crate) fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
