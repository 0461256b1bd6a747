use chrono::{DateTime, Utc};
use ledger_engine::db_types::{AccessKey, Balance, LoginLogEntry};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_access_keys(keys: &[AccessKey]) -> String {
    if keys.is_empty() {
        return "No access keys".to_string();
    }
    let mut table = Table::new();
    markdown_style(&mut table);
    table.set_titles(row!["ID", "Cabinet", "Key", "Active", "Description", "Created", "Last used"]);
    keys.iter().for_each(|k| {
        table.add_row(row![
            k.id,
            k.cabinet,
            k.access_key,
            if k.is_active { "yes" } else { "no" },
            k.description.as_deref().unwrap_or_default(),
            timestamp(&k.created_at),
            k.last_used.as_ref().map(timestamp).unwrap_or_else(|| "never".into()),
        ]);
    });
    table.to_string()
}

pub fn format_balances(balances: &[Balance]) -> String {
    if balances.is_empty() {
        return "No balances".to_string();
    }
    let mut table = Table::new();
    markdown_style(&mut table);
    table.set_titles(row!["ID", "From", "To", "Amount", "Updated"]);
    balances.iter().for_each(|b| {
        table.add_row(row![b.id, b.cabinet_from, b.cabinet_to, r->b.amount, timestamp(&b.updated_at)]);
    });
    table.to_string()
}

pub fn format_login_logs(logs: &[LoginLogEntry]) -> String {
    if logs.is_empty() {
        return "No login attempts".to_string();
    }
    let mut table = Table::new();
    markdown_style(&mut table);
    table.set_titles(row!["Time", "Cabinet", "IP", "Status", "User agent"]);
    logs.iter().for_each(|l| {
        table.add_row(row![timestamp(&l.created_at), l.cabinet, l.ip_address, l.status, l.user_agent]);
    });
    table.to_string()
}
