use crate::model::UserIdentity;

pub const ADDRESS_HEAD_CHARS: usize = 4;
pub const ADDRESS_TAIL_CHARS: usize = 4;

/// Shortens an address to `head...tail`. Counts characters, not bytes.
#[must_use]
pub fn truncate_address(address: &str, head: usize, tail: usize) -> String {
    let len = address.chars().count();
    if len <= head + tail {
        return address.to_string();
    }
    let start: String = address.chars().take(head).collect();
    let end: String = address.chars().skip(len - tail).collect();
    format!("{start}...{end}")
}

/// Secondary balances are shown with four decimals.
#[must_use]
pub fn format_secondary(amount: f64) -> String {
    format!("{amount:.4}")
}

#[must_use]
pub fn display_name(user: &UserIdentity) -> String {
    match user.last_name.as_deref().filter(|l| !l.is_empty()) {
        Some(last) => format!("{} {}", user.first_name, last),
        None => user.first_name.clone(),
    }
}

#[must_use]
pub fn handle(user: &UserIdentity) -> String {
    format!("@{}", user.username.as_deref().unwrap_or("user"))
}

#[must_use]
pub fn initial(user: &UserIdentity) -> String {
    user.first_name.chars().next().map(String::from).unwrap_or_default()
}
