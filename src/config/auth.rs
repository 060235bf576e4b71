//! User allow-listing.

use tracing::debug;

/// Sent to users that are not on the allow-list.
pub const REFUSAL_NOTICE: &str = "Sorry, it's a bot for private usage.";

/// Checks senders against the configured allow-list.
#[derive(Debug, Clone)]
pub struct Authorizer {
    users: Vec<String>,
}

impl Authorizer {
    pub fn new(users: Vec<String>) -> Self {
        Self { users }
    }

    /// Everyone passes when the list is empty or is the single entry `*`.
    pub fn allows_everyone(&self) -> bool {
        self.users.is_empty() || (self.users.len() == 1 && self.users[0] == "*")
    }

    /// Whether a sender with this username may use the bot.
    ///
    /// Users without a username only pass when everyone is allowed.
    pub fn is_allowed(&self, username: Option<&str>) -> bool {
        let pass = self.allows_everyone()
            || username.is_some_and(|name| self.users.iter().any(|u| u == name));
        debug!(username = username.unwrap_or("<none>"), pass, "user check");
        pass
    }
}
