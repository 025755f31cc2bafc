//! Authorization decision.

use watchpost_core::{Role, SubscriberId};

use super::UserDirectory;

/// Decide whether `id` may run something requiring `required`.
///
/// The order matters: a ban rejects even open commands.
#[must_use]
pub fn is_authorized(directory: &UserDirectory, id: SubscriberId, required: Role) -> bool {
    if directory.is_banned(id) {
        return false;
    }
    if required == Role::Open {
        return true;
    }
    directory.get(id).is_some_and(|user| user.role >= required)
}
