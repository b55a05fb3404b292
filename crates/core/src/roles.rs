//! Well-known role name constants.
//!
//! These must match the `role` column default in `20260301000001_create_users.sql`.

pub const ROLE_BUYER: &str = "buyer";
pub const ROLE_SELLER: &str = "seller";
pub const ROLE_ADMIN: &str = "admin";

/// Role assigned when signup does not request one.
pub const DEFAULT_ROLE: &str = ROLE_BUYER;

/// Every role a user may hold.
pub const ALL_ROLES: [&str; 3] = [ROLE_BUYER, ROLE_SELLER, ROLE_ADMIN];

/// Whether `role` is one of [`ALL_ROLES`].
pub fn is_known_role(role: &str) -> bool {
    ALL_ROLES.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_are_accepted() {
        assert!(is_known_role("buyer"));
        assert!(is_known_role("seller"));
        assert!(is_known_role("admin"));
    }

    #[test]
    fn unknown_and_miscased_roles_are_rejected() {
        assert!(!is_known_role("superuser"));
        assert!(!is_known_role("Admin"));
        assert!(!is_known_role(""));
    }
}
