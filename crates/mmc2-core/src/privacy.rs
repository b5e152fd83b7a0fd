use crate::conversation::Message;
use crate::member::{Consciousness, PrivacyLevel};
use crate::system::SystemConfig;

/// Member id that bypasses all privacy checks.
pub const SYSTEM_ADMIN_ID: &str = "admin";

pub fn can_view(
    viewer: &Consciousness,
    owner_id: &str,
    level: PrivacyLevel,
    system: &SystemConfig,
) -> bool {
    if viewer.id == SYSTEM_ADMIN_ID {
        return true;
    }
    match level {
        PrivacyLevel::Public => true,
        PrivacyLevel::Shared => system.contains(&viewer.id),
        PrivacyLevel::Private => viewer.id == owner_id,
    }
}

/// A message inherits the privacy level of its sender.
pub fn can_view_message(viewer: &Consciousness, message: &Message, system: &SystemConfig) -> bool {
    can_view(
        viewer,
        &message.sender.id,
        message.sender.privacy_level,
        system,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> SystemConfig {
        let mut system = SystemConfig::new();
        system
            .add_member(Consciousness::with_id("a", "Ann"))
            .expect("add");
        system
            .add_member(Consciousness::with_id("b", "Bo"))
            .expect("add");
        system
    }

    #[test]
    fn private_is_owner_only() {
        let system = system();
        let ann = Consciousness::with_id("a", "Ann");
        let bo = Consciousness::with_id("b", "Bo");
        assert!(can_view(&ann, "a", PrivacyLevel::Private, &system));
        assert!(!can_view(&bo, "a", PrivacyLevel::Private, &system));
    }

    #[test]
    fn shared_requires_system_membership() {
        let system = system();
        let bo = Consciousness::with_id("b", "Bo");
        let outsider = Consciousness::with_id("x", "Guest");
        assert!(can_view(&bo, "a", PrivacyLevel::Shared, &system));
        assert!(!can_view(&outsider, "a", PrivacyLevel::Shared, &system));
        assert!(can_view(&outsider, "a", PrivacyLevel::Public, &system));
    }

    #[test]
    fn admin_sees_everything() {
        let system = system();
        let admin = Consciousness::with_id(SYSTEM_ADMIN_ID, "Admin");
        let secret = Message::new(
            Consciousness::with_id("a", "Ann").with_privacy(PrivacyLevel::Private),
            "secret",
        );
        assert!(can_view_message(&admin, &secret, &system));
        assert!(!can_view_message(
            &Consciousness::with_id("b", "Bo"),
            &secret,
            &system
        ));
    }
}
