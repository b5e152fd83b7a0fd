use std::collections::HashSet;

use mmc2_common::settings::MAX_MEMBERS;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::CoreError;
use crate::member::{Consciousness, validate_name};

/// Members of the system plus the one currently fronting.
///
/// `set_members` and `set_current_member_id` store exactly what they are
/// given. The other mutators enforce `MAX_MEMBERS`, unique ids and names,
/// and that the current member exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    #[serde(default)]
    members: Vec<Consciousness>,
    #[serde(default)]
    current_member_id: String,
}

impl SystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[Consciousness] {
        &self.members
    }

    pub fn set_members(&mut self, members: Vec<Consciousness>) {
        self.members = members;
    }

    pub fn current_member_id(&self) -> &str {
        &self.current_member_id
    }

    pub fn set_current_member_id(&mut self, id: impl Into<String>) {
        self.current_member_id = id.into();
    }

    pub fn member(&self, id: &str) -> Option<&Consciousness> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn current_member(&self) -> Option<&Consciousness> {
        self.member(&self.current_member_id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.member(id).is_some()
    }

    /// New members never start as current; use `switch_to`.
    pub fn add_member(&mut self, mut member: Consciousness) -> Result<(), CoreError> {
        if self.members.len() >= MAX_MEMBERS {
            return Err(CoreError::TooManyMembers { limit: MAX_MEMBERS });
        }
        if self.contains(&member.id) {
            return Err(CoreError::DuplicateMemberId(member.id));
        }
        self.check_name(&member.name, &member.id)?;
        member.is_current = false;
        info!(member_id = %member.id, name = %member.name, "member added");
        self.members.push(member);
        Ok(())
    }

    /// Replaces the stored member that has the same id. The stored
    /// `is_current` flag is kept; only `switch_to` moves it.
    pub fn update_member(&mut self, mut member: Consciousness) -> Result<(), CoreError> {
        self.check_name(&member.name, &member.id)?;
        let slot = self.slot_mut(&member.id)?;
        member.is_current = slot.is_current;
        *slot = member;
        Ok(())
    }

    /// Returns false when `name` equals the current name.
    pub fn rename_member(&mut self, id: &str, name: &str) -> Result<bool, CoreError> {
        let current = self
            .member(id)
            .ok_or_else(|| CoreError::UnknownMember(id.to_string()))?;
        if current.name == name {
            return Ok(false);
        }
        self.check_name(name, id)?;
        self.slot_mut(id)?.name = name.to_string();
        Ok(true)
    }

    pub fn set_background_memory(&mut self, id: &str, memory: &str) -> Result<(), CoreError> {
        self.slot_mut(id)?.background_memory = memory.to_string();
        Ok(())
    }

    pub fn remove_member(&mut self, id: &str) -> Result<Consciousness, CoreError> {
        let idx = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| CoreError::UnknownMember(id.to_string()))?;
        let removed = self.members.remove(idx);
        if self.current_member_id == id {
            self.current_member_id.clear();
        }
        info!(member_id = %id, "member removed");
        Ok(removed)
    }

    /// Makes `id` the current member and updates every `is_current` flag.
    pub fn switch_to(&mut self, id: &str) -> Result<&Consciousness, CoreError> {
        if !self.contains(id) {
            debug!(member_id = %id, "switch target not found");
            return Err(CoreError::UnknownMember(id.to_string()));
        }
        self.current_member_id = id.to_string();
        for member in &mut self.members {
            member.is_current = member.id == id;
        }
        let member = self.slot_mut(id)?;
        info!(member_id = %member.id, name = %member.name, "switched current member");
        Ok(&*member)
    }

    /// Checks a record that bypassed the validated mutators, e.g. one loaded from disk.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.members.len() > MAX_MEMBERS {
            return Err(CoreError::TooManyMembers { limit: MAX_MEMBERS });
        }
        let mut seen = HashSet::new();
        for member in &self.members {
            if !seen.insert(member.id.as_str()) {
                return Err(CoreError::DuplicateMemberId(member.id.clone()));
            }
        }
        if !self.current_member_id.is_empty() && !self.contains(&self.current_member_id) {
            return Err(CoreError::DanglingCurrentMember(
                self.current_member_id.clone(),
            ));
        }
        if let Some(member) = self
            .members
            .iter()
            .find(|m| m.is_current != (m.id == self.current_member_id))
        {
            return Err(CoreError::CurrentFlagMismatch(member.id.clone()));
        }
        Ok(())
    }

    fn check_name(&self, name: &str, own_id: &str) -> Result<(), CoreError> {
        validate_name(name)?;
        if self.members.iter().any(|m| m.name == name && m.id != own_id) {
            return Err(CoreError::DuplicateMemberName(name.to_string()));
        }
        Ok(())
    }

    fn slot_mut(&mut self, id: &str) -> Result<&mut Consciousness, CoreError> {
        self.members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| CoreError::UnknownMember(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_with(names: &[(&str, &str)]) -> SystemConfig {
        let mut system = SystemConfig::new();
        for (id, name) in names {
            system
                .add_member(Consciousness::with_id(*id, *name))
                .expect("add member");
        }
        system
    }

    #[test]
    fn new_config_is_empty() {
        let system = SystemConfig::new();
        assert!(system.members().is_empty());
        assert_eq!(system.current_member_id(), "");
        assert!(system.current_member().is_none());
    }

    #[test]
    fn plain_setters_store_values_verbatim() {
        let mut system = SystemConfig::new();
        let members = vec![
            Consciousness::with_id("1", "same"),
            Consciousness::with_id("1", "same"),
        ];
        system.set_members(members.clone());
        assert_eq!(system.members(), members.as_slice());

        system.set_current_member_id("nobody");
        assert_eq!(system.current_member_id(), "nobody");
    }

    #[test]
    fn add_member_enforces_limit_and_uniqueness() {
        let mut system = SystemConfig::new();
        for i in 0..MAX_MEMBERS {
            system
                .add_member(Consciousness::with_id(i.to_string(), format!("m{i}")))
                .expect("below limit");
        }
        assert_eq!(
            system.add_member(Consciousness::with_id("extra", "extra")),
            Err(CoreError::TooManyMembers { limit: MAX_MEMBERS })
        );

        let mut system = system_with(&[("a", "Ann")]);
        assert_eq!(
            system.add_member(Consciousness::with_id("a", "Other")),
            Err(CoreError::DuplicateMemberId("a".into()))
        );
        assert_eq!(
            system.add_member(Consciousness::with_id("b", "Ann")),
            Err(CoreError::DuplicateMemberName("Ann".into()))
        );
        assert!(matches!(
            system.add_member(Consciousness::with_id("c", "  ")),
            Err(CoreError::InvalidName(_))
        ));
    }

    #[test]
    fn rename_reports_unchanged_and_conflicts() {
        let mut system = system_with(&[("a", "Ann"), ("b", "Bo")]);
        assert_eq!(system.rename_member("a", "Ann"), Ok(false));
        assert_eq!(
            system.rename_member("a", "Bo"),
            Err(CoreError::DuplicateMemberName("Bo".into()))
        );
        assert_eq!(system.rename_member("a", "Annie"), Ok(true));
        assert_eq!(system.member("a").map(|m| m.name.as_str()), Some("Annie"));
        assert_eq!(
            system.rename_member("zz", "Zed"),
            Err(CoreError::UnknownMember("zz".into()))
        );
    }

    #[test]
    fn switch_updates_current_flags() {
        let mut system = system_with(&[("a", "Ann"), ("b", "Bo")]);
        system.switch_to("a").expect("switch a");
        let name = system.switch_to("b").expect("switch b").name.clone();
        assert_eq!(name, "Bo");
        assert_eq!(system.current_member_id(), "b");
        let flags: Vec<bool> = system.members().iter().map(|m| m.is_current).collect();
        assert_eq!(flags, vec![false, true]);

        assert_eq!(
            system.switch_to("missing").map(|m| m.id.clone()),
            Err(CoreError::UnknownMember("missing".into()))
        );
        assert_eq!(system.current_member_id(), "b");
    }

    #[test]
    fn removing_current_member_clears_selection() {
        let mut system = system_with(&[("a", "Ann"), ("b", "Bo")]);
        system.switch_to("a").expect("switch");
        let removed = system.remove_member("a").expect("remove");
        assert_eq!(removed.name, "Ann");
        assert_eq!(system.current_member_id(), "");
        assert_eq!(system.members().len(), 1);
    }

    #[test]
    fn validate_catches_records_built_with_plain_setters() {
        let mut system = SystemConfig::new();
        system.set_members(vec![
            Consciousness::with_id("1", "x"),
            Consciousness::with_id("1", "y"),
        ]);
        assert_eq!(
            system.validate(),
            Err(CoreError::DuplicateMemberId("1".into()))
        );

        let mut system = system_with(&[("a", "Ann")]);
        system.set_current_member_id("ghost");
        assert_eq!(
            system.validate(),
            Err(CoreError::DanglingCurrentMember("ghost".into()))
        );
        system.set_current_member_id("");
        assert_eq!(system.validate(), Ok(()));
    }

    #[test]
    fn update_keeps_stored_current_flag() {
        let mut system = system_with(&[("a", "Ann"), ("b", "Bo")]);
        system.switch_to("a").expect("switch");

        let mut bo = system.member("b").cloned().expect("b");
        bo.is_current = true;
        bo.background_memory = "likes tea".to_string();
        system.update_member(bo).expect("update b");

        let mut ann = system.member("a").cloned().expect("a");
        ann.is_current = false;
        system.update_member(ann).expect("update a");

        let flags: Vec<bool> = system.members().iter().map(|m| m.is_current).collect();
        assert_eq!(flags, vec![true, false]);
        assert_eq!(
            system.member("b").map(|m| m.background_memory.as_str()),
            Some("likes tea")
        );
        assert_eq!(system.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_stale_current_flags() {
        let mut stale = Consciousness::with_id("b", "Bo");
        stale.is_current = true;
        let mut system = SystemConfig::new();
        system.set_members(vec![Consciousness::with_id("a", "Ann"), stale]);
        system.set_current_member_id("a");
        assert_eq!(
            system.validate(),
            Err(CoreError::CurrentFlagMismatch("a".into()))
        );

        system.set_current_member_id("");
        assert_eq!(
            system.validate(),
            Err(CoreError::CurrentFlagMismatch("b".into()))
        );

        system.switch_to("b").expect("switch");
        assert_eq!(system.validate(), Ok(()));
    }
}
