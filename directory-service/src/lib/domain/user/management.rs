//! Decision logic for the user ↔ department manager relationship.
//!
//! A user manages at most one department, and only the department they
//! belong to. These functions compute which foreign-key write (if any) a
//! mutation flow must issue; the repository executes the decision inside
//! the transaction that carries the rest of the flow.

use uuid::Uuid;

/// Relation write to apply to `departments.manager_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagementChange {
    /// Point this department's manager at the user, clearing any other
    /// department that still references them.
    Assign(Uuid),
    /// Null out every manager reference the user holds.
    Clear,
    /// Desired state already holds; do not touch the relation (the
    /// department row's `updated_at` must not move).
    Keep,
}

/// What a flow read about the user before deciding.
#[derive(Debug, Clone, Copy)]
pub struct ManagementSnapshot {
    pub user_id: Uuid,
    pub department_id: Uuid,
    /// Department currently pointing its `manager_id` at the user, if any.
    pub managed_department_id: Option<Uuid>,
}

impl ManagementSnapshot {
    /// Management that actually counts: a link to a department the user no
    /// longer belongs to is stale data, not management.
    pub fn effective_management(&self) -> Option<Uuid> {
        self.managed_department_id
            .filter(|id| *id == self.department_id)
    }

    pub fn has_stale_link(&self) -> bool {
        self.managed_department_id
            .is_some_and(|id| id != self.department_id)
    }
}

/// Decide the relation write for an `is_manager` flag update.
///
/// Idempotent with respect to the effective state. A stale link is always
/// repaired, even when the desired state already matches the corrected
/// state; a dangling reference must never survive a decision that saw it.
pub fn resolve_flag(snapshot: &ManagementSnapshot, is_manager: bool) -> ManagementChange {
    let currently_manages = snapshot.effective_management().is_some();

    if currently_manages == is_manager {
        if snapshot.has_stale_link() {
            return ManagementChange::Clear;
        }
        return ManagementChange::Keep;
    }

    if is_manager {
        ManagementChange::Assign(snapshot.department_id)
    } else {
        ManagementChange::Clear
    }
}

/// Outcome of a combined department-change + flag update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferDecision {
    /// Whether `users.department_id` actually needs to change.
    pub reassign_department: bool,
    pub management: ManagementChange,
}

/// Decide the writes for a transfer with an explicit manager flag.
///
/// Management is decided against the *target* department: the flag
/// expresses intent in the department the user is moving to.
pub fn resolve_transfer(
    snapshot: &ManagementSnapshot,
    target_department_id: Uuid,
    is_manager: bool,
) -> TransferDecision {
    TransferDecision {
        reassign_department: snapshot.department_id != target_department_id,
        management: if is_manager {
            ManagementChange::Assign(target_department_id)
        } else {
            ManagementChange::Clear
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(department: Uuid, managed: Option<Uuid>) -> ManagementSnapshot {
        ManagementSnapshot {
            user_id: Uuid::new_v4(),
            department_id: department,
            managed_department_id: managed,
        }
    }

    #[test]
    fn test_promote_assigns_own_department() {
        let dept = Uuid::new_v4();
        let decision = resolve_flag(&snapshot(dept, None), true);
        assert_eq!(decision, ManagementChange::Assign(dept));
    }

    #[test]
    fn test_demote_clears() {
        let dept = Uuid::new_v4();
        let decision = resolve_flag(&snapshot(dept, Some(dept)), false);
        assert_eq!(decision, ManagementChange::Clear);
    }

    #[test]
    fn test_flag_update_is_idempotent() {
        let dept = Uuid::new_v4();

        // Already a manager, asked to stay one: no relation write.
        assert_eq!(
            resolve_flag(&snapshot(dept, Some(dept)), true),
            ManagementChange::Keep
        );

        // Not a manager, asked to stay that way: no relation write.
        assert_eq!(
            resolve_flag(&snapshot(dept, None), false),
            ManagementChange::Keep
        );
    }

    #[test]
    fn test_stale_link_is_not_management() {
        let dept = Uuid::new_v4();
        let other = Uuid::new_v4();
        let stale = snapshot(dept, Some(other));

        assert_eq!(stale.effective_management(), None);
        assert!(stale.has_stale_link());
    }

    #[test]
    fn test_stale_link_repaired_on_promote() {
        let dept = Uuid::new_v4();
        let other = Uuid::new_v4();

        // Managing a department the user no longer belongs to counts as not
        // managing; promoting assigns the user's own department (Assign
        // clears the stale reference as part of the write).
        assert_eq!(
            resolve_flag(&snapshot(dept, Some(other)), true),
            ManagementChange::Assign(dept)
        );
    }

    #[test]
    fn test_stale_link_repaired_even_without_state_change() {
        let dept = Uuid::new_v4();
        let other = Uuid::new_v4();

        // Desired "not a manager" already matches the corrected state, but
        // the dangling reference still gets cleaned up in storage.
        assert_eq!(
            resolve_flag(&snapshot(dept, Some(other)), false),
            ManagementChange::Clear
        );
    }

    #[test]
    fn test_transfer_with_promotion_targets_new_department() {
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();

        let decision = resolve_transfer(&snapshot(old, Some(old)), new, true);
        assert!(decision.reassign_department);
        assert_eq!(decision.management, ManagementChange::Assign(new));
    }

    #[test]
    fn test_transfer_without_promotion_clears_management() {
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();

        let decision = resolve_transfer(&snapshot(old, Some(old)), new, false);
        assert!(decision.reassign_department);
        assert_eq!(decision.management, ManagementChange::Clear);
    }

    #[test]
    fn test_transfer_to_same_department_skips_reassignment() {
        let dept = Uuid::new_v4();

        let decision = resolve_transfer(&snapshot(dept, Some(dept)), dept, true);
        assert!(!decision.reassign_department);
        assert_eq!(decision.management, ManagementChange::Assign(dept));
    }
}
