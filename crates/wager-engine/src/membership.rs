//! Groups and the membership guard.
//!
//! A member may not leave, or be removed from, a group while they still have
//! exposure there: a bet they originated that is `OPEN` or `ACTIVE`, or a bid
//! of theirs that is still `ACTIVE`. Deleting a whole group is blocked while
//! any bet in it is live.

use serde::Serialize;
use wager_types::{
    Caller, Exposure, Group, GroupId, MemberRole, Membership, Posting, Result, TransactionType,
    UserId, WagerError,
};

use crate::engine::WagerEngine;
use crate::store::Store;
use crate::tables::Erased;

/// What `delete_group` removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupDeletion {
    pub group_id: GroupId,
    pub erased: Erased,
}

impl<S: Store> WagerEngine<S> {
    /// Create a group with the caller as its admin.
    ///
    /// # Errors
    /// `ValidationFailed` if the name is blank.
    pub fn create_group(&self, caller: &Caller, name: &str, description: &str) -> Result<GroupId> {
        let user = caller.require()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(WagerError::validation("group name is required"));
        }

        self.commit("create_group", |tables, now| {
            let group = Group {
                id: GroupId::new(),
                name: name.to_string(),
                description: description.trim().to_string(),
                created_by: user,
                created_at: now,
            };
            let group_id = group.id;
            tables.insert_group(group)?;
            tables.insert_membership(Membership {
                group_id,
                user_id: user,
                role: MemberRole::Admin,
                joined_at: now,
            })?;
            tables.ledger_mut().append(
                Posting::activity(
                    user,
                    TransactionType::GroupCreate,
                    format!("Created group: {name}"),
                )
                .in_group(group_id),
                now,
            )?;

            tracing::info!(group = %group_id, admin = %user, "Group created");
            Ok(group_id)
        })
    }

    /// Rename a group and replace its description. Admin only.
    ///
    /// # Errors
    /// - `ValidationFailed` if the name is blank
    /// - `NotFound` if the group does not exist
    /// - `NotAuthorized` unless the caller is an admin of the group
    pub fn update_group(
        &self,
        caller: &Caller,
        group_id: GroupId,
        name: &str,
        description: &str,
    ) -> Result<()> {
        let admin = caller.require()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(WagerError::validation("group name is required"));
        }

        self.commit("update_group", |tables, now| {
            tables.group(group_id)?;
            require_admin(tables.membership(group_id, admin), "update group settings")?;

            let group = tables.group_mut(group_id)?;
            group.name = name.to_string();
            group.description = description.trim().to_string();
            tables.ledger_mut().append(
                Posting::activity(
                    admin,
                    TransactionType::GroupUpdate,
                    format!("Updated group: {name}"),
                )
                .in_group(group_id),
                now,
            )?;

            tracing::info!(group = %group_id, admin = %admin, "Group updated");
            Ok(())
        })
    }

    /// Join a group as a regular member.
    ///
    /// # Errors
    /// - `NotFound` if the group does not exist
    /// - `ValidationFailed` if the caller is already a member
    pub fn join_group(&self, caller: &Caller, group_id: GroupId) -> Result<()> {
        let user = caller.require()?;

        self.commit("join_group", |tables, now| {
            let name = tables.group(group_id)?.name.clone();
            tables.insert_membership(Membership {
                group_id,
                user_id: user,
                role: MemberRole::Member,
                joined_at: now,
            })?;
            tables.ledger_mut().append(
                Posting::activity(user, TransactionType::GroupJoin, format!("Joined group: {name}"))
                    .in_group(group_id),
                now,
            )?;

            tracing::info!(group = %group_id, user = %user, "Member joined");
            Ok(())
        })
    }

    /// Leave a group. Blocked while the caller has exposure there.
    ///
    /// # Errors
    /// - `NotFound` if the group or the caller's membership does not exist
    /// - `HasOpenExposure` if the caller has live bets or active bids there
    pub fn exit_group(&self, caller: &Caller, group_id: GroupId) -> Result<()> {
        let user = caller.require()?;

        self.commit("exit_group", |tables, now| {
            let name = tables.group(group_id)?.name.clone();
            if tables.membership(group_id, user).is_none() {
                return Err(WagerError::not_found("membership", user));
            }
            guard_exposure(tables.exposure(group_id, user), group_id, user)?;

            tables.remove_membership(group_id, user)?;
            tables.ledger_mut().append(
                Posting::activity(user, TransactionType::GroupExit, format!("Left group: {name}"))
                    .in_group(group_id),
                now,
            )?;

            tracing::info!(group = %group_id, user = %user, "Member left");
            Ok(())
        })
    }

    /// Remove another member. Admin only; blocked while the target has exposure.
    ///
    /// # Errors
    /// - `NotFound` if the group or the target's membership does not exist
    /// - `NotAuthorized` unless the caller is an admin of the group
    /// - `HasOpenExposure` if the target has live bets or active bids there
    pub fn remove_member(&self, caller: &Caller, group_id: GroupId, target: UserId) -> Result<()> {
        let admin = caller.require()?;

        self.commit("remove_member", |tables, now| {
            tables.group(group_id)?;
            require_admin(tables.membership(group_id, admin), "remove members")?;
            if tables.membership(group_id, target).is_none() {
                return Err(WagerError::not_found("membership", target));
            }
            guard_exposure(tables.exposure(group_id, target), group_id, target)?;

            tables.remove_membership(group_id, target)?;
            tables.ledger_mut().append(
                Posting::activity(
                    admin,
                    TransactionType::MemberRemove,
                    format!("Removed member: {target}"),
                )
                .in_group(group_id),
                now,
            )?;

            tracing::info!(group = %group_id, admin = %admin, removed = %target, "Member removed");
            Ok(())
        })
    }

    /// Delete a group, its bets and the ledger entries tied to those bets.
    /// Admin only; blocked while any bet in the group is live.
    ///
    /// # Errors
    /// - `NotFound` if the group does not exist
    /// - `NotAuthorized` unless the caller is an admin of the group
    /// - `HasOpenExposure` (as `GroupHasOpenExposure`) if any bet in the
    ///   group is `OPEN` or `ACTIVE`
    pub fn delete_group(&self, caller: &Caller, group_id: GroupId) -> Result<GroupDeletion> {
        let admin = caller.require()?;

        self.commit("delete_group", |tables, now| {
            let name = tables.group(group_id)?.name.clone();
            require_admin(tables.membership(group_id, admin), "delete the group")?;
            let exposure = tables.group_exposure(group_id);
            if !exposure.is_empty() {
                tracing::warn!(
                    group = %group_id,
                    admin = %admin,
                    %exposure,
                    "Group deletion blocked by live bets"
                );
                return Err(WagerError::GroupHasOpenExposure {
                    group: group_id,
                    exposure,
                });
            }

            let erased = tables.erase_group(group_id);
            tables.ledger_mut().append(
                Posting::activity(
                    admin,
                    TransactionType::GroupDelete,
                    format!("Deleted group: {name}"),
                ),
                now,
            )?;

            tracing::warn!(
                group = %group_id,
                admin = %admin,
                bets = erased.bets,
                bids = erased.bids,
                memberships = erased.memberships,
                ledger_entries = erased.ledger_entries,
                "Group deleted"
            );
            Ok(GroupDeletion { group_id, erased })
        })
    }

    /// # Errors
    /// `NotFound` if the group does not exist.
    pub fn group(&self, group_id: GroupId) -> Result<Group> {
        self.view(|tables| tables.group(group_id).cloned())
    }

    /// Members of a group, in join order per user id.
    ///
    /// # Errors
    /// `NotFound` if the group does not exist.
    pub fn members(&self, group_id: GroupId) -> Result<Vec<Membership>> {
        self.view(|tables| {
            tables.group(group_id)?;
            Ok(tables.members_of(group_id).cloned().collect())
        })
    }

    /// The user's current exposure in a group.
    ///
    /// # Errors
    /// `NotFound` if the group does not exist.
    pub fn exposure(&self, group_id: GroupId, user_id: UserId) -> Result<Exposure> {
        self.view(|tables| {
            tables.group(group_id)?;
            Ok(tables.exposure(group_id, user_id))
        })
    }
}

fn require_admin(membership: Option<&Membership>, action: &str) -> Result<()> {
    match membership {
        Some(m) if m.is_admin() => Ok(()),
        _ => Err(WagerError::unauthorized(format!(
            "only group admins can {action}"
        ))),
    }
}

fn guard_exposure(exposure: Exposure, group_id: GroupId, user: UserId) -> Result<()> {
    if exposure.is_empty() {
        return Ok(());
    }
    tracing::warn!(group = %group_id, user = %user, %exposure, "Membership change blocked by open exposure");
    Err(WagerError::HasOpenExposure { user, exposure })
}
