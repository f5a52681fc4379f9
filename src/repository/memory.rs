use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{RepoResult, ReportResolution, Repository};
use crate::error::RepoError;
use crate::models::{
    Admin, AdminAccount, AdminDashboardStats, BannedWord, Category, Comment, Community,
    CommunityFilter, Configuration, CreateCategoryRequest, CreateConfigurationRequest, Guest,
    Integration, Member, MemberAccount, Membership, NewAdmin, NewComment, NewCommunity,
    NewIntegration, NewMember, NewPost, NewReport, NewSession, Page, PageRequest, Post,
    PostFilter, PostSnapshot, PostSort, RecentCommunity, Report, ReportStatus, ReportTarget,
    Session, UpdateCategoryRequest, UpdateCommunityRequest, UpdateConfigurationRequest,
    UpdateIntegrationRequest, VoteTarget,
};

/// A row plus its soft-delete marker.
#[derive(Debug, Clone)]
struct Stored<T> {
    row: T,
    deleted_at: Option<DateTime<Utc>>,
}

impl<T> Stored<T> {
    fn new(row: T) -> Self {
        Self {
            row,
            deleted_at: None,
        }
    }

    fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Default)]
struct MemoryState {
    guests: HashMap<Uuid, Guest>,
    members: HashMap<Uuid, Stored<MemberAccount>>,
    admins: HashMap<Uuid, Stored<AdminAccount>>,
    sessions: HashMap<Uuid, Session>,
    categories: HashMap<Uuid, Stored<Category>>,
    communities: HashMap<Uuid, Stored<Community>>,
    memberships: HashMap<Uuid, Stored<Membership>>,
    recent: HashMap<(Uuid, Uuid), DateTime<Utc>>,
    posts: HashMap<Uuid, Stored<Post>>,
    snapshots: Vec<Stored<PostSnapshot>>,
    comments: HashMap<Uuid, Stored<Comment>>,
    // Keyed by (target id, member id).
    post_votes: HashMap<(Uuid, Uuid), i16>,
    comment_votes: HashMap<(Uuid, Uuid), i16>,
    reports: HashMap<Uuid, Stored<Report>>,
    banned_words: HashMap<Uuid, Stored<BannedWord>>,
    configurations: HashMap<Uuid, Stored<Configuration>>,
    integrations: HashMap<Uuid, Stored<Integration>>,
}

impl MemoryState {
    /// Soft-deletes an active reported post or comment.
    fn remove_target(&mut self, target: ReportTarget, id: Uuid, now: DateTime<Utc>) -> bool {
        let deleted_at = match target {
            ReportTarget::Post if self.post_active(id) => {
                self.posts.get_mut(&id).map(|p| &mut p.deleted_at)
            }
            ReportTarget::Comment if self.comment_active(id) => {
                self.comments.get_mut(&id).map(|c| &mut c.deleted_at)
            }
            _ => None,
        };
        match deleted_at {
            Some(deleted_at) => {
                *deleted_at = Some(now);
                true
            }
            None => false,
        }
    }

    fn community_active(&self, id: Uuid) -> bool {
        self.communities.get(&id).is_some_and(Stored::is_active)
    }

    fn post_active(&self, id: Uuid) -> bool {
        self.posts
            .get(&id)
            .is_some_and(|p| p.is_active() && self.community_active(p.row.community_id))
    }

    fn comment_active(&self, id: Uuid) -> bool {
        self.comments
            .get(&id)
            .is_some_and(|c| c.is_active() && self.post_active(c.row.post_id))
    }

    fn member_active(&self, id: Uuid) -> bool {
        self.members.get(&id).is_some_and(Stored::is_active)
    }

    fn membership_active(&self, m: &Stored<Membership>) -> bool {
        m.is_active() && self.member_active(m.row.member_id)
    }

    fn community_view(&self, stored: &Stored<Community>) -> Community {
        let member_count = self
            .memberships
            .values()
            .filter(|m| m.row.community_id == stored.row.id && self.membership_active(m))
            .count() as i64;
        Community {
            member_count,
            ..stored.row.clone()
        }
    }

    fn score(&self, target: VoteTarget, id: Uuid) -> i64 {
        let votes = match target {
            VoteTarget::Post => &self.post_votes,
            VoteTarget::Comment => &self.comment_votes,
        };
        votes
            .iter()
            .filter(|((target_id, _), _)| *target_id == id)
            .map(|(_, value)| i64::from(*value))
            .sum()
    }

    fn post_view(&self, stored: &Stored<Post>) -> Post {
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.row.post_id == stored.row.id && c.is_active())
            .count() as i64;
        Post {
            score: self.score(VoteTarget::Post, stored.row.id),
            comment_count,
            ..stored.row.clone()
        }
    }

    fn comment_view(&self, stored: &Stored<Comment>) -> Comment {
        Comment {
            score: self.score(VoteTarget::Comment, stored.row.id),
            ..stored.row.clone()
        }
    }

    fn active_member(&self, id: Uuid) -> Option<&Stored<MemberAccount>> {
        self.members.get(&id).filter(|m| m.is_active())
    }
}

/// MemoryRepository
///
/// A `Repository` held entirely in process memory. Used by the test-suite and by
/// `STORE=memory` local runs; it mirrors the Postgres backend's filtering, ordering and
/// uniqueness rules.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn conflict(what: &str) -> RepoError {
    RepoError::Conflict(what.to_string())
}

#[async_trait]
impl Repository for MemoryRepository {
    // --- Actors ---

    async fn create_guest(&self) -> RepoResult<Guest> {
        let guest = Guest {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        self.state().guests.insert(guest.id, guest.clone());
        Ok(guest)
    }

    async fn get_guest(&self, id: Uuid) -> RepoResult<Option<Guest>> {
        Ok(self.state().guests.get(&id).cloned())
    }

    async fn create_member(&self, member: NewMember) -> RepoResult<Member> {
        let mut state = self.state();
        let taken = state.members.values().any(|m| {
            m.is_active()
                && (m.row.member.email == member.email || m.row.member.username == member.username)
        });
        if taken {
            return Err(conflict("members_email_username_key"));
        }
        let now = Utc::now();
        let created = Member {
            id: Uuid::new_v4(),
            email: member.email,
            username: member.username,
            display_name: member.display_name,
            created_at: now,
            updated_at: now,
        };
        let stored = Stored::new(MemberAccount {
            member: created.clone(),
            password_hash: member.password_hash,
        });
        state.members.insert(created.id, stored);
        Ok(created)
    }

    async fn get_member(&self, id: Uuid) -> RepoResult<Option<Member>> {
        Ok(self.state().active_member(id).map(|m| m.row.member.clone()))
    }

    async fn get_member_account_by_email(&self, email: &str) -> RepoResult<Option<MemberAccount>> {
        Ok(self
            .state()
            .members
            .values()
            .find(|m| m.is_active() && m.row.member.email == email)
            .map(|m| m.row.clone()))
    }

    async fn get_member_by_username(&self, username: &str) -> RepoResult<Option<Member>> {
        Ok(self
            .state()
            .members
            .values()
            .find(|m| m.is_active() && m.row.member.username == username)
            .map(|m| m.row.member.clone()))
    }

    async fn list_members(
        &self,
        search: Option<String>,
        page: PageRequest,
    ) -> RepoResult<Page<Member>> {
        let state = self.state();
        let mut rows: Vec<&Stored<MemberAccount>> = state
            .members
            .values()
            .filter(|m| m.is_active())
            .filter(|m| match &search {
                Some(q) => {
                    let member = &m.row.member;
                    contains_ci(&member.email, q)
                        || contains_ci(&member.username, q)
                        || member
                            .display_name
                            .as_deref()
                            .is_some_and(|name| contains_ci(name, q))
                }
                None => true,
            })
            .collect();
        rows.sort_by_key(|m| Reverse((m.row.member.created_at, m.row.member.id)));
        let all = rows.into_iter().map(|m| m.row.member.clone()).collect();
        Ok(Page::from_all(all, page))
    }

    async fn update_member_profile(
        &self,
        id: Uuid,
        display_name: Option<String>,
    ) -> RepoResult<Option<Member>> {
        let mut state = self.state();
        let Some(stored) = state.members.get_mut(&id).filter(|m| m.is_active()) else {
            return Ok(None);
        };
        stored.row.member.display_name = display_name;
        stored.row.member.updated_at = Utc::now();
        Ok(Some(stored.row.member.clone()))
    }

    async fn delete_member(&self, id: Uuid) -> RepoResult<bool> {
        let mut state = self.state();
        let now = Utc::now();
        let Some(stored) = state.members.get_mut(&id).filter(|m| m.is_active()) else {
            return Ok(false);
        };
        stored.deleted_at = Some(now);
        for membership in state.memberships.values_mut() {
            if membership.row.member_id == id && membership.is_active() {
                membership.deleted_at = Some(now);
            }
        }
        Ok(true)
    }

    async fn create_admin(&self, admin: NewAdmin) -> RepoResult<Admin> {
        let mut state = self.state();
        if state
            .admins
            .values()
            .any(|a| a.is_active() && a.row.admin.email == admin.email)
        {
            return Err(conflict("admins_email_key"));
        }
        let now = Utc::now();
        let created = Admin {
            id: Uuid::new_v4(),
            email: admin.email,
            display_name: admin.display_name,
            created_at: now,
            updated_at: now,
        };
        let stored = Stored::new(AdminAccount {
            admin: created.clone(),
            password_hash: admin.password_hash,
        });
        state.admins.insert(created.id, stored);
        Ok(created)
    }

    async fn get_admin(&self, id: Uuid) -> RepoResult<Option<Admin>> {
        Ok(self
            .state()
            .admins
            .get(&id)
            .filter(|a| a.is_active())
            .map(|a| a.row.admin.clone()))
    }

    async fn get_admin_account_by_email(&self, email: &str) -> RepoResult<Option<AdminAccount>> {
        Ok(self
            .state()
            .admins
            .values()
            .find(|a| a.is_active() && a.row.admin.email == email)
            .map(|a| a.row.clone()))
    }

    async fn count_admins(&self) -> RepoResult<i64> {
        Ok(self.state().admins.values().filter(|a| a.is_active()).count() as i64)
    }

    // --- Sessions ---

    async fn create_session(&self, session: NewSession) -> RepoResult<Session> {
        let created = Session {
            id: session.id,
            actor_role: session.actor_role,
            actor_id: session.actor_id,
            user_agent: session.user_agent,
            created_at: Utc::now(),
            last_refreshed_at: None,
            expires_at: session.expires_at,
            revoked_at: None,
            refresh_jti: session.refresh_jti,
        };
        self.state().sessions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_session(&self, id: Uuid) -> RepoResult<Option<Session>> {
        Ok(self.state().sessions.get(&id).cloned())
    }

    async fn rotate_session(
        &self,
        id: Uuid,
        current_jti: Uuid,
        next_jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<Option<Session>> {
        let mut state = self.state();
        let Some(session) = state
            .sessions
            .get_mut(&id)
            .filter(|s| s.revoked_at.is_none() && s.refresh_jti == current_jti)
        else {
            return Ok(None);
        };
        session.refresh_jti = next_jti;
        session.expires_at = expires_at;
        session.last_refreshed_at = Some(Utc::now());
        Ok(Some(session.clone()))
    }

    async fn list_sessions(&self, actor_id: Uuid) -> RepoResult<Vec<Session>> {
        let now = Utc::now();
        let mut sessions: Vec<Session> = self
            .state()
            .sessions
            .values()
            .filter(|s| s.actor_id == actor_id && s.is_active(now))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| Reverse((s.created_at, s.id)));
        Ok(sessions)
    }

    async fn revoke_session(&self, id: Uuid, actor_id: Uuid) -> RepoResult<bool> {
        let now = Utc::now();
        let mut state = self.state();
        match state
            .sessions
            .get_mut(&id)
            .filter(|s| s.actor_id == actor_id && s.is_active(now))
        {
            Some(session) => {
                session.revoked_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_actor_sessions(&self, actor_id: Uuid) -> RepoResult<u64> {
        let now = Utc::now();
        let mut revoked = 0;
        for session in self.state().sessions.values_mut() {
            if session.actor_id == actor_id && session.revoked_at.is_none() {
                session.revoked_at = Some(now);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    // --- Categories ---

    async fn list_categories(&self, page: PageRequest) -> RepoResult<Page<Category>> {
        let state = self.state();
        let mut rows: Vec<Category> = state
            .categories
            .values()
            .filter(|c| c.is_active())
            .map(|c| c.row.clone())
            .collect();
        rows.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(Page::from_all(rows, page))
    }

    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        Ok(self
            .state()
            .categories
            .get(&id)
            .filter(|c| c.is_active())
            .map(|c| c.row.clone()))
    }

    async fn get_category_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        Ok(self
            .state()
            .categories
            .values()
            .find(|c| c.is_active() && c.row.name == name)
            .map(|c| c.row.clone()))
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> RepoResult<Category> {
        let mut state = self.state();
        if state
            .categories
            .values()
            .any(|c| c.is_active() && c.row.name == req.name)
        {
            return Err(conflict("categories_name_key"));
        }
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: req.name,
            description: req.description,
            display_order: req.display_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        let stored = Stored::new(category.clone());
        state.categories.insert(category.id, stored);
        Ok(category)
    }

    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> RepoResult<Option<Category>> {
        let mut state = self.state();
        if let Some(name) = &req.name {
            if state
                .categories
                .values()
                .any(|c| c.is_active() && c.row.id != id && &c.row.name == name)
            {
                return Err(conflict("categories_name_key"));
            }
        }
        let Some(stored) = state.categories.get_mut(&id).filter(|c| c.is_active()) else {
            return Ok(None);
        };
        let row = &mut stored.row;
        if let Some(name) = req.name {
            row.name = name;
        }
        if let Some(description) = req.description {
            row.description = Some(description);
        }
        if let Some(order) = req.display_order {
            row.display_order = order;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<bool> {
        let mut state = self.state();
        match state.categories.get_mut(&id).filter(|c| c.is_active()) {
            Some(stored) => {
                stored.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_communities_in_category(&self, id: Uuid) -> RepoResult<i64> {
        Ok(self
            .state()
            .communities
            .values()
            .filter(|c| c.is_active() && c.row.category_id == Some(id))
            .count() as i64)
    }

    // --- Communities ---

    async fn list_communities(
        &self,
        filter: CommunityFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Community>> {
        let state = self.state();
        let mut rows: Vec<&Stored<Community>> = state
            .communities
            .values()
            .filter(|c| c.is_active())
            .filter(|c| filter.category_id.is_none_or(|id| c.row.category_id == Some(id)))
            .filter(|c| match &filter.search {
                Some(q) => contains_ci(&c.row.name, q) || contains_ci(&c.row.title, q),
                None => true,
            })
            .collect();
        rows.sort_by_key(|c| Reverse((c.row.created_at, c.row.id)));
        let all = rows.into_iter().map(|c| state.community_view(c)).collect();
        Ok(Page::from_all(all, page))
    }

    async fn get_community(&self, id: Uuid) -> RepoResult<Option<Community>> {
        let state = self.state();
        Ok(state
            .communities
            .get(&id)
            .filter(|c| c.is_active())
            .map(|c| state.community_view(c)))
    }

    async fn get_community_by_name(&self, name: &str) -> RepoResult<Option<Community>> {
        let state = self.state();
        Ok(state
            .communities
            .values()
            .find(|c| c.is_active() && c.row.name == name)
            .map(|c| state.community_view(c)))
    }

    async fn create_community(&self, community: NewCommunity) -> RepoResult<Community> {
        let mut state = self.state();
        if state
            .communities
            .values()
            .any(|c| c.is_active() && c.row.name == community.name)
        {
            return Err(conflict("communities_name_key"));
        }
        let now = Utc::now();
        let created = Community {
            id: Uuid::new_v4(),
            name: community.name,
            title: community.title,
            description: community.description,
            category_id: community.category_id,
            owner_id: community.owner_id,
            logo_key: None,
            banner_key: None,
            member_count: 0,
            created_at: now,
            updated_at: now,
        };
        let stored = Stored::new(created.clone());
        state.communities.insert(created.id, stored);

        let membership = Membership {
            id: Uuid::new_v4(),
            community_id: created.id,
            member_id: created.owner_id,
            joined_at: now,
        };
        let stored = Stored::new(membership.clone());
        state.memberships.insert(membership.id, stored);

        Ok(Community {
            member_count: 1,
            ..created
        })
    }

    async fn update_community(
        &self,
        id: Uuid,
        req: UpdateCommunityRequest,
    ) -> RepoResult<Option<Community>> {
        let mut state = self.state();
        let Some(stored) = state.communities.get_mut(&id).filter(|c| c.is_active()) else {
            return Ok(None);
        };
        let row = &mut stored.row;
        if let Some(title) = req.title {
            row.title = title;
        }
        if let Some(description) = req.description {
            row.description = Some(description);
        }
        if let Some(category_id) = req.category_id {
            row.category_id = Some(category_id);
        }
        if let Some(logo_key) = req.logo_key {
            row.logo_key = Some(logo_key);
        }
        if let Some(banner_key) = req.banner_key {
            row.banner_key = Some(banner_key);
        }
        row.updated_at = Utc::now();
        let snapshot = stored.clone();
        Ok(Some(state.community_view(&snapshot)))
    }

    async fn delete_community(&self, id: Uuid) -> RepoResult<bool> {
        let mut state = self.state();
        match state.communities.get_mut(&id).filter(|c| c.is_active()) {
            Some(stored) => {
                stored.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- Memberships ---

    async fn get_membership(
        &self,
        community_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Option<Membership>> {
        let state = self.state();
        Ok(state
            .memberships
            .values()
            .find(|m| {
                m.row.community_id == community_id
                    && m.row.member_id == member_id
                    && state.membership_active(m)
            })
            .map(|m| m.row.clone()))
    }

    async fn create_membership(
        &self,
        community_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Membership> {
        let mut state = self.state();
        if state.memberships.values().any(|m| {
            m.is_active() && m.row.community_id == community_id && m.row.member_id == member_id
        }) {
            return Err(conflict("memberships_active_key"));
        }
        let membership = Membership {
            id: Uuid::new_v4(),
            community_id,
            member_id,
            joined_at: Utc::now(),
        };
        let stored = Stored::new(membership.clone());
        state.memberships.insert(membership.id, stored);
        Ok(membership)
    }

    async fn delete_membership(&self, community_id: Uuid, member_id: Uuid) -> RepoResult<bool> {
        let mut state = self.state();
        match state.memberships.values_mut().find(|m| {
            m.is_active() && m.row.community_id == community_id && m.row.member_id == member_id
        }) {
            Some(stored) => {
                stored.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_community_memberships(
        &self,
        community_id: Uuid,
        page: PageRequest,
    ) -> RepoResult<Page<Membership>> {
        let state = self.state();
        let mut rows: Vec<&Stored<Membership>> = state
            .memberships
            .values()
            .filter(|m| m.row.community_id == community_id && state.membership_active(m))
            .collect();
        rows.sort_by_key(|m| (m.row.joined_at, m.row.id));
        let all = rows.into_iter().map(|m| m.row.clone()).collect();
        Ok(Page::from_all(all, page))
    }

    async fn list_member_memberships(
        &self,
        member_id: Uuid,
        page: PageRequest,
    ) -> RepoResult<Page<Membership>> {
        let state = self.state();
        let mut rows: Vec<&Stored<Membership>> = state
            .memberships
            .values()
            .filter(|m| {
                m.row.member_id == member_id
                    && m.is_active()
                    && state.community_active(m.row.community_id)
            })
            .collect();
        rows.sort_by_key(|m| Reverse((m.row.joined_at, m.row.id)));
        let all = rows.into_iter().map(|m| m.row.clone()).collect();
        Ok(Page::from_all(all, page))
    }

    // --- Recent Communities ---

    async fn touch_recent_community(
        &self,
        member_id: Uuid,
        community_id: Uuid,
    ) -> RepoResult<RecentCommunity> {
        let mut state = self.state();
        let community = state
            .communities
            .get(&community_id)
            .filter(|c| c.is_active())
            .map(|c| c.row.clone())
            .ok_or_else(|| RepoError::Corrupt(format!("community {community_id} is not active")))?;
        let now = Utc::now();
        state.recent.insert((member_id, community_id), now);
        Ok(RecentCommunity {
            community_id,
            name: community.name,
            title: community.title,
            visited_at: now,
        })
    }

    async fn list_recent_communities(
        &self,
        member_id: Uuid,
        limit: i64,
    ) -> RepoResult<Vec<RecentCommunity>> {
        let state = self.state();
        let mut rows: Vec<RecentCommunity> = state
            .recent
            .iter()
            .filter(|((member, _), _)| *member == member_id)
            .filter_map(|((_, community_id), visited_at)| {
                state
                    .communities
                    .get(community_id)
                    .filter(|c| c.is_active())
                    .map(|c| RecentCommunity {
                        community_id: *community_id,
                        name: c.row.name.clone(),
                        title: c.row.title.clone(),
                        visited_at: *visited_at,
                    })
            })
            .collect();
        rows.sort_by_key(|r| Reverse((r.visited_at, r.community_id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn delete_recent_community(
        &self,
        member_id: Uuid,
        community_id: Uuid,
    ) -> RepoResult<bool> {
        Ok(self
            .state()
            .recent
            .remove(&(member_id, community_id))
            .is_some())
    }

    // --- Posts ---

    async fn list_posts(&self, filter: PostFilter, page: PageRequest) -> RepoResult<Page<Post>> {
        let state = self.state();
        let mut rows: Vec<Post> = state
            .posts
            .values()
            .filter(|p| state.post_active(p.row.id))
            .filter(|p| filter.community_id.is_none_or(|id| p.row.community_id == id))
            .filter(|p| filter.author_id.is_none_or(|id| p.row.author_id == id))
            .filter(|p| match &filter.search {
                Some(q) => contains_ci(&p.row.title, q) || contains_ci(&p.row.body, q),
                None => true,
            })
            .map(|p| state.post_view(p))
            .collect();
        match filter.sort {
            PostSort::New => rows.sort_by_key(|p| Reverse((p.created_at, p.id))),
            PostSort::Top => rows.sort_by_key(|p| Reverse((p.score, p.created_at, p.id))),
        }
        Ok(Page::from_all(rows, page))
    }

    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>> {
        let state = self.state();
        if !state.post_active(id) {
            return Ok(None);
        }
        Ok(state.posts.get(&id).map(|p| state.post_view(p)))
    }

    async fn create_post(&self, post: NewPost) -> RepoResult<Post> {
        let mut state = self.state();
        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4(),
            community_id: post.community_id,
            author_id: post.author_id,
            title: post.title,
            body: post.body,
            score: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        };
        let snapshot = Stored::new(PostSnapshot {
            id: Uuid::new_v4(),
            post_id: created.id,
            title: created.title.clone(),
            body: created.body.clone(),
            created_at: now,
        });
        state.snapshots.push(snapshot);
        let stored = Stored::new(created.clone());
        state.posts.insert(created.id, stored);
        Ok(created)
    }

    async fn update_post(
        &self,
        id: Uuid,
        title: Option<String>,
        body: Option<String>,
    ) -> RepoResult<Option<Post>> {
        let mut state = self.state();
        if !state.post_active(id) {
            return Ok(None);
        }
        let now = Utc::now();
        let Some(stored) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            stored.row.title = title;
        }
        if let Some(body) = body {
            stored.row.body = body;
        }
        stored.row.updated_at = now;
        let current = stored.clone();
        let snapshot = Stored::new(PostSnapshot {
            id: Uuid::new_v4(),
            post_id: id,
            title: current.row.title.clone(),
            body: current.row.body.clone(),
            created_at: now,
        });
        state.snapshots.push(snapshot);
        Ok(Some(state.post_view(&current)))
    }

    async fn delete_post(&self, id: Uuid) -> RepoResult<bool> {
        let mut state = self.state();
        if !state.post_active(id) {
            return Ok(false);
        }
        if let Some(stored) = state.posts.get_mut(&id) {
            stored.deleted_at = Some(Utc::now());
        }
        Ok(true)
    }

    async fn list_post_snapshots(&self, post_id: Uuid) -> RepoResult<Vec<PostSnapshot>> {
        let state = self.state();
        let mut rows: Vec<&Stored<PostSnapshot>> = state
            .snapshots
            .iter()
            .filter(|s| s.row.post_id == post_id)
            .collect();
        rows.sort_by_key(|s| (s.row.created_at, s.row.id));
        Ok(rows.into_iter().map(|s| s.row.clone()).collect())
    }

    // --- Comments ---

    async fn list_comments(&self, post_id: Uuid, page: PageRequest) -> RepoResult<Page<Comment>> {
        let state = self.state();
        let mut rows: Vec<&Stored<Comment>> = state
            .comments
            .values()
            .filter(|c| c.row.post_id == post_id && state.comment_active(c.row.id))
            .collect();
        rows.sort_by_key(|c| (c.row.created_at, c.row.id));
        let all = rows.into_iter().map(|c| state.comment_view(c)).collect();
        Ok(Page::from_all(all, page))
    }

    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        let state = self.state();
        if !state.comment_active(id) {
            return Ok(None);
        }
        Ok(state.comments.get(&id).map(|c| state.comment_view(c)))
    }

    async fn create_comment(&self, comment: NewComment) -> RepoResult<Comment> {
        let mut state = self.state();
        let now = Utc::now();
        let created = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            parent_id: comment.parent_id,
            body: comment.body,
            score: 0,
            created_at: now,
            updated_at: now,
        };
        let stored = Stored::new(created.clone());
        state.comments.insert(created.id, stored);
        Ok(created)
    }

    async fn update_comment(&self, id: Uuid, body: String) -> RepoResult<Option<Comment>> {
        let mut state = self.state();
        if !state.comment_active(id) {
            return Ok(None);
        }
        let Some(stored) = state.comments.get_mut(&id) else {
            return Ok(None);
        };
        stored.row.body = body;
        stored.row.updated_at = Utc::now();
        let current = stored.clone();
        Ok(Some(state.comment_view(&current)))
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool> {
        let mut state = self.state();
        if !state.comment_active(id) {
            return Ok(false);
        }
        if let Some(stored) = state.comments.get_mut(&id) {
            stored.deleted_at = Some(Utc::now());
        }
        Ok(true)
    }

    // --- Votes ---

    async fn cast_vote(
        &self,
        target: VoteTarget,
        target_id: Uuid,
        member_id: Uuid,
        value: i16,
    ) -> RepoResult<()> {
        let mut state = self.state();
        let votes = match target {
            VoteTarget::Post => &mut state.post_votes,
            VoteTarget::Comment => &mut state.comment_votes,
        };
        votes.insert((target_id, member_id), value);
        Ok(())
    }

    async fn remove_vote(
        &self,
        target: VoteTarget,
        target_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<bool> {
        let mut state = self.state();
        let votes = match target {
            VoteTarget::Post => &mut state.post_votes,
            VoteTarget::Comment => &mut state.comment_votes,
        };
        Ok(votes.remove(&(target_id, member_id)).is_some())
    }

    async fn vote_score(&self, target: VoteTarget, target_id: Uuid) -> RepoResult<i64> {
        Ok(self.state().score(target, target_id))
    }

    // --- Reports ---

    async fn create_report(&self, report: NewReport) -> RepoResult<Report> {
        let mut state = self.state();
        let duplicate = state.reports.values().any(|r| {
            r.row.status == ReportStatus::Pending
                && r.row.reporter_id == report.reporter_id
                && r.row.target_type == report.target_type
                && r.row.target_id == report.target_id
        });
        if duplicate {
            return Err(conflict("reports_pending_key"));
        }
        let created = Report {
            id: Uuid::new_v4(),
            reporter_id: report.reporter_id,
            target_type: report.target_type,
            target_id: report.target_id,
            reason: report.reason,
            status: ReportStatus::Pending,
            resolution_note: None,
            resolved_by: None,
            created_at: Utc::now(),
            resolved_at: None,
        };
        let stored = Stored::new(created.clone());
        state.reports.insert(created.id, stored);
        Ok(created)
    }

    async fn find_pending_report(
        &self,
        reporter_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
    ) -> RepoResult<Option<Report>> {
        Ok(self
            .state()
            .reports
            .values()
            .find(|r| {
                r.row.status == ReportStatus::Pending
                    && r.row.reporter_id == reporter_id
                    && r.row.target_type == target_type
                    && r.row.target_id == target_id
            })
            .map(|r| r.row.clone()))
    }

    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        reporter_id: Option<Uuid>,
        page: PageRequest,
    ) -> RepoResult<Page<Report>> {
        let state = self.state();
        let mut rows: Vec<&Stored<Report>> = state
            .reports
            .values()
            .filter(|r| status.is_none_or(|s| r.row.status == s))
            .filter(|r| reporter_id.is_none_or(|id| r.row.reporter_id == id))
            .collect();
        rows.sort_by_key(|r| Reverse((r.row.created_at, r.row.id)));
        let all = rows.into_iter().map(|r| r.row.clone()).collect();
        Ok(Page::from_all(all, page))
    }

    async fn get_report(&self, id: Uuid) -> RepoResult<Option<Report>> {
        Ok(self.state().reports.get(&id).map(|r| r.row.clone()))
    }

    async fn resolve_report(
        &self,
        id: Uuid,
        status: ReportStatus,
        admin_id: Uuid,
        note: Option<String>,
        remove_content: bool,
    ) -> RepoResult<Option<ReportResolution>> {
        let mut state = self.state();
        let Some(report) = state
            .reports
            .get(&id)
            .filter(|r| r.row.status == ReportStatus::Pending)
            .map(|r| r.row.clone())
        else {
            return Ok(None);
        };

        let now = Utc::now();
        let content_removed =
            remove_content && state.remove_target(report.target_type, report.target_id, now);

        let Some(stored) = state.reports.get_mut(&id) else {
            return Ok(None);
        };
        stored.row.status = status;
        stored.row.resolution_note = note;
        stored.row.resolved_by = Some(admin_id);
        stored.row.resolved_at = Some(now);
        Ok(Some(ReportResolution {
            report: stored.row.clone(),
            content_removed,
        }))
    }

    // --- Banned Words ---

    async fn list_banned_words(&self) -> RepoResult<Vec<BannedWord>> {
        let mut words: Vec<BannedWord> = self
            .state()
            .banned_words
            .values()
            .filter(|w| w.is_active())
            .map(|w| w.row.clone())
            .collect();
        words.sort_by(|a, b| a.word.cmp(&b.word));
        Ok(words)
    }

    async fn get_banned_word_by_word(&self, word: &str) -> RepoResult<Option<BannedWord>> {
        Ok(self
            .state()
            .banned_words
            .values()
            .find(|w| w.is_active() && w.row.word == word)
            .map(|w| w.row.clone()))
    }

    async fn create_banned_word(&self, word: String) -> RepoResult<BannedWord> {
        let mut state = self.state();
        if state
            .banned_words
            .values()
            .any(|w| w.is_active() && w.row.word == word)
        {
            return Err(conflict("banned_words_word_key"));
        }
        let created = BannedWord {
            id: Uuid::new_v4(),
            word,
            created_at: Utc::now(),
        };
        let stored = Stored::new(created.clone());
        state.banned_words.insert(created.id, stored);
        Ok(created)
    }

    async fn delete_banned_word(&self, id: Uuid) -> RepoResult<bool> {
        let mut state = self.state();
        match state.banned_words.get_mut(&id).filter(|w| w.is_active()) {
            Some(stored) => {
                stored.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- Configurations ---

    async fn list_configurations(&self, page: PageRequest) -> RepoResult<Page<Configuration>> {
        let mut rows: Vec<Configuration> = self
            .state()
            .configurations
            .values()
            .filter(|c| c.is_active())
            .map(|c| c.row.clone())
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(Page::from_all(rows, page))
    }

    async fn get_configuration(&self, id: Uuid) -> RepoResult<Option<Configuration>> {
        Ok(self
            .state()
            .configurations
            .get(&id)
            .filter(|c| c.is_active())
            .map(|c| c.row.clone()))
    }

    async fn get_configuration_by_key(&self, key: &str) -> RepoResult<Option<Configuration>> {
        Ok(self
            .state()
            .configurations
            .values()
            .find(|c| c.is_active() && c.row.key == key)
            .map(|c| c.row.clone()))
    }

    async fn create_configuration(
        &self,
        req: CreateConfigurationRequest,
    ) -> RepoResult<Configuration> {
        let mut state = self.state();
        if state
            .configurations
            .values()
            .any(|c| c.is_active() && c.row.key == req.key)
        {
            return Err(conflict("configurations_key_key"));
        }
        let now = Utc::now();
        let created = Configuration {
            id: Uuid::new_v4(),
            key: req.key,
            value: req.value,
            description: req.description,
            created_at: now,
            updated_at: now,
        };
        let stored = Stored::new(created.clone());
        state.configurations.insert(created.id, stored);
        Ok(created)
    }

    async fn update_configuration(
        &self,
        id: Uuid,
        req: UpdateConfigurationRequest,
    ) -> RepoResult<Option<Configuration>> {
        let mut state = self.state();
        let Some(stored) = state.configurations.get_mut(&id).filter(|c| c.is_active()) else {
            return Ok(None);
        };
        if let Some(value) = req.value {
            stored.row.value = value;
        }
        if let Some(description) = req.description {
            stored.row.description = Some(description);
        }
        stored.row.updated_at = Utc::now();
        Ok(Some(stored.row.clone()))
    }

    async fn delete_configuration(&self, id: Uuid) -> RepoResult<bool> {
        let mut state = self.state();
        match state.configurations.get_mut(&id).filter(|c| c.is_active()) {
            Some(stored) => {
                stored.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- Integrations ---

    async fn list_integrations(&self, page: PageRequest) -> RepoResult<Page<Integration>> {
        let mut rows: Vec<Integration> = self
            .state()
            .integrations
            .values()
            .filter(|i| i.is_active())
            .map(|i| i.row.clone())
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Page::from_all(rows, page))
    }

    async fn get_integration(&self, id: Uuid) -> RepoResult<Option<Integration>> {
        Ok(self
            .state()
            .integrations
            .get(&id)
            .filter(|i| i.is_active())
            .map(|i| i.row.clone()))
    }

    async fn get_integration_by_name(&self, name: &str) -> RepoResult<Option<Integration>> {
        Ok(self
            .state()
            .integrations
            .values()
            .find(|i| i.is_active() && i.row.name == name)
            .map(|i| i.row.clone()))
    }

    async fn create_integration(&self, integration: NewIntegration) -> RepoResult<Integration> {
        let mut state = self.state();
        if state
            .integrations
            .values()
            .any(|i| i.is_active() && i.row.name == integration.name)
        {
            return Err(conflict("integrations_name_key"));
        }
        let now = Utc::now();
        let created = Integration {
            id: Uuid::new_v4(),
            name: integration.name,
            kind: integration.kind,
            endpoint_url: integration.endpoint_url,
            enabled: integration.enabled,
            created_at: now,
            updated_at: now,
        };
        let stored = Stored::new(created.clone());
        state.integrations.insert(created.id, stored);
        Ok(created)
    }

    async fn update_integration(
        &self,
        id: Uuid,
        req: UpdateIntegrationRequest,
    ) -> RepoResult<Option<Integration>> {
        let mut state = self.state();
        if let Some(name) = &req.name {
            if state
                .integrations
                .values()
                .any(|i| i.is_active() && i.row.id != id && &i.row.name == name)
            {
                return Err(conflict("integrations_name_key"));
            }
        }
        let Some(stored) = state.integrations.get_mut(&id).filter(|i| i.is_active()) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            stored.row.name = name;
        }
        if let Some(url) = req.endpoint_url {
            stored.row.endpoint_url = url;
        }
        if let Some(enabled) = req.enabled {
            stored.row.enabled = enabled;
        }
        stored.row.updated_at = Utc::now();
        Ok(Some(stored.row.clone()))
    }

    async fn delete_integration(&self, id: Uuid) -> RepoResult<bool> {
        let mut state = self.state();
        match state.integrations.get_mut(&id).filter(|i| i.is_active()) {
            Some(stored) => {
                stored.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- Dashboard ---

    async fn get_stats(&self) -> RepoResult<AdminDashboardStats> {
        let state = self.state();
        Ok(AdminDashboardStats {
            total_members: state.members.values().filter(|m| m.is_active()).count() as i64,
            total_communities: state.communities.values().filter(|c| c.is_active()).count()
                as i64,
            total_posts: state
                .posts
                .keys()
                .filter(|id| state.post_active(**id))
                .count() as i64,
            total_comments: state
                .comments
                .keys()
                .filter(|id| state.comment_active(**id))
                .count() as i64,
            total_votes: (state.post_votes.len() + state.comment_votes.len()) as i64,
            pending_reports: state
                .reports
                .values()
                .filter(|r| r.row.status == ReportStatus::Pending)
                .count() as i64,
        })
    }
}
