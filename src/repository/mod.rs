use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RepoError;
use crate::models::{
    Admin, AdminAccount, AdminDashboardStats, BannedWord, Category, Comment, Community,
    CommunityFilter, Configuration, CreateCategoryRequest, CreateConfigurationRequest, Guest,
    Integration, Member, MemberAccount, Membership, NewAdmin, NewComment, NewCommunity,
    NewIntegration, NewMember, NewPost, NewReport, NewSession, Page, PageRequest, Post,
    PostFilter, PostSnapshot, RecentCommunity, Report, ReportStatus, ReportTarget, Session,
    UpdateCategoryRequest, UpdateCommunityRequest, UpdateConfigurationRequest,
    UpdateIntegrationRequest, VoteTarget,
};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Outcome of closing a report. `content_removed` is `false` when removal was not
/// requested or the target was already gone.
#[derive(Debug, Clone)]
pub struct ReportResolution {
    pub report: Report,
    pub content_removed: bool,
}

/// Repository Trait
///
/// The persistence contract used by handlers and extractors. Every read excludes
/// soft-deleted rows (and rows whose parent community/post is soft-deleted); every
/// `delete_*` is a soft delete returning `false` when no active row matched.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Actors ---
    async fn create_guest(&self) -> RepoResult<Guest>;
    async fn get_guest(&self, id: Uuid) -> RepoResult<Option<Guest>>;

    async fn create_member(&self, member: NewMember) -> RepoResult<Member>;
    async fn get_member(&self, id: Uuid) -> RepoResult<Option<Member>>;
    async fn get_member_account_by_email(&self, email: &str) -> RepoResult<Option<MemberAccount>>;
    async fn get_member_by_username(&self, username: &str) -> RepoResult<Option<Member>>;
    async fn list_members(&self, search: Option<String>, page: PageRequest)
    -> RepoResult<Page<Member>>;
    async fn update_member_profile(
        &self,
        id: Uuid,
        display_name: Option<String>,
    ) -> RepoResult<Option<Member>>;
    async fn delete_member(&self, id: Uuid) -> RepoResult<bool>;

    async fn create_admin(&self, admin: NewAdmin) -> RepoResult<Admin>;
    async fn get_admin(&self, id: Uuid) -> RepoResult<Option<Admin>>;
    async fn get_admin_account_by_email(&self, email: &str) -> RepoResult<Option<AdminAccount>>;
    async fn count_admins(&self) -> RepoResult<i64>;

    // --- Sessions ---
    async fn create_session(&self, session: NewSession) -> RepoResult<Session>;
    async fn get_session(&self, id: Uuid) -> RepoResult<Option<Session>>;
    /// Swaps `refresh_jti` only while it still equals `current_jti` and the session is
    /// unrevoked; returns `None` otherwise.
    async fn rotate_session(
        &self,
        id: Uuid,
        current_jti: Uuid,
        next_jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<Option<Session>>;
    /// Active (unrevoked, unexpired) sessions of one actor, newest first.
    async fn list_sessions(&self, actor_id: Uuid) -> RepoResult<Vec<Session>>;
    async fn revoke_session(&self, id: Uuid, actor_id: Uuid) -> RepoResult<bool>;
    async fn revoke_actor_sessions(&self, actor_id: Uuid) -> RepoResult<u64>;

    // --- Categories ---
    async fn list_categories(&self, page: PageRequest) -> RepoResult<Page<Category>>;
    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>>;
    async fn get_category_by_name(&self, name: &str) -> RepoResult<Option<Category>>;
    async fn create_category(&self, req: CreateCategoryRequest) -> RepoResult<Category>;
    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> RepoResult<Option<Category>>;
    async fn delete_category(&self, id: Uuid) -> RepoResult<bool>;
    async fn count_communities_in_category(&self, id: Uuid) -> RepoResult<i64>;

    // --- Communities ---
    async fn list_communities(
        &self,
        filter: CommunityFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Community>>;
    async fn get_community(&self, id: Uuid) -> RepoResult<Option<Community>>;
    async fn get_community_by_name(&self, name: &str) -> RepoResult<Option<Community>>;
    /// Inserts the community and the owner's membership atomically.
    async fn create_community(&self, community: NewCommunity) -> RepoResult<Community>;
    async fn update_community(
        &self,
        id: Uuid,
        req: UpdateCommunityRequest,
    ) -> RepoResult<Option<Community>>;
    async fn delete_community(&self, id: Uuid) -> RepoResult<bool>;

    // --- Memberships ---
    async fn get_membership(
        &self,
        community_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Option<Membership>>;
    async fn create_membership(&self, community_id: Uuid, member_id: Uuid)
    -> RepoResult<Membership>;
    async fn delete_membership(&self, community_id: Uuid, member_id: Uuid) -> RepoResult<bool>;
    async fn list_community_memberships(
        &self,
        community_id: Uuid,
        page: PageRequest,
    ) -> RepoResult<Page<Membership>>;
    async fn list_member_memberships(
        &self,
        member_id: Uuid,
        page: PageRequest,
    ) -> RepoResult<Page<Membership>>;

    // --- Recent Communities ---
    async fn touch_recent_community(
        &self,
        member_id: Uuid,
        community_id: Uuid,
    ) -> RepoResult<RecentCommunity>;
    async fn list_recent_communities(
        &self,
        member_id: Uuid,
        limit: i64,
    ) -> RepoResult<Vec<RecentCommunity>>;
    async fn delete_recent_community(&self, member_id: Uuid, community_id: Uuid)
    -> RepoResult<bool>;

    // --- Posts ---
    async fn list_posts(&self, filter: PostFilter, page: PageRequest) -> RepoResult<Page<Post>>;
    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>>;
    /// Inserts the post and its first snapshot atomically.
    async fn create_post(&self, post: NewPost) -> RepoResult<Post>;
    /// Applies the edit and records a snapshot of the new version atomically.
    async fn update_post(
        &self,
        id: Uuid,
        title: Option<String>,
        body: Option<String>,
    ) -> RepoResult<Option<Post>>;
    async fn delete_post(&self, id: Uuid) -> RepoResult<bool>;
    async fn list_post_snapshots(&self, post_id: Uuid) -> RepoResult<Vec<PostSnapshot>>;

    // --- Comments ---
    async fn list_comments(&self, post_id: Uuid, page: PageRequest) -> RepoResult<Page<Comment>>;
    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>>;
    async fn create_comment(&self, comment: NewComment) -> RepoResult<Comment>;
    async fn update_comment(&self, id: Uuid, body: String) -> RepoResult<Option<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool>;

    // --- Votes ---
    /// Inserts or replaces the member's vote.
    async fn cast_vote(
        &self,
        target: VoteTarget,
        target_id: Uuid,
        member_id: Uuid,
        value: i16,
    ) -> RepoResult<()>;
    async fn remove_vote(
        &self,
        target: VoteTarget,
        target_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<bool>;
    async fn vote_score(&self, target: VoteTarget, target_id: Uuid) -> RepoResult<i64>;

    // --- Reports ---
    async fn create_report(&self, report: NewReport) -> RepoResult<Report>;
    async fn find_pending_report(
        &self,
        reporter_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
    ) -> RepoResult<Option<Report>>;
    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        reporter_id: Option<Uuid>,
        page: PageRequest,
    ) -> RepoResult<Page<Report>>;
    async fn get_report(&self, id: Uuid) -> RepoResult<Option<Report>>;
    /// Moves a `pending` report to its final status; `None` when it is not pending.
    /// With `remove_content` the reported post or comment is soft-deleted in the same
    /// write, so either both changes land or neither does.
    async fn resolve_report(
        &self,
        id: Uuid,
        status: ReportStatus,
        admin_id: Uuid,
        note: Option<String>,
        remove_content: bool,
    ) -> RepoResult<Option<ReportResolution>>;

    // --- Banned Words ---
    async fn list_banned_words(&self) -> RepoResult<Vec<BannedWord>>;
    async fn get_banned_word_by_word(&self, word: &str) -> RepoResult<Option<BannedWord>>;
    async fn create_banned_word(&self, word: String) -> RepoResult<BannedWord>;
    async fn delete_banned_word(&self, id: Uuid) -> RepoResult<bool>;

    // --- Configurations ---
    async fn list_configurations(&self, page: PageRequest) -> RepoResult<Page<Configuration>>;
    async fn get_configuration(&self, id: Uuid) -> RepoResult<Option<Configuration>>;
    async fn get_configuration_by_key(&self, key: &str) -> RepoResult<Option<Configuration>>;
    async fn create_configuration(
        &self,
        req: CreateConfigurationRequest,
    ) -> RepoResult<Configuration>;
    async fn update_configuration(
        &self,
        id: Uuid,
        req: UpdateConfigurationRequest,
    ) -> RepoResult<Option<Configuration>>;
    async fn delete_configuration(&self, id: Uuid) -> RepoResult<bool>;

    // --- Integrations ---
    async fn list_integrations(&self, page: PageRequest) -> RepoResult<Page<Integration>>;
    async fn get_integration(&self, id: Uuid) -> RepoResult<Option<Integration>>;
    async fn get_integration_by_name(&self, name: &str) -> RepoResult<Option<Integration>>;
    async fn create_integration(&self, integration: NewIntegration) -> RepoResult<Integration>;
    async fn update_integration(
        &self,
        id: Uuid,
        req: UpdateIntegrationRequest,
    ) -> RepoResult<Option<Integration>>;
    async fn delete_integration(&self, id: Uuid) -> RepoResult<bool>;

    // --- Dashboard ---
    async fn get_stats(&self) -> RepoResult<AdminDashboardStats>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
