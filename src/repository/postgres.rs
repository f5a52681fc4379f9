use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, postgres::PgRow, query_builder::QueryBuilder};
use uuid::Uuid;

use super::{RepoResult, ReportResolution, Repository};
use crate::models::{
    Admin, AdminAccount, AdminDashboardStats, BannedWord, Category, Comment, Community,
    CommunityFilter, Configuration, CreateCategoryRequest, CreateConfigurationRequest, Guest,
    Integration, Member, MemberAccount, Membership, NewAdmin, NewComment, NewCommunity,
    NewIntegration, NewMember, NewPost, NewReport, NewSession, Page, PageRequest, Post,
    PostFilter, PostSnapshot, PostSort, RecentCommunity, Report, ReportStatus, ReportTarget,
    Session, UpdateCategoryRequest, UpdateCommunityRequest, UpdateConfigurationRequest,
    UpdateIntegrationRequest, VoteTarget,
};

const MEMBER_COLUMNS: &str = "id, email, username, display_name, created_at, updated_at";
const ADMIN_COLUMNS: &str = "id, email, display_name, created_at, updated_at";
const SESSION_COLUMNS: &str = "id, actor_role, actor_id, user_agent, created_at, \
     last_refreshed_at, expires_at, revoked_at, refresh_jti";
const CATEGORY_COLUMNS: &str = "id, name, description, display_order, created_at, updated_at";
const REPORT_COLUMNS: &str = "id, reporter_id, target_type, target_id, reason, status, \
     resolution_note, resolved_by, created_at, resolved_at";
const CONFIGURATION_COLUMNS: &str = "id, key, value, description, created_at, updated_at";
const INTEGRATION_COLUMNS: &str = "id, name, kind, endpoint_url, enabled, created_at, updated_at";

// Active communities with their live member count.
const COMMUNITY_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.title, c.description, c.category_id, c.owner_id,
        c.logo_key, c.banner_key,
        (SELECT COUNT(*) FROM memberships m
            JOIN members mb ON mb.id = m.member_id AND mb.deleted_at IS NULL
            WHERE m.community_id = c.id AND m.deleted_at IS NULL) AS member_count,
        c.created_at, c.updated_at
    FROM communities c
    WHERE c.deleted_at IS NULL
"#;

// Active posts of active communities, with score and active comment count.
const POST_SELECT: &str = r#"
    SELECT
        p.id, p.community_id, p.author_id, p.title, p.body,
        COALESCE((SELECT SUM(v.value) FROM post_votes v WHERE v.post_id = p.id), 0)::BIGINT AS score,
        (SELECT COUNT(*) FROM comments cm
            WHERE cm.post_id = p.id AND cm.deleted_at IS NULL) AS comment_count,
        p.created_at, p.updated_at
    FROM posts p
    JOIN communities c ON c.id = p.community_id AND c.deleted_at IS NULL
    WHERE p.deleted_at IS NULL
"#;

// Active comments whose post and community are active too.
const COMMENT_SELECT: &str = r#"
    SELECT
        cm.id, cm.post_id, cm.author_id, cm.parent_id, cm.body,
        COALESCE((SELECT SUM(v.value) FROM comment_votes v WHERE v.comment_id = cm.id), 0)::BIGINT AS score,
        cm.created_at, cm.updated_at
    FROM comments cm
    JOIN posts p ON p.id = cm.post_id AND p.deleted_at IS NULL
    JOIN communities c ON c.id = p.community_id AND c.deleted_at IS NULL
    WHERE cm.deleted_at IS NULL
"#;

const DELETE_POST_SQL: &str = r#"
    UPDATE posts p SET deleted_at = now()
    FROM communities c
    WHERE p.id = $1 AND p.deleted_at IS NULL
      AND c.id = p.community_id AND c.deleted_at IS NULL
"#;

const DELETE_COMMENT_SQL: &str = r#"
    UPDATE comments cm SET deleted_at = now()
    WHERE cm.id = $1 AND cm.deleted_at IS NULL
      AND EXISTS (
        SELECT 1 FROM posts p
        JOIN communities c ON c.id = p.community_id AND c.deleted_at IS NULL
        WHERE p.id = cm.post_id AND p.deleted_at IS NULL
      )
"#;

/// Escapes LIKE metacharacters and wraps the term for a substring match.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn vote_table(target: VoteTarget) -> (&'static str, &'static str) {
    match target {
        VoteTarget::Post => ("post_votes", "post_id"),
        VoteTarget::Comment => ("comment_votes", "comment_id"),
    }
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// All SQL is checked at runtime (`query_as::<_, T>` / `QueryBuilder`), so building
/// the crate never needs a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// fetch_page
    ///
    /// Runs `base` twice: once wrapped in `COUNT(*)` for the pagination totals and once
    /// ordered and sliced with `LIMIT/OFFSET`. `filters` appends `AND ...` clauses with
    /// bound parameters to both.
    async fn fetch_page<T, F>(
        &self,
        base: &str,
        filters: F,
        order_by: &str,
        page: PageRequest,
    ) -> RepoResult<Page<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        F: Fn(&mut QueryBuilder<'_, Postgres>),
    {
        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM ({base}"));
        filters(&mut count);
        count.push(") AS filtered");
        let records: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        if page.is_past_end(records) {
            return Ok(Page::new(Vec::new(), records, page));
        }

        let mut rows: QueryBuilder<Postgres> = QueryBuilder::new(base);
        filters(&mut rows);
        rows.push(" ORDER BY ");
        rows.push(order_by);
        rows.push(" LIMIT ");
        rows.push_bind(page.limit);
        rows.push(" OFFSET ");
        rows.push_bind(page.offset());
        let data = rows.build_query_as::<T>().fetch_all(&self.pool).await?;

        Ok(Page::new(data, records, page))
    }

    /// Soft-deletes one active row of `table`.
    async fn soft_delete(&self, table: &'static str, id: Uuid) -> RepoResult<bool> {
        let sql = format!(
            "UPDATE {table} SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL"
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- Actors ---

    async fn create_guest(&self) -> RepoResult<Guest> {
        Ok(
            sqlx::query_as::<_, Guest>("INSERT INTO guests DEFAULT VALUES RETURNING id, created_at")
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn get_guest(&self, id: Uuid) -> RepoResult<Option<Guest>> {
        Ok(
            sqlx::query_as::<_, Guest>("SELECT id, created_at FROM guests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_member(&self, member: NewMember) -> RepoResult<Member> {
        let sql = format!(
            "INSERT INTO members (email, username, display_name, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING {MEMBER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(member.email)
            .bind(member.username)
            .bind(member.display_name)
            .bind(member.password_hash)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_member(&self, id: Uuid) -> RepoResult<Option<Member>> {
        let sql =
            format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_member_account_by_email(&self, email: &str) -> RepoResult<Option<MemberAccount>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS}, password_hash FROM members \
             WHERE email = $1 AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, MemberAccount>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_member_by_username(&self, username: &str) -> RepoResult<Option<Member>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE username = $1 AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_members(
        &self,
        search: Option<String>,
        page: PageRequest,
    ) -> RepoResult<Page<Member>> {
        let base = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE deleted_at IS NULL");
        let pattern = search.as_deref().map(like_pattern);
        self.fetch_page(
            &base,
            |b| {
                if let Some(pattern) = &pattern {
                    b.push(" AND (email ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" OR username ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" OR display_name ILIKE ")
                        .push_bind(pattern.clone())
                        .push(")");
                }
            },
            "created_at DESC, id DESC",
            page,
        )
        .await
    }

    async fn update_member_profile(
        &self,
        id: Uuid,
        display_name: Option<String>,
    ) -> RepoResult<Option<Member>> {
        let sql = format!(
            "UPDATE members SET display_name = $2, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {MEMBER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Member>(&sql)
            .bind(id)
            .bind(display_name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_member(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query(
            "UPDATE members SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if deleted == 0 {
            return Ok(false);
        }
        sqlx::query(
            "UPDATE memberships SET deleted_at = now() WHERE member_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn create_admin(&self, admin: NewAdmin) -> RepoResult<Admin> {
        let sql = format!(
            "INSERT INTO admins (email, display_name, password_hash) \
             VALUES ($1, $2, $3) RETURNING {ADMIN_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Admin>(&sql)
            .bind(admin.email)
            .bind(admin.display_name)
            .bind(admin.password_hash)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_admin(&self, id: Uuid) -> RepoResult<Option<Admin>> {
        let sql =
            format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_admin_account_by_email(&self, email: &str) -> RepoResult<Option<AdminAccount>> {
        let sql = format!(
            "SELECT {ADMIN_COLUMNS}, password_hash FROM admins \
             WHERE email = $1 AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, AdminAccount>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count_admins(&self) -> RepoResult<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?,
        )
    }

    // --- Sessions ---

    async fn create_session(&self, session: NewSession) -> RepoResult<Session> {
        let sql = format!(
            "INSERT INTO sessions (id, actor_role, actor_id, refresh_jti, user_agent, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SESSION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Session>(&sql)
            .bind(session.id)
            .bind(session.actor_role)
            .bind(session.actor_id)
            .bind(session.refresh_jti)
            .bind(session.user_agent)
            .bind(session.expires_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_session(&self, id: Uuid) -> RepoResult<Option<Session>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1");
        Ok(sqlx::query_as::<_, Session>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// rotate_session
    ///
    /// Compare-and-swap on `refresh_jti`: two concurrent refreshes with the same token
    /// cannot both succeed.
    async fn rotate_session(
        &self,
        id: Uuid,
        current_jti: Uuid,
        next_jti: Uuid,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<Option<Session>> {
        let sql = format!(
            "UPDATE sessions SET refresh_jti = $3, expires_at = $4, last_refreshed_at = now() \
             WHERE id = $1 AND refresh_jti = $2 AND revoked_at IS NULL \
             RETURNING {SESSION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Session>(&sql)
            .bind(id)
            .bind(current_jti)
            .bind(next_jti)
            .bind(expires_at)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_sessions(&self, actor_id: Uuid) -> RepoResult<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE actor_id = $1 AND revoked_at IS NULL AND expires_at > now() \
             ORDER BY created_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, Session>(&sql)
            .bind(actor_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn revoke_session(&self, id: Uuid, actor_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = now() \
             WHERE id = $1 AND actor_id = $2 AND revoked_at IS NULL AND expires_at > now()",
        )
        .bind(id)
        .bind(actor_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_actor_sessions(&self, actor_id: Uuid) -> RepoResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = now() WHERE actor_id = $1 AND revoked_at IS NULL",
        )
        .bind(actor_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // --- Categories ---

    async fn list_categories(&self, page: PageRequest) -> RepoResult<Page<Category>> {
        let base = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE deleted_at IS NULL");
        self.fetch_page(&base, |_| {}, "display_order ASC, name ASC", page)
            .await
    }

    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_category_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = $1 AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> RepoResult<Category> {
        let sql = format!(
            "INSERT INTO categories (name, description, display_order) \
             VALUES ($1, $2, $3) RETURNING {CATEGORY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(req.name)
            .bind(req.description)
            .bind(req.display_order.unwrap_or(0))
            .fetch_one(&self.pool)
            .await?)
    }

    /// Partial update: `COALESCE` keeps the stored value for every absent field.
    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> RepoResult<Option<Category>> {
        let sql = format!(
            "UPDATE categories SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                display_order = COALESCE($4, display_order), \
                updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {CATEGORY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(req.name)
            .bind(req.description)
            .bind(req.display_order)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<bool> {
        self.soft_delete("categories", id).await
    }

    async fn count_communities_in_category(&self, id: Uuid) -> RepoResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM communities WHERE category_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?)
    }

    // --- Communities ---

    async fn list_communities(
        &self,
        filter: CommunityFilter,
        page: PageRequest,
    ) -> RepoResult<Page<Community>> {
        let pattern = filter.search.as_deref().map(like_pattern);
        self.fetch_page(
            COMMUNITY_SELECT,
            |b| {
                if let Some(category_id) = filter.category_id {
                    b.push(" AND c.category_id = ").push_bind(category_id);
                }
                if let Some(pattern) = &pattern {
                    b.push(" AND (c.name ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" OR c.title ILIKE ")
                        .push_bind(pattern.clone())
                        .push(")");
                }
            },
            "created_at DESC, id DESC",
            page,
        )
        .await
    }

    async fn get_community(&self, id: Uuid) -> RepoResult<Option<Community>> {
        let sql = format!("{COMMUNITY_SELECT} AND c.id = $1");
        Ok(sqlx::query_as::<_, Community>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_community_by_name(&self, name: &str) -> RepoResult<Option<Community>> {
        let sql = format!("{COMMUNITY_SELECT} AND c.name = $1");
        Ok(sqlx::query_as::<_, Community>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_community(&self, community: NewCommunity) -> RepoResult<Community> {
        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, Community>(
            r#"
            INSERT INTO communities (name, title, description, category_id, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, title, description, category_id, owner_id, logo_key, banner_key,
                1::BIGINT AS member_count, created_at, updated_at
            "#,
        )
        .bind(community.name)
        .bind(community.title)
        .bind(community.description)
        .bind(community.category_id)
        .bind(community.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO memberships (community_id, member_id) VALUES ($1, $2)")
            .bind(created.id)
            .bind(created.owner_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update_community(
        &self,
        id: Uuid,
        req: UpdateCommunityRequest,
    ) -> RepoResult<Option<Community>> {
        let updated = sqlx::query(
            r#"
            UPDATE communities SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category_id = COALESCE($4, category_id),
                logo_key = COALESCE($5, logo_key),
                banner_key = COALESCE($6, banner_key),
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.category_id)
        .bind(req.logo_key)
        .bind(req.banner_key)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_community(id).await
    }

    async fn delete_community(&self, id: Uuid) -> RepoResult<bool> {
        self.soft_delete("communities", id).await
    }

    // --- Memberships ---

    async fn get_membership(
        &self,
        community_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Option<Membership>> {
        Ok(sqlx::query_as::<_, Membership>(
            r#"
            SELECT m.id, m.community_id, m.member_id, m.joined_at
            FROM memberships m
            JOIN members mb ON mb.id = m.member_id AND mb.deleted_at IS NULL
            WHERE m.community_id = $1 AND m.member_id = $2 AND m.deleted_at IS NULL
            "#,
        )
        .bind(community_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_membership(
        &self,
        community_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<Membership> {
        Ok(sqlx::query_as::<_, Membership>(
            "INSERT INTO memberships (community_id, member_id) VALUES ($1, $2) \
             RETURNING id, community_id, member_id, joined_at",
        )
        .bind(community_id)
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_membership(&self, community_id: Uuid, member_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE memberships SET deleted_at = now() \
             WHERE community_id = $1 AND member_id = $2 AND deleted_at IS NULL",
        )
        .bind(community_id)
        .bind(member_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_community_memberships(
        &self,
        community_id: Uuid,
        page: PageRequest,
    ) -> RepoResult<Page<Membership>> {
        self.fetch_page(
            r#"
            SELECT m.id, m.community_id, m.member_id, m.joined_at
            FROM memberships m
            JOIN members mb ON mb.id = m.member_id AND mb.deleted_at IS NULL
            WHERE m.deleted_at IS NULL
            "#,
            |b| {
                b.push(" AND m.community_id = ").push_bind(community_id);
            },
            "joined_at ASC, id ASC",
            page,
        )
        .await
    }

    async fn list_member_memberships(
        &self,
        member_id: Uuid,
        page: PageRequest,
    ) -> RepoResult<Page<Membership>> {
        self.fetch_page(
            r#"
            SELECT m.id, m.community_id, m.member_id, m.joined_at
            FROM memberships m
            JOIN communities c ON c.id = m.community_id AND c.deleted_at IS NULL
            WHERE m.deleted_at IS NULL
            "#,
            |b| {
                b.push(" AND m.member_id = ").push_bind(member_id);
            },
            "joined_at DESC, id DESC",
            page,
        )
        .await
    }

    // --- Recent Communities ---

    async fn touch_recent_community(
        &self,
        member_id: Uuid,
        community_id: Uuid,
    ) -> RepoResult<RecentCommunity> {
        Ok(sqlx::query_as::<_, RecentCommunity>(
            r#"
            WITH visit AS (
                INSERT INTO recent_communities (member_id, community_id, visited_at)
                VALUES ($1, $2, now())
                ON CONFLICT (member_id, community_id) DO UPDATE SET visited_at = EXCLUDED.visited_at
                RETURNING community_id, visited_at
            )
            SELECT v.community_id, c.name, c.title, v.visited_at
            FROM visit v
            JOIN communities c ON c.id = v.community_id
            "#,
        )
        .bind(member_id)
        .bind(community_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_recent_communities(
        &self,
        member_id: Uuid,
        limit: i64,
    ) -> RepoResult<Vec<RecentCommunity>> {
        Ok(sqlx::query_as::<_, RecentCommunity>(
            r#"
            SELECT r.community_id, c.name, c.title, r.visited_at
            FROM recent_communities r
            JOIN communities c ON c.id = r.community_id AND c.deleted_at IS NULL
            WHERE r.member_id = $1
            ORDER BY r.visited_at DESC, r.community_id DESC
            LIMIT $2
            "#,
        )
        .bind(member_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_recent_community(
        &self,
        member_id: Uuid,
        community_id: Uuid,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            "DELETE FROM recent_communities WHERE member_id = $1 AND community_id = $2",
        )
        .bind(member_id)
        .bind(community_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Posts ---

    async fn list_posts(&self, filter: PostFilter, page: PageRequest) -> RepoResult<Page<Post>> {
        let pattern = filter.search.as_deref().map(like_pattern);
        let order_by = match filter.sort {
            PostSort::New => "created_at DESC, id DESC",
            PostSort::Top => "score DESC, created_at DESC, id DESC",
        };
        self.fetch_page(
            POST_SELECT,
            |b| {
                if let Some(community_id) = filter.community_id {
                    b.push(" AND p.community_id = ").push_bind(community_id);
                }
                if let Some(author_id) = filter.author_id {
                    b.push(" AND p.author_id = ").push_bind(author_id);
                }
                if let Some(pattern) = &pattern {
                    b.push(" AND (p.title ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" OR p.body ILIKE ")
                        .push_bind(pattern.clone())
                        .push(")");
                }
            },
            order_by,
            page,
        )
        .await
    }

    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>> {
        let sql = format!("{POST_SELECT} AND p.id = $1");
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_post(&self, post: NewPost) -> RepoResult<Post> {
        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (community_id, author_id, title, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, community_id, author_id, title, body,
                0::BIGINT AS score, 0::BIGINT AS comment_count, created_at, updated_at
            "#,
        )
        .bind(post.community_id)
        .bind(post.author_id)
        .bind(post.title)
        .bind(post.body)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO post_snapshots (post_id, title, body) VALUES ($1, $2, $3)")
            .bind(created.id)
            .bind(&created.title)
            .bind(&created.body)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update_post(
        &self,
        id: Uuid,
        title: Option<String>,
        body: Option<String>,
    ) -> RepoResult<Option<Post>> {
        let mut tx = self.pool.begin().await?;
        let edited: Option<(String, String)> = sqlx::query_as(
            r#"
            UPDATE posts p SET
                title = COALESCE($2, p.title),
                body = COALESCE($3, p.body),
                updated_at = now()
            FROM communities c
            WHERE p.id = $1 AND p.deleted_at IS NULL
              AND c.id = p.community_id AND c.deleted_at IS NULL
            RETURNING p.title, p.body
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(body)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((title, body)) = edited else {
            return Ok(None);
        };

        sqlx::query("INSERT INTO post_snapshots (post_id, title, body) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(title)
            .bind(body)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        self.get_post(id).await
    }

    async fn delete_post(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(DELETE_POST_SQL)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_post_snapshots(&self, post_id: Uuid) -> RepoResult<Vec<PostSnapshot>> {
        Ok(sqlx::query_as::<_, PostSnapshot>(
            "SELECT id, post_id, title, body, created_at FROM post_snapshots \
             WHERE post_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // --- Comments ---

    async fn list_comments(&self, post_id: Uuid, page: PageRequest) -> RepoResult<Page<Comment>> {
        self.fetch_page(
            COMMENT_SELECT,
            |b| {
                b.push(" AND cm.post_id = ").push_bind(post_id);
            },
            "created_at ASC, id ASC",
            page,
        )
        .await
    }

    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        let sql = format!("{COMMENT_SELECT} AND cm.id = $1");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_comment(&self, comment: NewComment) -> RepoResult<Comment> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, parent_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, author_id, parent_id, body, 0::BIGINT AS score,
                created_at, updated_at
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.parent_id)
        .bind(comment.body)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_comment(&self, id: Uuid, body: String) -> RepoResult<Option<Comment>> {
        let result = sqlx::query(
            r#"
            UPDATE comments cm SET body = $2, updated_at = now()
            WHERE cm.id = $1 AND cm.deleted_at IS NULL
              AND EXISTS (
                SELECT 1 FROM posts p
                JOIN communities c ON c.id = p.community_id AND c.deleted_at IS NULL
                WHERE p.id = cm.post_id AND p.deleted_at IS NULL
              )
            "#,
        )
        .bind(id)
        .bind(body)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_comment(id).await
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(DELETE_COMMENT_SQL)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Votes ---

    async fn cast_vote(
        &self,
        target: VoteTarget,
        target_id: Uuid,
        member_id: Uuid,
        value: i16,
    ) -> RepoResult<()> {
        let (table, column) = vote_table(target);
        let sql = format!(
            "INSERT INTO {table} ({column}, member_id, value) VALUES ($1, $2, $3) \
             ON CONFLICT ({column}, member_id) \
             DO UPDATE SET value = EXCLUDED.value, updated_at = now()"
        );
        sqlx::query(&sql)
            .bind(target_id)
            .bind(member_id)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_vote(
        &self,
        target: VoteTarget,
        target_id: Uuid,
        member_id: Uuid,
    ) -> RepoResult<bool> {
        let (table, column) = vote_table(target);
        let sql = format!("DELETE FROM {table} WHERE {column} = $1 AND member_id = $2");
        let result = sqlx::query(&sql)
            .bind(target_id)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn vote_score(&self, target: VoteTarget, target_id: Uuid) -> RepoResult<i64> {
        let (table, column) = vote_table(target);
        let sql = format!("SELECT COALESCE(SUM(value), 0)::BIGINT FROM {table} WHERE {column} = $1");
        Ok(sqlx::query_scalar::<_, i64>(&sql)
            .bind(target_id)
            .fetch_one(&self.pool)
            .await?)
    }

    // --- Reports ---

    async fn create_report(&self, report: NewReport) -> RepoResult<Report> {
        let sql = format!(
            "INSERT INTO reports (reporter_id, target_type, target_id, reason) \
             VALUES ($1, $2, $3, $4) RETURNING {REPORT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Report>(&sql)
            .bind(report.reporter_id)
            .bind(report.target_type)
            .bind(report.target_id)
            .bind(report.reason)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_pending_report(
        &self,
        reporter_id: Uuid,
        target_type: ReportTarget,
        target_id: Uuid,
    ) -> RepoResult<Option<Report>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports \
             WHERE reporter_id = $1 AND target_type = $2 AND target_id = $3 \
               AND status = 'pending'"
        );
        Ok(sqlx::query_as::<_, Report>(&sql)
            .bind(reporter_id)
            .bind(target_type)
            .bind(target_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        reporter_id: Option<Uuid>,
        page: PageRequest,
    ) -> RepoResult<Page<Report>> {
        let base = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE TRUE");
        self.fetch_page(
            &base,
            |b| {
                if let Some(status) = status {
                    b.push(" AND status = ").push_bind(status);
                }
                if let Some(reporter_id) = reporter_id {
                    b.push(" AND reporter_id = ").push_bind(reporter_id);
                }
            },
            "created_at DESC, id DESC",
            page,
        )
        .await
    }

    async fn get_report(&self, id: Uuid) -> RepoResult<Option<Report>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1");
        Ok(sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn resolve_report(
        &self,
        id: Uuid,
        status: ReportStatus,
        admin_id: Uuid,
        note: Option<String>,
        remove_content: bool,
    ) -> RepoResult<Option<ReportResolution>> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "UPDATE reports SET status = $2, resolved_by = $3, resolution_note = $4, \
                resolved_at = now() \
             WHERE id = $1 AND status = 'pending' RETURNING {REPORT_COLUMNS}"
        );
        let Some(report) = sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .bind(status)
            .bind(admin_id)
            .bind(note)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let mut content_removed = false;
        if remove_content {
            let delete_sql = match report.target_type {
                ReportTarget::Post => DELETE_POST_SQL,
                ReportTarget::Comment => DELETE_COMMENT_SQL,
            };
            let result = sqlx::query(delete_sql)
                .bind(report.target_id)
                .execute(&mut *tx)
                .await?;
            content_removed = result.rows_affected() > 0;
        }

        tx.commit().await?;
        Ok(Some(ReportResolution {
            report,
            content_removed,
        }))
    }

    // --- Banned Words ---

    async fn list_banned_words(&self) -> RepoResult<Vec<BannedWord>> {
        Ok(sqlx::query_as::<_, BannedWord>(
            "SELECT id, word, created_at FROM banned_words WHERE deleted_at IS NULL ORDER BY word",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_banned_word_by_word(&self, word: &str) -> RepoResult<Option<BannedWord>> {
        Ok(sqlx::query_as::<_, BannedWord>(
            "SELECT id, word, created_at FROM banned_words WHERE word = $1 AND deleted_at IS NULL",
        )
        .bind(word)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_banned_word(&self, word: String) -> RepoResult<BannedWord> {
        Ok(sqlx::query_as::<_, BannedWord>(
            "INSERT INTO banned_words (word) VALUES ($1) RETURNING id, word, created_at",
        )
        .bind(word)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_banned_word(&self, id: Uuid) -> RepoResult<bool> {
        self.soft_delete("banned_words", id).await
    }

    // --- Configurations ---

    async fn list_configurations(&self, page: PageRequest) -> RepoResult<Page<Configuration>> {
        let base =
            format!("SELECT {CONFIGURATION_COLUMNS} FROM configurations WHERE deleted_at IS NULL");
        self.fetch_page(&base, |_| {}, "key ASC", page).await
    }

    async fn get_configuration(&self, id: Uuid) -> RepoResult<Option<Configuration>> {
        let sql = format!(
            "SELECT {CONFIGURATION_COLUMNS} FROM configurations \
             WHERE id = $1 AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, Configuration>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_configuration_by_key(&self, key: &str) -> RepoResult<Option<Configuration>> {
        let sql = format!(
            "SELECT {CONFIGURATION_COLUMNS} FROM configurations \
             WHERE key = $1 AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, Configuration>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_configuration(
        &self,
        req: CreateConfigurationRequest,
    ) -> RepoResult<Configuration> {
        let sql = format!(
            "INSERT INTO configurations (key, value, description) VALUES ($1, $2, $3) \
             RETURNING {CONFIGURATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Configuration>(&sql)
            .bind(req.key)
            .bind(req.value)
            .bind(req.description)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_configuration(
        &self,
        id: Uuid,
        req: UpdateConfigurationRequest,
    ) -> RepoResult<Option<Configuration>> {
        let sql = format!(
            "UPDATE configurations SET \
                value = COALESCE($2, value), \
                description = COALESCE($3, description), \
                updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {CONFIGURATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Configuration>(&sql)
            .bind(id)
            .bind(req.value)
            .bind(req.description)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_configuration(&self, id: Uuid) -> RepoResult<bool> {
        self.soft_delete("configurations", id).await
    }

    // --- Integrations ---

    async fn list_integrations(&self, page: PageRequest) -> RepoResult<Page<Integration>> {
        let base =
            format!("SELECT {INTEGRATION_COLUMNS} FROM integrations WHERE deleted_at IS NULL");
        self.fetch_page(&base, |_| {}, "name ASC", page).await
    }

    async fn get_integration(&self, id: Uuid) -> RepoResult<Option<Integration>> {
        let sql = format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations WHERE id = $1 AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, Integration>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_integration_by_name(&self, name: &str) -> RepoResult<Option<Integration>> {
        let sql = format!(
            "SELECT {INTEGRATION_COLUMNS} FROM integrations \
             WHERE name = $1 AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, Integration>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_integration(&self, integration: NewIntegration) -> RepoResult<Integration> {
        let sql = format!(
            "INSERT INTO integrations (name, kind, endpoint_url, enabled) \
             VALUES ($1, $2, $3, $4) RETURNING {INTEGRATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Integration>(&sql)
            .bind(integration.name)
            .bind(integration.kind)
            .bind(integration.endpoint_url)
            .bind(integration.enabled)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_integration(
        &self,
        id: Uuid,
        req: UpdateIntegrationRequest,
    ) -> RepoResult<Option<Integration>> {
        let sql = format!(
            "UPDATE integrations SET \
                name = COALESCE($2, name), \
                endpoint_url = COALESCE($3, endpoint_url), \
                enabled = COALESCE($4, enabled), \
                updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {INTEGRATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Integration>(&sql)
            .bind(id)
            .bind(req.name)
            .bind(req.endpoint_url)
            .bind(req.enabled)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_integration(&self, id: Uuid) -> RepoResult<bool> {
        self.soft_delete("integrations", id).await
    }

    // --- Dashboard ---

    /// get_stats
    ///
    /// One round trip of scalar subqueries; every count honours soft deletion.
    async fn get_stats(&self) -> RepoResult<AdminDashboardStats> {
        let (
            total_members,
            total_communities,
            total_posts,
            total_comments,
            total_votes,
            pending_reports,
        ): (i64, i64, i64, i64, i64, i64) = sqlx::query_as(&format!(
            r#"
            SELECT
                (SELECT COUNT(*) FROM members WHERE deleted_at IS NULL),
                (SELECT COUNT(*) FROM communities WHERE deleted_at IS NULL),
                (SELECT COUNT(*) FROM ({POST_SELECT}) AS active_posts),
                (SELECT COUNT(*) FROM ({COMMENT_SELECT}) AS active_comments),
                (SELECT COUNT(*) FROM post_votes) + (SELECT COUNT(*) FROM comment_votes),
                (SELECT COUNT(*) FROM reports WHERE status = 'pending')
            "#
        ))
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminDashboardStats {
            total_members,
            total_communities,
            total_posts,
            total_comments,
            total_votes,
            pending_reports,
        })
    }
}
