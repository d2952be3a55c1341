// Read-only MySQL analytics store: play sessions (Plan), permission groups (LuckPerms),
// skins (SkinsRestorer). Timestamps are epoch milliseconds.

use crate::config::DatabaseConfig;
use crate::error::{AggregatorError, Source};
use crate::models::{GlobalPlayStats, PermissionRow};
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{QueryBuilder, Row};
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const HOUR_MS: i64 = 60 * 60 * 1000;

pub struct AnalyticsRepo {
    pool: MySqlPool,
    target: String,
    timeout: Duration,
}

impl AnalyticsRepo {
    /// Build the pool without connecting; an unreachable database surfaces per query.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let opts = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_pool_size)
            .acquire_timeout(config.timeout())
            .connect_lazy_with(opts);
        Self {
            pool,
            target: format!("{}:{}/{}", config.host, config.port, config.name),
            timeout: config.timeout(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Four scalar aggregates in one round trip.
    #[instrument(skip(self), fields(repo = "analytics", operation = "global_stats"))]
    pub async fn global_stats(&self, now_ms: i64) -> Result<GlobalPlayStats, AggregatorError> {
        let row = self
            .bounded(
                sqlx::query(
                    r#"
                    SELECT
                        (SELECT COUNT(*) FROM plan_sessions WHERE session_end IS NULL) AS online_count,
                        (SELECT COUNT(*) FROM plan_users) AS total_users,
                        (SELECT COUNT(*) FROM plan_users WHERE registered >= ?) AS new_users,
                        (SELECT CAST(COALESCE(SUM(session_end - session_start), 0) AS SIGNED)
                            FROM plan_sessions WHERE session_end IS NOT NULL) AS total_playtime_ms
                    "#,
                )
                .bind(new_player_cutoff(now_ms))
                .fetch_one(&self.pool),
            )
            .await?;

        let online: i64 = row.try_get("online_count").map_err(|e| self.error(e))?;
        let total: i64 = row.try_get("total_users").map_err(|e| self.error(e))?;
        let new: i64 = row.try_get("new_users").map_err(|e| self.error(e))?;
        let playtime_ms: i64 = row.try_get("total_playtime_ms").map_err(|e| self.error(e))?;
        Ok(GlobalPlayStats {
            online: non_negative(online),
            total_players: non_negative(total),
            new_players: non_negative(new),
            total_playtime_hours: playtime_hours(playtime_ms),
        })
    }

    /// Permission rows for online `names` whose primary group is in `allowed_groups`
    /// (case-insensitive), plus any name listed in `identity_exceptions`.
    #[instrument(skip_all, fields(repo = "analytics", operation = "staff_permissions", names = names.len()))]
    pub async fn staff_permissions(
        &self,
        names: &[String],
        allowed_groups: &[&str],
        identity_exceptions: &[&str],
    ) -> Result<Vec<PermissionRow>, AggregatorError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = staff_permissions_query(names, allowed_groups, identity_exceptions);
        let rows = self.bounded(qb.build().fetch_all(&self.pool)).await?;
        rows.iter()
            .map(|row| -> Result<PermissionRow, sqlx::Error> {
                Ok(PermissionRow {
                    username: row.try_get("username")?,
                    uuid: row.try_get("uuid")?,
                    group: row.try_get("primary_group")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| self.error(e))
    }

    /// Skin identifier per uuid; players without a stored skin are absent.
    #[instrument(skip_all, fields(repo = "analytics", operation = "skins", uuids = uuids.len()))]
    pub async fn skins(
        &self,
        uuids: &[String],
    ) -> Result<HashMap<String, String>, AggregatorError> {
        if uuids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut qb = skins_query(uuids);
        let rows = self.bounded(qb.build().fetch_all(&self.pool)).await?;
        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let uuid: String = row.try_get("uuid").map_err(|e| self.error(e))?;
            let skin: Option<String> = row.try_get("skin_identifier").map_err(|e| self.error(e))?;
            if let Some(skin) = skin.filter(|s| !s.is_empty()) {
                out.insert(uuid, skin);
            }
        }
        Ok(out)
    }

    /// Start of the latest open session per uuid.
    #[instrument(skip_all, fields(repo = "analytics", operation = "session_starts", uuids = uuids.len()))]
    pub async fn session_starts(
        &self,
        uuids: &[String],
    ) -> Result<HashMap<String, i64>, AggregatorError> {
        if uuids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut qb = session_starts_query(uuids);
        let rows = self.bounded(qb.build().fetch_all(&self.pool)).await?;
        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let uuid: String = row.try_get("uuid").map_err(|e| self.error(e))?;
            let start: Option<i64> = row.try_get("session_start").map_err(|e| self.error(e))?;
            if let Some(start) = start {
                out.insert(uuid, start);
            }
        }
        Ok(out)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, AggregatorError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(r) => r.map_err(|e| self.error(e)),
            Err(_) => Err(AggregatorError::Timeout {
                upstream: Source::Database,
                target: self.target.clone(),
            }),
        }
    }

    fn error(&self, e: sqlx::Error) -> AggregatorError {
        match e {
            sqlx::Error::PoolTimedOut => AggregatorError::Timeout {
                upstream: Source::Database,
                target: self.target.clone(),
            },
            other => AggregatorError::unavailable(Source::Database, self.target.clone(), other),
        }
    }
}

/// Lower bound (inclusive) of the "new players" window.
pub fn new_player_cutoff(now_ms: i64) -> i64 {
    now_ms - DAY_MS
}

/// Whole hours, truncated.
pub fn playtime_hours(total_ms: i64) -> u64 {
    non_negative(total_ms / HOUR_MS)
}

fn non_negative(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

/// `names` restricted to the allow-set, OR-ed with the identity exceptions. The OR stays
/// inside the parentheses so rows never widen past `names`.
pub fn staff_permissions_query<'a>(
    names: &'a [String],
    allowed_groups: &[&str],
    identity_exceptions: &[&'a str],
) -> QueryBuilder<'a, MySql> {
    let mut qb = QueryBuilder::new(
        "SELECT username, uuid, primary_group FROM luckperms_players WHERE username IN (",
    );
    push_list(&mut qb, names.iter().map(String::as_str));
    qb.push(") AND (LOWER(primary_group) IN (");
    push_list(&mut qb, allowed_groups.iter().map(|g| g.to_lowercase()));
    qb.push(")");
    if !identity_exceptions.is_empty() {
        qb.push(" OR username IN (");
        push_list(&mut qb, identity_exceptions.iter().copied());
        qb.push(")");
    }
    qb.push(")");
    qb
}

pub fn skins_query(uuids: &[String]) -> QueryBuilder<'_, MySql> {
    let mut qb = QueryBuilder::new("SELECT uuid, skin_identifier FROM sr_players WHERE uuid IN (");
    push_list(&mut qb, uuids.iter().map(String::as_str));
    qb.push(")");
    qb
}

/// Latest open session per uuid.
pub fn session_starts_query(uuids: &[String]) -> QueryBuilder<'_, MySql> {
    let mut qb = QueryBuilder::new(
        "SELECT pu.uuid, MAX(ps.session_start) AS session_start \
         FROM plan_sessions ps JOIN plan_users pu ON ps.user_id = pu.id \
         WHERE ps.session_end IS NULL AND pu.uuid IN (",
    );
    push_list(&mut qb, uuids.iter().map(String::as_str));
    qb.push(") GROUP BY pu.uuid");
    qb
}

fn push_list<'a, I, T>(qb: &mut QueryBuilder<'a, MySql>, values: I)
where
    I: IntoIterator<Item = T>,
    T: 'a + sqlx::Encode<'a, MySql> + sqlx::Type<MySql> + Send,
{
    let mut sep = qb.separated(", ");
    for v in values {
        sep.push_bind(v);
    }
}
