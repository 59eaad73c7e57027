//! PostgreSQL implementation of PersistenceGateway
//!
//! Conditional writes are single statements whose WHERE / ON CONFLICT clause
//! encodes the precondition; zero affected rows means the precondition failed.
//! Batches run inside one transaction, so any failure rolls everything back.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnection};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use tracing::instrument;

use ride_core::{
    Cursor, IndexQuery, Page, Participation, PersistenceGateway, Precondition, Record,
    RecordKey, RepoResult, Ride, Snowflake, WriteOp,
};

use crate::models::{ParticipationModel, RideModel};

use super::error::{map_db_error, precondition_failed, sql_limit};

macro_rules! ride_columns {
    () => {
        "id, club_id, title, description, status, scope, audience, start_date_time, \
         estimated_duration_minutes, max_participants, current_participants, waitlist_count, \
         allow_waitlist, is_public, created_by, published_by, published_at, cancellation_reason, \
         created_at, updated_at, version"
    };
}

macro_rules! participation_columns {
    () => {
        "ride_id, user_id, id, club_id, role, status, waitlist_position, message, joined_at, \
         attendance_status, evidence, updated_at, version"
    };
}

const INSERT_RIDE: &str = concat!(
    "INSERT INTO rides (",
    ride_columns!(),
    ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21) \
     ON CONFLICT (id) DO NOTHING"
);

const UPSERT_RIDE: &str = concat!(
    "INSERT INTO rides (",
    ride_columns!(),
    ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21) \
     ON CONFLICT (id) DO UPDATE SET \
        club_id = EXCLUDED.club_id, title = EXCLUDED.title, description = EXCLUDED.description, \
        status = EXCLUDED.status, scope = EXCLUDED.scope, audience = EXCLUDED.audience, \
        start_date_time = EXCLUDED.start_date_time, \
        estimated_duration_minutes = EXCLUDED.estimated_duration_minutes, \
        max_participants = EXCLUDED.max_participants, \
        current_participants = EXCLUDED.current_participants, \
        waitlist_count = EXCLUDED.waitlist_count, allow_waitlist = EXCLUDED.allow_waitlist, \
        is_public = EXCLUDED.is_public, created_by = EXCLUDED.created_by, \
        published_by = EXCLUDED.published_by, published_at = EXCLUDED.published_at, \
        cancellation_reason = EXCLUDED.cancellation_reason, created_at = EXCLUDED.created_at, \
        updated_at = EXCLUDED.updated_at, version = rides.version + 1"
);

const UPDATE_RIDE: &str = r#"
    UPDATE rides
    SET club_id = $2, title = $3, description = $4, status = $5, scope = $6, audience = $7,
        start_date_time = $8, estimated_duration_minutes = $9, max_participants = $10,
        current_participants = $11, waitlist_count = $12, allow_waitlist = $13, is_public = $14,
        created_by = $15, published_by = $16, published_at = $17, cancellation_reason = $18,
        created_at = $19, updated_at = $20, version = $21 + 1
    WHERE id = $1 AND version = $21
"#;

const INSERT_PARTICIPATION: &str = concat!(
    "INSERT INTO ride_participations (",
    participation_columns!(),
    ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
     ON CONFLICT (ride_id, user_id) DO NOTHING"
);

const UPSERT_PARTICIPATION: &str = concat!(
    "INSERT INTO ride_participations (",
    participation_columns!(),
    ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
     ON CONFLICT (ride_id, user_id) DO UPDATE SET \
        id = EXCLUDED.id, club_id = EXCLUDED.club_id, role = EXCLUDED.role, \
        status = EXCLUDED.status, waitlist_position = EXCLUDED.waitlist_position, \
        message = EXCLUDED.message, joined_at = EXCLUDED.joined_at, \
        attendance_status = EXCLUDED.attendance_status, evidence = EXCLUDED.evidence, \
        updated_at = EXCLUDED.updated_at, version = ride_participations.version + 1"
);

const UPDATE_PARTICIPATION: &str = r#"
    UPDATE ride_participations
    SET id = $3, club_id = $4, role = $5, status = $6, waitlist_position = $7, message = $8,
        joined_at = $9, attendance_status = $10, evidence = $11, updated_at = $12,
        version = $13 + 1
    WHERE ride_id = $1 AND user_id = $2 AND version = $13
"#;

const SELECT_RIDE: &str = concat!("SELECT ", ride_columns!(), " FROM rides WHERE id = $1");

const SELECT_PARTICIPATION: &str = concat!(
    "SELECT ",
    participation_columns!(),
    " FROM ride_participations WHERE ride_id = $1 AND user_id = $2"
);

const PARTICIPATIONS_BY_RIDE: &str = concat!(
    "SELECT ",
    participation_columns!(),
    " FROM ride_participations \
     WHERE ride_id = $1 AND ($2::TEXT IS NULL OR status = $2) AND ($3::BIGINT IS NULL OR user_id > $3) \
     ORDER BY user_id LIMIT $4"
);

const PARTICIPATIONS_BY_USER: &str = concat!(
    "SELECT ",
    participation_columns!(),
    " FROM ride_participations \
     WHERE user_id = $1 AND ($2::BIGINT IS NULL OR ride_id > $2) \
     ORDER BY ride_id LIMIT $3"
);

const RIDES_BY_CLUB: &str = concat!(
    "SELECT ",
    ride_columns!(),
    " FROM rides \
     WHERE club_id = $1 AND ($2::TEXT IS NULL OR status = $2) AND ($3::BIGINT IS NULL OR id > $3) \
     ORDER BY id LIMIT $4"
);

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

fn bind_ride(query: PgQuery<'_>, m: RideModel) -> PgQuery<'_> {
    query
        .bind(m.id)
        .bind(m.club_id)
        .bind(m.title)
        .bind(m.description)
        .bind(m.status)
        .bind(m.scope)
        .bind(m.audience)
        .bind(m.start_date_time)
        .bind(m.estimated_duration_minutes)
        .bind(m.max_participants)
        .bind(m.current_participants)
        .bind(m.waitlist_count)
        .bind(m.allow_waitlist)
        .bind(m.is_public)
        .bind(m.created_by)
        .bind(m.published_by)
        .bind(m.published_at)
        .bind(m.cancellation_reason)
        .bind(m.created_at)
        .bind(m.updated_at)
        .bind(m.version)
}

fn bind_participation(query: PgQuery<'_>, m: ParticipationModel) -> PgQuery<'_> {
    query
        .bind(m.ride_id)
        .bind(m.user_id)
        .bind(m.id)
        .bind(m.club_id)
        .bind(m.role)
        .bind(m.status)
        .bind(m.waitlist_position)
        .bind(m.message)
        .bind(m.joined_at)
        .bind(m.attendance_status)
        .bind(m.evidence)
        .bind(m.updated_at)
        .bind(m.version)
}

/// PostgreSQL implementation of PersistenceGateway
#[derive(Clone)]
pub struct PgPersistenceGateway {
    pool: PgPool,
}

impl PgPersistenceGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn apply(conn: &mut PgConnection, op: WriteOp) -> RepoResult<()> {
    match op {
        WriteOp::Put {
            record,
            precondition,
        } => put_record(conn, record, precondition).await,
        WriteOp::Delete { key, precondition } => delete_record(conn, key, precondition).await,
    }
}

async fn put_record(
    conn: &mut PgConnection,
    mut record: Record,
    precondition: Option<Precondition>,
) -> RepoResult<()> {
    let key = record.key();
    if let Some(Precondition::Version(expected)) = precondition {
        // The UPDATE statements compare against the bound version
        record.set_version(expected);
    }

    let query = match &record {
        Record::Ride(ride) => {
            let sql = match precondition {
                None => UPSERT_RIDE,
                Some(Precondition::NotExists) => INSERT_RIDE,
                Some(Precondition::Version(_)) => UPDATE_RIDE,
            };
            bind_ride(sqlx::query(sql), RideModel::from(ride))
        }
        Record::Participation(p) => {
            let sql = match precondition {
                None => UPSERT_PARTICIPATION,
                Some(Precondition::NotExists) => INSERT_PARTICIPATION,
                Some(Precondition::Version(_)) => UPDATE_PARTICIPATION,
            };
            bind_participation(sqlx::query(sql), ParticipationModel::try_from(p)?)
        }
    };

    let result = query.execute(&mut *conn).await.map_err(map_db_error)?;

    if precondition.is_some() && result.rows_affected() == 0 {
        return Err(precondition_failed(key));
    }
    Ok(())
}

async fn delete_record(
    conn: &mut PgConnection,
    key: RecordKey,
    precondition: Option<Precondition>,
) -> RepoResult<()> {
    if precondition == Some(Precondition::NotExists) {
        // Deleting something that must not exist is a pure existence check
        let exists = match key {
            RecordKey::Ride(id) => {
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM rides WHERE id = $1)")
                    .bind(id.into_inner())
                    .fetch_one(&mut *conn)
                    .await
            }
            RecordKey::Participation { ride_id, user_id } => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM ride_participations WHERE ride_id = $1 AND user_id = $2)",
                )
                .bind(ride_id.into_inner())
                .bind(user_id.into_inner())
                .fetch_one(&mut *conn)
                .await
            }
        }
        .map_err(map_db_error)?;

        return if exists { Err(precondition_failed(key)) } else { Ok(()) };
    }

    let expected = match precondition {
        Some(Precondition::Version(v)) => Some(v),
        _ => None,
    };

    let result = match key {
        RecordKey::Ride(id) => {
            sqlx::query("DELETE FROM rides WHERE id = $1 AND ($2::BIGINT IS NULL OR version = $2)")
                .bind(id.into_inner())
                .bind(expected)
                .execute(&mut *conn)
                .await
        }
        RecordKey::Participation { ride_id, user_id } => {
            sqlx::query(
                r#"
                DELETE FROM ride_participations
                WHERE ride_id = $1 AND user_id = $2 AND ($3::BIGINT IS NULL OR version = $3)
                "#,
            )
            .bind(ride_id.into_inner())
            .bind(user_id.into_inner())
            .bind(expected)
            .execute(&mut *conn)
            .await
        }
    }
    .map_err(map_db_error)?;

    if expected.is_some() && result.rows_affected() == 0 {
        return Err(precondition_failed(key));
    }
    Ok(())
}

fn participation_records(rows: Vec<ParticipationModel>) -> RepoResult<Vec<Record>> {
    rows.into_iter()
        .map(|m| Participation::try_from(m).map(Record::Participation))
        .collect()
}

fn ride_records(rows: Vec<RideModel>) -> RepoResult<Vec<Record>> {
    rows.into_iter()
        .map(|m| Ride::try_from(m).map(Record::Ride))
        .collect()
}

#[async_trait]
impl PersistenceGateway for PgPersistenceGateway {
    #[instrument(skip(self))]
    async fn get(&self, key: &RecordKey) -> RepoResult<Option<Record>> {
        match *key {
            RecordKey::Ride(id) => {
                let row = sqlx::query_as::<_, RideModel>(SELECT_RIDE)
                    .bind(id.into_inner())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_db_error)?;
                row.map(|m| Ride::try_from(m).map(Record::Ride)).transpose()
            }
            RecordKey::Participation { ride_id, user_id } => {
                let row = sqlx::query_as::<_, ParticipationModel>(SELECT_PARTICIPATION)
                    .bind(ride_id.into_inner())
                    .bind(user_id.into_inner())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_db_error)?;
                row.map(|m| Participation::try_from(m).map(Record::Participation))
                    .transpose()
            }
        }
    }

    #[instrument(skip(self, record), fields(key = %record.key()))]
    async fn put(&self, record: Record, precondition: Option<Precondition>) -> RepoResult<()> {
        let mut conn = self.pool.acquire().await.map_err(map_db_error)?;
        put_record(&mut *conn, record, precondition).await
    }

    #[instrument(skip(self, cursor))]
    async fn query_by_index(
        &self,
        query: &IndexQuery,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> RepoResult<Page<Record>> {
        let after = cursor
            .map(Cursor::sort_key)
            .transpose()?
            .map(Snowflake::into_inner);
        let fetch = sql_limit(limit.max(1).saturating_add(1));

        let records = match *query {
            IndexQuery::ParticipationsByRide { ride_id, status } => {
                let rows = sqlx::query_as::<_, ParticipationModel>(PARTICIPATIONS_BY_RIDE)
                    .bind(ride_id.into_inner())
                    .bind(status.map(|s| s.as_str()))
                    .bind(after)
                    .bind(fetch)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_db_error)?;
                participation_records(rows)?
            }
            IndexQuery::ParticipationsByUser { user_id } => {
                let rows = sqlx::query_as::<_, ParticipationModel>(PARTICIPATIONS_BY_USER)
                    .bind(user_id.into_inner())
                    .bind(after)
                    .bind(fetch)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_db_error)?;
                participation_records(rows)?
            }
            IndexQuery::RidesByClub { club_id, status } => {
                let rows = sqlx::query_as::<_, RideModel>(RIDES_BY_CLUB)
                    .bind(club_id.into_inner())
                    .bind(status.map(|s| s.as_str()))
                    .bind(after)
                    .bind(fetch)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_db_error)?;
                ride_records(rows)?
            }
        };

        Ok(Page::from_overfetch(query, records, limit))
    }

    #[instrument(skip(self, ops), fields(ops = ops.len()))]
    async fn atomic_multi_write(&self, ops: Vec<WriteOp>) -> RepoResult<()> {
        if ops.is_empty() {
            return Ok(());
        }
        WriteOp::ensure_distinct_keys(&ops)?;

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        for op in ops {
            // Dropping the transaction on error rolls it back
            apply(&mut *tx, op).await?;
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }
}

impl std::fmt::Debug for PgPersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPersistenceGateway").finish_non_exhaustive()
    }
}
