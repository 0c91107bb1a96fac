// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed [`Store`].
//!
//! Collections:
//! - `users` (profiles, keyed by URL-encoded auth subject)
//! - `journal_entries` (entries, keyed by entry id; `expiresAt` carries the
//!   TTL policy, so Firestore purges expired entries on its own)

use crate::db::{collections, DateRange, Store};
use crate::error::AppError;
use crate::models::{CohortSample, JournalEntry, User, UserUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::{FirestoreConsistencySelector, FirestoreQueryDirection, FirestoreTimestamp};
use serde::{Deserialize, Serialize};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Document id for a user. Auth subjects contain `|`, which is not safe in
/// every Firestore path context.
fn user_doc_id(subject: &str) -> String {
    urlencoding::encode(subject).into_owned()
}

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastActivePatch {
    #[serde(with = "firestore::serialize_as_timestamp")]
    last_active: DateTime<Utc>,
}

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CohortDoc {
    #[serde(with = "firestore::serialize_as_timestamp")]
    created_at: DateTime<Utc>,
    entry: CohortBody,
}

#[derive(Deserialize)]
struct CohortBody {
    mood: CohortMood,
    #[serde(default)]
    context: CohortContext,
}

#[derive(Deserialize)]
struct CohortMood {
    scale: u8,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CohortContext {
    #[serde(default)]
    stress_level: Option<u8>,
}

impl From<CohortDoc> for CohortSample {
    fn from(doc: CohortDoc) -> Self {
        Self {
            created_at: doc.created_at,
            mood_scale: doc.entry.mood.scale,
            stress_level: doc.entry.context.stress_level,
        }
    }
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client; every operation fails with `Database`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Query a user's entries with optional `createdAt` bounds, newest first.
    async fn query_entries(
        &self,
        user_id: &str,
        range: DateRange,
        page: Option<(u32, u32)>,
    ) -> Result<Vec<JournalEntry>, AppError> {
        let user_id = user_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::JOURNAL_ENTRIES)
            .filter(move |q| {
                q.for_all([
                    q.field("userId").eq(user_id.clone()),
                    range.start.and_then(|start| {
                        q.field("createdAt")
                            .greater_than_or_equal(FirestoreTimestamp(start))
                    }),
                    range
                        .end
                        .and_then(|end| q.field("createdAt").less_than_or_equal(FirestoreTimestamp(end))),
                ])
            })
            .order_by([("createdAt", FirestoreQueryDirection::Descending)]);

        let query = match page {
            Some((limit, offset)) => query.limit(limit).offset(offset),
            None => query,
        };

        query.obj().query().await.map_err(db_err)
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete(&self, ids: &[String], collection: &str) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, subject: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_doc_id(subject))
            .await
            .map_err(db_err)
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_doc_id(&user.auth_subject))
            .object(user)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Read, check and write in one transaction, so a deletion that commits
    /// first is always seen.
    async fn update_user(&self, subject: &str, update: &UserUpdate) -> Result<User, AppError> {
        let client = self.get_client()?;
        let doc_id = user_doc_id(subject);

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );

        let current: Option<User> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(db_err)?;

        let mut user = match current {
            Some(user) if user.is_active() => user,
            found => {
                transaction.rollback().await.map_err(db_err)?;
                return Err(match found {
                    Some(_) => AppError::AccountInactive,
                    None => AppError::NotFound(format!("user {subject}")),
                });
            }
        };

        let paths = update.field_paths();
        if !paths.is_empty() {
            client
                .fluent()
                .update()
                .fields(paths)
                .in_col(collections::USERS)
                .document_id(&doc_id)
                .object(update)
                .add_to_transaction(&mut transaction)
                .map_err(db_err)?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit user update: {}", e)))?;

        update.apply(&mut user);
        Ok(user)
    }

    async fn touch_last_active(&self, subject: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["lastActive"])
            .in_col(collections::USERS)
            .document_id(user_doc_id(subject))
            .object(&LastActivePatch { last_active: at })
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    // ─── Journal Entry Operations ────────────────────────────────

    async fn get_entry(&self, id: &str) -> Result<Option<JournalEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::JOURNAL_ENTRIES)
            .obj()
            .one(id)
            .await
            .map_err(db_err)
    }

    async fn put_entry(&self, entry: &JournalEntry) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::JOURNAL_ENTRIES)
            .document_id(&entry.id)
            .object(entry)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_entry(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::JOURNAL_ENTRIES)
            .document_id(id)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_entries(
        &self,
        user_id: &str,
        range: DateRange,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<JournalEntry>, AppError> {
        self.query_entries(user_id, range, Some((limit, offset)))
            .await
    }

    async fn count_entries(&self, user_id: &str, range: DateRange) -> Result<u64, AppError> {
        let user_id = user_id.to_string();
        let ids: Vec<IdOnly> = self
            .get_client()?
            .fluent()
            .select()
            .fields(["id"])
            .from(collections::JOURNAL_ENTRIES)
            .filter(move |q| {
                q.for_all([
                    q.field("userId").eq(user_id.clone()),
                    range.start.and_then(|start| {
                        q.field("createdAt")
                            .greater_than_or_equal(FirestoreTimestamp(start))
                    }),
                    range
                        .end
                        .and_then(|end| q.field("createdAt").less_than_or_equal(FirestoreTimestamp(end))),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(db_err)?;
        Ok(ids.len() as u64)
    }

    async fn entries_since(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<JournalEntry>, AppError> {
        let range = DateRange {
            start: since,
            end: None,
        };
        self.query_entries(user_id, range, None).await
    }

    async fn cohort_samples(&self, since: DateTime<Utc>) -> Result<Vec<CohortSample>, AppError> {
        let docs: Vec<CohortDoc> = self
            .get_client()?
            .fluent()
            .select()
            .fields(["createdAt", "entry.mood.scale", "entry.context.stressLevel"])
            .from(collections::JOURNAL_ENTRIES)
            .filter(move |q| {
                q.for_all([
                    q.field("privacy.anonymousSharing").eq(true),
                    q.field("createdAt")
                        .greater_than_or_equal(FirestoreTimestamp(since)),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(db_err)?;

        Ok(docs.into_iter().map(CohortSample::from).collect())
    }

    /// Backstop for the TTL policy, which may lag the nominal expiry.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let expired: Vec<IdOnly> = self
            .get_client()?
            .fluent()
            .select()
            .fields(["id"])
            .from(collections::JOURNAL_ENTRIES)
            .filter(move |q| {
                q.field("expiresAt")
                    .less_than_or_equal(FirestoreTimestamp(now))
            })
            .obj()
            .query()
            .await
            .map_err(db_err)?;

        let ids: Vec<String> = expired.into_iter().map(|doc| doc.id).collect();
        self.batch_delete(&ids, collections::JOURNAL_ENTRIES).await?;

        tracing::debug!(count = ids.len(), "Purged expired entries from Firestore");
        Ok(ids.len())
    }
}
