//! Startup provisioning of configured users and their tokens.

use anyhow::{Context, Result, bail};
use shelfwise_core::config::{BootstrapConfig, BootstrapUser};
use shelfwise_metadata::models::{ApiTokenRow, UserRow, db_now};
use shelfwise_metadata::{MetadataError, MetadataStore};
use uuid::Uuid;

/// Normalize a configured token hash: strip an optional `sha256:` prefix and
/// lowercase it to match [`crate::auth::hash_token`].
pub fn normalize_token_hash(raw: &str) -> Result<String> {
    let hash = raw.trim();
    let hash = hash.strip_prefix("sha256:").unwrap_or(hash).to_lowercase();
    if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("invalid token_hash: expected 64 hex chars");
    }
    Ok(hash)
}

/// Ensure every configured user exists with its default shelf and token.
///
/// Safe to run on every start: existing users and tokens are left alone.
pub async fn ensure_bootstrap_users(
    metadata: &dyn MetadataStore,
    config: &BootstrapConfig,
) -> Result<()> {
    for user in &config.users {
        ensure_user(metadata, user)
            .await
            .with_context(|| format!("failed to bootstrap user '{}'", user.id))?;
    }
    Ok(())
}

async fn ensure_user(metadata: &dyn MetadataStore, user: &BootstrapUser) -> Result<()> {
    if user.id.trim().is_empty() || user.username.trim().is_empty() {
        bail!("bootstrap users need a non-empty id and username");
    }
    // Validate before writing anything so a bad hash leaves no half-created user.
    let token_hash = user
        .token_hash
        .as_deref()
        .map(normalize_token_hash)
        .transpose()?;

    if metadata.get_user(&user.id).await?.is_none() {
        let row = UserRow {
            user_id: user.id.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            profile_photo_url: user.profile_photo_url.clone(),
            created_at: db_now(),
        };
        match metadata.create_user(&row).await {
            Ok(shelf) => tracing::info!(
                user_id = %user.id,
                default_shelf_id = %shelf.shelf_id,
                "Bootstrap user created"
            ),
            Err(MetadataError::AlreadyExists(what)) => {
                // Either another instance got there first, or the username or
                // email belongs to someone else.
                if metadata.get_user(&user.id).await?.is_none() {
                    bail!("{what}");
                }
                tracing::debug!(user_id = %user.id, "Bootstrap user already exists");
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        tracing::debug!(user_id = %user.id, "Bootstrap user already exists");
    }

    let Some(hash) = token_hash else {
        return Ok(());
    };

    if let Some(existing) = metadata.get_token_by_hash(&hash).await? {
        if existing.user_id != user.id {
            bail!(
                "token hash is already registered to another user (token id={})",
                existing.token_id
            );
        }
        if existing.revoked_at.is_some() {
            bail!(
                "token hash matches a revoked token (id={}); use a new token hash",
                existing.token_id
            );
        }
        tracing::debug!(user_id = %user.id, "Bootstrap token already registered");
        return Ok(());
    }

    let token = ApiTokenRow {
        token_id: Uuid::new_v4(),
        user_id: user.id.clone(),
        token_hash: hash,
        description: Some("bootstrap".to_string()),
        created_at: db_now(),
        last_used_at: None,
        revoked_at: None,
    };
    metadata.create_token(&token).await?;
    tracing::info!(user_id = %user.id, token_id = %token.token_id, "Bootstrap token created");

    Ok(())
}
