//! User accounts.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::columns::{col, flag, nullable, stamp, text, Fallback, Source};
use super::{build_row, Column, EntityMigrator, Outcome, StageContext};
use crate::document::{Document, Value};
use crate::error::{DocError, DocResult};
use crate::kind::EntityKind;
use crate::target::Row;

/// Prefix of password hashes the destination application accepts as-is.
const BCRYPT_PREFIX: &str = "$2";

const BEFORE_PASSWORD: &[Column] = &[
    col("first_name", Source::Field("firstName", Fallback::Text(""))),
    col("last_name", Source::Field("lastName", Fallback::Text(""))),
    text("email"),
    text("phone"),
];

const AFTER_PASSWORD: &[Column] = &[
    col("role", Source::Field("role", Fallback::Text("user"))),
    flag("is_banned", "isBanned", false),
    flag("is_active", "isActive", true),
    stamp("last_login", "lastLogin"),
    col("birth_date", Source::Field("birthDate", Fallback::Null)),
    nullable("gender"),
    stamp("created_at", "createdAt"),
    stamp("updated_at", "updatedAt"),
];

/// Password column value: bcrypt hashes pass through, anything else is
/// replaced by a placeholder hash that forces a reset.
pub fn password_hash(password: &str) -> String {
    if password.starts_with(BCRYPT_PREFIX) {
        return password.to_string();
    }
    let digest = hex::encode(Sha256::digest(password.as_bytes()));
    format!("$2y$12${}", &digest[..22])
}

pub struct UsersMigrator;

#[async_trait]
impl EntityMigrator for UsersMigrator {
    fn kind(&self) -> EntityKind {
        EntityKind::Users
    }

    fn label_field(&self) -> &'static str {
        "email"
    }

    async fn migrate(&mut self, ctx: &mut StageContext<'_>, doc: &Document) -> DocResult<Outcome> {
        let oid = doc.oid()?;

        let password = match doc.get("password") {
            None => ctx.config.default_password.clone(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(DocError::invalid(
                    "password",
                    format!("expected text, found {}", other.to_text()),
                ))
            }
        };

        let row = build_row(ctx, Row::new("users"), BEFORE_PASSWORD, doc)
            .set("password", password_hash(&password));
        let row = build_row(ctx, row, AFTER_PASSWORD, doc);

        let key = ctx.insert_document(EntityKind::Users, oid, row).await?;
        Ok(Outcome::Inserted(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MigrationConfig;
    use crate::document::ID_FIELD;
    use crate::migrate::run_stage;
    use crate::registry::IdentifierRegistry;
    use crate::report::StageReport;
    use crate::target::{MemoryTarget, SqlValue, TargetStore};

    #[test]
    fn test_bcrypt_kept() {
        let hash = "$2y$10$abcdefghijklmnopqrstuv";
        assert_eq!(password_hash(hash), hash);
    }

    #[test]
    fn test_plain_password_replaced() {
        let hash = password_hash("password123");
        assert!(hash.starts_with("$2y$12$"));
        assert_eq!(hash.len(), "$2y$12$".len() + 22);
        // sha256("password123") = ef92b778bafe771e89245b89ecbc08a4...
        assert_eq!(hash, "$2y$12$ef92b778bafe771e89245b");
    }

    #[tokio::test]
    async fn test_users_stage() {
        let target = MemoryTarget::with_destination_schema();
        let mut session = target.open_session().await.unwrap();
        let mut registry = IdentifierRegistry::new();
        let config = MigrationConfig::default();
        let mut ctx = StageContext::new(session.as_mut(), &mut registry, &config);

        let docs = vec![
            Document::new()
                .with(ID_FIELD, Value::oid("u1"))
                .with("email", "a@example.com")
                .with("firstName", "Ayse"),
            Document::new()
                .with(ID_FIELD, Value::oid("u2"))
                .with("email", "b@example.com")
                .with("password", 1234),
        ];
        let mut report = StageReport::new(EntityKind::Users, "User");
        run_stage(&mut UsersMigrator, &mut ctx, &docs, &mut report)
            .await
            .unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.failures[0].label, "b@example.com");
        assert_eq!(registry.resolve(EntityKind::Users, "u1"), Some(1));
        assert_eq!(registry.resolve(EntityKind::Users, "u2"), None);

        let user = target.rows("users").remove(0);
        assert_eq!(user.text("first_name").as_deref(), Some("Ayse"));
        assert_eq!(user.text("last_name").as_deref(), Some(""));
        assert_eq!(user.text("role").as_deref(), Some("user"));
        assert_eq!(user.get("is_banned"), Some(SqlValue::Bool(false)));
        assert_eq!(user.get("birth_date"), Some(SqlValue::Null));
        assert_eq!(
            user.text("password"),
            Some(password_hash("password123"))
        );
    }
}
