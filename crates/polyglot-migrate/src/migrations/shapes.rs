// polyglot-migrate/src/migrations/shapes.rs
// ============================================================================
// Module: Table Shapes
// Description: Table definitions as they stand at each point in the history.
// Purpose: Give create, rebuild and revert steps one source for table shapes.
// Dependencies: polyglot-core
// ============================================================================

//! ## Overview
//! Each function returns the complete shape of one table for a given set of
//! applied changes. Rebuilds use these as their target, so the same shape
//! drives `CREATE TABLE` on every dialect and the shadow table on `SQLite`.
//! Columns added later in the history are appended, matching where
//! `ADD COLUMN` places them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use polyglot_core::ColumnKind;
use polyglot_core::ColumnOptions;
use polyglot_core::DialectStrategy;
use polyglot_core::MysqlCollation;
use polyglot_core::ReferentialAction;
use polyglot_core::TableBuilder;
use polyglot_core::TableDef;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default short string width.
const NAME_LENGTH: u32 = 255;
/// Label color width (`#rrggbb`).
const COLOR_LENGTH: u32 = 7;

/// Plan foreign key on `project`.
pub const PROJECT_PLAN_FK: &str = "FK_932b5479e9af5dc8b3c00530062";
/// Index on `project.plan_code`, created where foreign keys are emulated.
pub const PROJECT_PLAN_INDEX: &str = "IDX_932b5479e9af5dc8b3c0053006";
/// Unique index on `project_user (project_id, user_id)`.
pub const PROJECT_USER_INDEX: &str = "IDX_20543d6caa7324ce6706fad2f5";

/// Tables converted by the MySQL encoding fix.
pub const ENCODING_TABLES: [&str; 10] = [
    "migration_ledger",
    "project_locale",
    "translation",
    "project_client",
    "term",
    "project_user",
    "plan",
    "project",
    "user",
    "locale",
];

/// Tables converted by the MySQL collation fix.
pub const COLLATION_TABLES: [&str; 11] = [
    "migration_ledger",
    "project_locale",
    "translation",
    "project_client",
    "term",
    "project_user",
    "plan",
    "project",
    "user",
    "locale",
    "invite",
];

/// Builder over the injected strategy.
type Builder<'a> = TableBuilder<'a, dyn DialectStrategy + 'a>;

/// Short string column kind.
const fn short_text(length: u32) -> ColumnKind {
    ColumnKind::ShortText {
        length,
    }
}

/// Appends the creation and modification timestamps.
fn timestamps(builder: Builder<'_>) -> Builder<'_> {
    builder.column("date_created", ColumnKind::CreatedAt).column("date_modified", ColumnKind::UpdatedAt)
}

// ============================================================================
// SECTION: Users and Projects
// ============================================================================

/// Changes applied to `user`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserShape {
    /// Terms-of-service acceptance columns present.
    pub tos_fields: bool,
    /// Project creation counter present.
    pub project_counter: bool,
    /// Password hash nullable (external identity providers).
    pub nullable_password: bool,
}

/// Returns the `user` table.
#[must_use]
pub fn user_table(strategy: &dyn DialectStrategy, shape: UserShape) -> TableDef {
    let password = if shape.nullable_password {
        ColumnOptions::nullable()
    } else {
        ColumnOptions::not_null()
    };
    let mut builder = TableBuilder::new(strategy, "user")
        .column("id", ColumnKind::Identifier)
        .column("name", short_text(NAME_LENGTH))
        .column("email", short_text(NAME_LENGTH))
        .column_with("encrypted_password", ColumnKind::BinarySecret, &password)
        .column("encrypted_password_reset_token", ColumnKind::BinaryToken)
        .column("password_reset_expires", ColumnKind::Timestamp)
        .column("login_attempts", ColumnKind::Counter)
        .column("last_login", ColumnKind::Timestamp);
    builder = timestamps(builder);
    if shape.tos_fields {
        builder = builder
            .column("tos_and_privacy_accepted_date", ColumnKind::Timestamp)
            .column_with(
                "tos_and_privacy_accepted_version",
                short_text(NAME_LENGTH),
                &ColumnOptions::nullable(),
            );
    }
    if shape.project_counter {
        builder = builder.column("num_projects_created", ColumnKind::Counter);
    }
    builder.primary_key(&["id"]).unique("UQ_user_email", &["email"]).build()
}

/// Changes applied to `project`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectShape {
    /// Quota counters and plan reference present.
    pub plan: bool,
    /// Description column present.
    pub description: bool,
}

/// Returns the `project` table.
#[must_use]
pub fn project_table(strategy: &dyn DialectStrategy, shape: ProjectShape) -> TableDef {
    let mut builder = timestamps(
        TableBuilder::new(strategy, "project")
            .column("id", ColumnKind::Identifier)
            .column("name", short_text(NAME_LENGTH)),
    );
    if shape.plan {
        builder = builder
            .column("terms_count", ColumnKind::Counter)
            .column("locales_count", ColumnKind::Counter)
            .column_with("plan_code", short_text(NAME_LENGTH), &ColumnOptions::nullable())
            .foreign_key(
                PROJECT_PLAN_FK,
                &["plan_code"],
                "plan",
                &["code"],
                ReferentialAction::SetNull,
            );
        if strategy.emulates_foreign_keys() {
            builder = builder.index(PROJECT_PLAN_INDEX, &["plan_code"]);
        }
    }
    if shape.description {
        builder = builder.column_with(
            "description",
            short_text(NAME_LENGTH),
            &ColumnOptions::nullable(),
        );
    }
    builder.primary_key(&["id"]).build()
}

/// Returns the `plan` table.
#[must_use]
pub fn plan_table(strategy: &dyn DialectStrategy) -> TableDef {
    timestamps(
        TableBuilder::new(strategy, "plan")
            .column("code", short_text(NAME_LENGTH))
            .column("name", short_text(NAME_LENGTH))
            .column("max_strings", ColumnKind::Integer),
    )
    .primary_key(&["code"])
    .build()
}

/// Returns the `project_user` table.
#[must_use]
pub fn project_user_table(strategy: &dyn DialectStrategy, with_role: bool) -> TableDef {
    let mut builder = TableBuilder::new(strategy, "project_user")
        .column("id", ColumnKind::Identifier)
        .column("project_id", ColumnKind::IdentifierRef)
        .column("user_id", ColumnKind::IdentifierRef);
    builder = timestamps(builder);
    if with_role {
        builder = builder.column("role", ColumnKind::EnumeratedRole);
    }
    builder
        .primary_key(&["id"])
        .foreign_key(
            "FK_project_user_project",
            &["project_id"],
            "project",
            &["id"],
            ReferentialAction::Cascade,
        )
        .foreign_key("FK_project_user_user", &["user_id"], "user", &["id"], ReferentialAction::Cascade)
        .build()
}

/// Returns the `project_client` table.
#[must_use]
pub fn project_client_table(strategy: &dyn DialectStrategy) -> TableDef {
    timestamps(
        TableBuilder::new(strategy, "project_client")
            .column("id", ColumnKind::Identifier)
            .column("name", short_text(NAME_LENGTH))
            .column("role", ColumnKind::EnumeratedRole)
            .column_with("encrypted_secret", ColumnKind::BinarySecret, &ColumnOptions::not_null())
            .column("project_id", ColumnKind::IdentifierRef),
    )
    .primary_key(&["id"])
    .foreign_key(
        "FK_aed9d0c639a1d484d38bd3d0d74",
        &["project_id"],
        "project",
        &["id"],
        ReferentialAction::Cascade,
    )
    .build()
}

/// Returns the `invite` table.
#[must_use]
pub fn invite_table(strategy: &dyn DialectStrategy) -> TableDef {
    timestamps(
        TableBuilder::new(strategy, "invite")
            .column("id", ColumnKind::Identifier)
            .column("email", short_text(NAME_LENGTH))
            .column("status", ColumnKind::EnumeratedStatus)
            .column("role", ColumnKind::EnumeratedRole)
            .column("project_id", ColumnKind::IdentifierRef),
    )
    .primary_key(&["id"])
    .unique("UQ_invite_project_email", &["project_id", "email"])
    .foreign_key("FK_invite_project", &["project_id"], "project", &["id"], ReferentialAction::Cascade)
    .collation(MysqlCollation::UnicodeCi)
    .build()
}

// ============================================================================
// SECTION: Content
// ============================================================================

/// Returns the `locale` table.
#[must_use]
pub fn locale_table(strategy: &dyn DialectStrategy) -> TableDef {
    TableBuilder::new(strategy, "locale")
        .column("code", short_text(NAME_LENGTH))
        .column("language", short_text(NAME_LENGTH))
        .column("region", short_text(NAME_LENGTH))
        .primary_key(&["code"])
        .build()
}

/// Returns the `project_locale` table.
#[must_use]
pub fn project_locale_table(strategy: &dyn DialectStrategy) -> TableDef {
    timestamps(
        TableBuilder::new(strategy, "project_locale")
            .column("id", ColumnKind::Identifier)
            .column("locale_code", short_text(NAME_LENGTH))
            .column("project_id", ColumnKind::IdentifierRef),
    )
    .primary_key(&["id"])
    .unique("UQ_project_locale", &["project_id", "locale_code"])
    .foreign_key(
        "FK_project_locale_locale",
        &["locale_code"],
        "locale",
        &["code"],
        ReferentialAction::Cascade,
    )
    .foreign_key(
        "FK_project_locale_project",
        &["project_id"],
        "project",
        &["id"],
        ReferentialAction::Cascade,
    )
    .build()
}

/// Returns the `term` table.
#[must_use]
pub fn term_table(strategy: &dyn DialectStrategy, with_context: bool) -> TableDef {
    let mut builder = timestamps(
        TableBuilder::new(strategy, "term")
            .column("id", ColumnKind::Identifier)
            .column("value", short_text(NAME_LENGTH))
            .column("project_id", ColumnKind::IdentifierRef),
    );
    if with_context {
        builder = builder.column_with("context", ColumnKind::LongText, &ColumnOptions::nullable());
    }
    builder
        .primary_key(&["id"])
        .foreign_key("FK_term_project", &["project_id"], "project", &["id"], ReferentialAction::Cascade)
        .build()
}

/// Changes applied to `translation`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationShape {
    /// Surrogate `id` primary key instead of the composite key.
    pub surrogate_id: bool,
    /// Value stored as unbounded text.
    pub long_value: bool,
}

/// Returns the `translation` table.
#[must_use]
pub fn translation_table(strategy: &dyn DialectStrategy, shape: TranslationShape) -> TableDef {
    let value = if shape.long_value { ColumnKind::LongText } else { short_text(NAME_LENGTH) };
    let mut builder = TableBuilder::new(strategy, "translation");
    if shape.surrogate_id {
        builder = builder.column("id", ColumnKind::Identifier);
    }
    builder = builder
        .column("term_id", ColumnKind::IdentifierRef)
        .column("project_locale_id", ColumnKind::IdentifierRef)
        .column("value", value);
    builder = timestamps(builder);
    builder = if shape.surrogate_id {
        builder.primary_key(&["id"])
    } else {
        builder.primary_key(&["term_id", "project_locale_id"])
    };
    builder
        .foreign_key("FK_translation_term", &["term_id"], "term", &["id"], ReferentialAction::Cascade)
        .foreign_key(
            "FK_translation_project_locale",
            &["project_locale_id"],
            "project_locale",
            &["id"],
            ReferentialAction::Cascade,
        )
        .build()
}

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Returns the `label` table.
#[must_use]
pub fn label_table(strategy: &dyn DialectStrategy) -> TableDef {
    TableBuilder::new(strategy, "label")
        .column("id", ColumnKind::Identifier)
        .column("value", short_text(NAME_LENGTH))
        .column("color", short_text(COLOR_LENGTH))
        .column("project_id", ColumnKind::IdentifierRef)
        .primary_key(&["id"])
        .unique("UQ_label_project_value", &["project_id", "value"])
        .foreign_key("FK_label_project", &["project_id"], "project", &["id"], ReferentialAction::Cascade)
        .collation(MysqlCollation::Bin)
        .build()
}

/// Returns the `label_terms_term` join table.
#[must_use]
pub fn label_terms_table(strategy: &dyn DialectStrategy) -> TableDef {
    TableBuilder::new(strategy, "label_terms_term")
        .column("label_id", ColumnKind::IdentifierRef)
        .column("term_id", ColumnKind::IdentifierRef)
        .primary_key(&["label_id", "term_id"])
        .index("IDX_fe6fef74dbcdde7bf8727ea4b9", &["label_id"])
        .index("IDX_f7ce5f99c00bdc74dd42809b6d", &["term_id"])
        .foreign_key(
            "FK_fe6fef74dbcdde7bf8727ea4b96",
            &["label_id"],
            "label",
            &["id"],
            ReferentialAction::Cascade,
        )
        .foreign_key(
            "FK_f7ce5f99c00bdc74dd42809b6dc",
            &["term_id"],
            "term",
            &["id"],
            ReferentialAction::Cascade,
        )
        .collation(MysqlCollation::Bin)
        .build()
}

/// Returns the `label_translations_translation` join table.
#[must_use]
pub fn label_translations_table(strategy: &dyn DialectStrategy) -> TableDef {
    TableBuilder::new(strategy, "label_translations_translation")
        .column("label_id", ColumnKind::IdentifierRef)
        .column("translation_term_id", ColumnKind::IdentifierRef)
        .column("translation_project_locale_id", ColumnKind::IdentifierRef)
        .primary_key(&["label_id", "translation_term_id", "translation_project_locale_id"])
        .index("IDX_957f3fe5cf7454257be8643575", &["label_id"])
        .index(
            "IDX_e23da620cb42782a14167e9dbe",
            &["translation_term_id", "translation_project_locale_id"],
        )
        .foreign_key(
            "FK_957f3fe5cf7454257be8643575c",
            &["label_id"],
            "label",
            &["id"],
            ReferentialAction::Cascade,
        )
        .foreign_key(
            "FK_e23da620cb42782a14167e9dbe7",
            &["translation_term_id", "translation_project_locale_id"],
            "translation",
            &["term_id", "project_locale_id"],
            ReferentialAction::Cascade,
        )
        .collation(MysqlCollation::Bin)
        .build()
}
