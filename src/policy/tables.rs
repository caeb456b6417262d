use super::{DeleteMode, FieldDef, Grant, OwnerPath, ReadView, ResourcePolicy};
use crate::types::Role;

const STAFF_ANY: &[Grant] = &[Grant::any(Role::Administrator), Grant::any(Role::SuperUser)];

const EVERYONE_ANY: &[Grant] = &[
    Grant::any(Role::Client),
    Grant::any(Role::Administrator),
    Grant::any(Role::SuperUser),
];

const CLIENT_OWNED_STAFF_ANY: &[Grant] = &[
    Grant::owned(Role::Client),
    Grant::any(Role::Administrator),
    Grant::any(Role::SuperUser),
];

const NONE: &[Grant] = &[];

const ATHLETE_OWNER: OwnerPath = OwnerPath::Through {
    noun: "athlete",
    fk: "athlete_id",
    table: "athletes",
    owner: "guardian_id",
};

pub static ATHLETES: ResourcePolicy = ResourcePolicy {
    name: "athlete",
    table: "athletes",
    fields: &[
        FieldDef::text("name", 256).required(),
        FieldDef::text("surnames", 256).required(),
        FieldDef::date("birth_date").required(),
        FieldDef::text("category", 50),
        FieldDef::decimal("weight", 5, 2),
        FieldDef::text("grade", 20),
    ],
    owner: OwnerPath::Direct("guardian_id"),
    parent: Some("guardian_id"),
    delete_mode: DeleteMode::Toggle("active"),
    view: ReadView {
        columns: "t.*",
        joins: "",
        order_by: "surnames, name",
        list_filter: None,
    },
    create: CLIENT_OWNED_STAFF_ANY,
    read: CLIENT_OWNED_STAFF_ANY,
    update: &[
        Grant::owned(Role::Client).writing(&["category", "weight", "grade"]),
        Grant::any(Role::Administrator),
        Grant::any(Role::SuperUser),
    ],
    delete: CLIENT_OWNED_STAFF_ANY,
};

pub static TOURNAMENTS: ResourcePolicy = ResourcePolicy {
    name: "tournament",
    table: "tournaments",
    fields: &[
        FieldDef::text("name", 255).required(),
        FieldDef::date("start_date").required(),
        FieldDef::date("end_date").required(),
        FieldDef::text("venue", 255),
        FieldDef::text("description", 1024),
        FieldDef::decimal("cost", 10, 2),
    ],
    owner: OwnerPath::Unowned,
    parent: None,
    delete_mode: DeleteMode::Hard,
    view: ReadView {
        columns: "t.*",
        joins: "",
        order_by: "start_date, name",
        list_filter: Some("t.end_date >= CURRENT_DATE"),
    },
    create: STAFF_ANY,
    read: EVERYONE_ANY,
    update: STAFF_ANY,
    delete: STAFF_ANY,
};

pub static ENROLLMENTS: ResourcePolicy = ResourcePolicy {
    name: "enrollment",
    table: "enrollments",
    fields: &[
        FieldDef::uuid("athlete_id").required(),
        FieldDef::uuid("tournament_id").required(),
        FieldDef::date("enrollment_date").required(),
        FieldDef::boolean("payment_confirmed"),
    ],
    owner: ATHLETE_OWNER,
    parent: None,
    delete_mode: DeleteMode::Hard,
    view: ReadView {
        columns: "t.*, a.name AS athlete_name, a.surnames AS athlete_surnames, tn.name AS tournament_name",
        joins: "JOIN athletes a ON a.id = t.athlete_id JOIN tournaments tn ON tn.id = t.tournament_id",
        order_by: "enrollment_date DESC",
        list_filter: None,
    },
    create: &[
        Grant::owned(Role::Client).writing(&["athlete_id", "tournament_id", "enrollment_date"]),
        Grant::any(Role::Administrator),
        Grant::any(Role::SuperUser),
    ],
    read: CLIENT_OWNED_STAFF_ANY,
    update: STAFF_ANY,
    delete: STAFF_ANY,
};

pub static PAYMENTS: ResourcePolicy = ResourcePolicy {
    name: "payment",
    table: "payments",
    fields: &[
        FieldDef::uuid("athlete_id").required(),
        FieldDef::text("payment_type", 50).required(),
        FieldDef::decimal("amount", 10, 2).required(),
        FieldDef::date("payment_date").required(),
        FieldDef::text("description", 1024),
    ],
    owner: ATHLETE_OWNER,
    parent: None,
    delete_mode: DeleteMode::Hard,
    view: ReadView {
        columns: "t.*, a.name AS athlete_name, a.surnames AS athlete_surnames",
        joins: "JOIN athletes a ON a.id = t.athlete_id",
        order_by: "payment_date DESC",
        list_filter: None,
    },
    create: STAFF_ANY,
    read: CLIENT_OWNED_STAFF_ANY,
    update: &[
        Grant::any(Role::Administrator).writing(&["payment_type", "amount", "payment_date", "description"]),
        Grant::any(Role::SuperUser).writing(&["payment_type", "amount", "payment_date", "description"]),
    ],
    delete: STAFF_ANY,
};

/// Accounts are created through the authenticator; this table only governs
/// reads, and a client owns exactly its own row.
pub static CLIENTS: ResourcePolicy = ResourcePolicy {
    name: "client",
    table: "users",
    fields: &[],
    owner: OwnerPath::Direct("id"),
    parent: None,
    delete_mode: DeleteMode::Hard,
    view: ReadView {
        columns: "t.id, t.name, t.surnames, t.email, t.phone, t.address, \
                  t.national_id AS \"nationalId\", t.role_id AS \"roleId\", r.name AS \"roleName\"",
        joins: "JOIN roles r ON r.id = t.role_id",
        order_by: "surnames, name",
        list_filter: None,
    },
    create: NONE,
    read: CLIENT_OWNED_STAFF_ANY,
    update: NONE,
    delete: NONE,
};
