use std::collections::BTreeMap;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{DeleteMode, FieldDef, Grant, OwnerPath, PolicyError, ResourcePolicy, Scope};
use crate::config::PolicyConfig;
use crate::database::statement::{quote_identifier, Statement, StatementBuilder};
use crate::types::{Action, Caller};

/// Which rows a read addresses: one row by id and/or the rows nested under a
/// parent id (e.g. the athletes of one client)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selector {
    pub id: Option<Uuid>,
    pub parent: Option<Uuid>,
}

impl Selector {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self { id: Some(id), parent: None }
    }

    pub fn under(parent: Uuid) -> Self {
        Self { id: None, parent: Some(parent) }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }
}

fn uuid_value(id: Uuid) -> Value {
    Value::String(id.to_string())
}

fn push_where(sql: &mut String, clauses: &[String]) {
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
}

impl ResourcePolicy {
    /// Build the read statement for `selector`. A single-row read that comes
    /// back empty means "absent or not visible to the caller".
    pub fn select(&self, caller: &Caller, selector: &Selector) -> Result<Statement, PolicyError> {
        let grant = self.grant(Action::Read, caller.role)?;
        self.check_parent(caller, grant, selector)?;

        let mut b = StatementBuilder::new();
        let mut clauses = self.row_clauses(&mut b, caller, grant, selector)?;
        if selector.id.is_none() {
            if let Some(filter) = self.view.list_filter {
                clauses.push(filter.to_string());
            }
        }

        let mut sql = format!("SELECT {} FROM {} t", self.view.columns, quote_identifier(self.table)?);
        if !self.view.joins.is_empty() {
            sql.push(' ');
            sql.push_str(self.view.joins);
        }
        push_where(&mut sql, &clauses);

        let statement = b.finish(sql);
        Ok(match selector.id {
            Some(_) => statement,
            None => statement.ordered_by(self.view.order_by),
        })
    }

    /// Build the insert for a new row. When the caller may only create rows
    /// it owns through a referenced parent, the ownership check is folded
    /// into the statement and an empty result means the parent is not the
    /// caller's.
    pub fn insert(
        &self,
        caller: &Caller,
        parent: Option<Uuid>,
        payload: &Map<String, Value>,
        options: &PolicyConfig,
    ) -> Result<Statement, PolicyError> {
        let grant = self.grant(Action::Create, caller.role)?;
        let selector = Selector { id: None, parent };
        self.check_parent(caller, grant, &selector)?;

        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.required && payload.get(f.name).map_or(true, Value::is_null))
            .map(|f| f.name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PolicyError::MissingFields(missing));
        }

        let values = self.writable_values(grant, payload, options)?;

        let mut b = StatementBuilder::new();
        let mut columns = Vec::with_capacity(values.len() + 1);
        let mut placeholders = Vec::with_capacity(values.len() + 1);
        for (field, value) in values.iter() {
            columns.push(quote_identifier(field.name)?);
            placeholders.push(b.param(value.clone(), field.kind.cast()));
        }

        match (self.parent, parent, self.owner) {
            (Some(column), Some(parent), _) => {
                columns.push(quote_identifier(column)?);
                placeholders.push(b.param(uuid_value(parent), Some("uuid")));
            }
            (_, _, OwnerPath::Direct(column)) if grant.scope == Scope::Owned => {
                columns.push(quote_identifier(column)?);
                placeholders.push(b.param(uuid_value(caller.user_id), Some("uuid")));
            }
            _ => {}
        }

        let table = quote_identifier(self.table)?;
        let sql = match (grant.scope, self.owner) {
            (Scope::Owned, OwnerPath::Through { fk, table: owner_table, owner, .. }) => {
                let fk_value = values
                    .iter()
                    .find(|(f, _)| f.name == fk)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| PolicyError::MissingFields(vec![fk.to_string()]))?;
                let check = format!(
                    "EXISTS (SELECT 1 FROM {} o WHERE o.\"id\" = {} AND o.{} = {})",
                    quote_identifier(owner_table)?,
                    b.param(fk_value, Some("uuid")),
                    quote_identifier(owner)?,
                    b.param(uuid_value(caller.user_id), Some("uuid")),
                );
                format!(
                    "INSERT INTO {} AS t ({}) SELECT {} WHERE {} RETURNING t.*",
                    table,
                    columns.join(", "),
                    placeholders.join(", "),
                    check
                )
            }
            _ => format!(
                "INSERT INTO {} AS t ({}) VALUES ({}) RETURNING t.*",
                table,
                columns.join(", "),
                placeholders.join(", ")
            ),
        };

        Ok(b.finish(sql))
    }

    /// Build a partial update. Only payload fields the caller's grant may
    /// write are set; an empty result means absent or not owned.
    pub fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        parent: Option<Uuid>,
        payload: &Map<String, Value>,
        options: &PolicyConfig,
    ) -> Result<Statement, PolicyError> {
        let grant = self.grant(Action::Update, caller.role)?;
        let selector = Selector { id: Some(id), parent };
        self.check_parent(caller, grant, &selector)?;

        let values = self.writable_values(grant, payload, options)?;
        if values.is_empty() {
            return Err(PolicyError::NoWritableFields);
        }

        let mut b = StatementBuilder::new();
        let mut assignments = Vec::with_capacity(values.len());
        for (field, value) in values {
            assignments.push(format!(
                "{} = {}",
                quote_identifier(field.name)?,
                b.param(value, field.kind.cast())
            ));
        }
        let clauses = self.row_clauses(&mut b, caller, grant, &selector)?;

        let mut sql = format!(
            "UPDATE {} AS t SET {}",
            quote_identifier(self.table)?,
            assignments.join(", ")
        );
        push_where(&mut sql, &clauses);
        sql.push_str(" RETURNING t.*");

        Ok(b.finish(sql))
    }

    /// Build the delete for one row: a hard delete, or a flip of the toggle
    /// column for soft-deleted resources.
    pub fn delete(&self, caller: &Caller, id: Uuid, parent: Option<Uuid>) -> Result<Statement, PolicyError> {
        let grant = self.grant(Action::Delete, caller.role)?;
        let selector = Selector { id: Some(id), parent };
        self.check_parent(caller, grant, &selector)?;

        let mut b = StatementBuilder::new();
        let clauses = self.row_clauses(&mut b, caller, grant, &selector)?;
        let table = quote_identifier(self.table)?;

        let mut sql = match self.delete_mode {
            DeleteMode::Hard => format!("DELETE FROM {} AS t", table),
            DeleteMode::Toggle(column) => {
                let column = quote_identifier(column)?;
                format!("UPDATE {} AS t SET {} = NOT t.{}", table, column, column)
            }
        };
        push_where(&mut sql, &clauses);
        match self.delete_mode {
            DeleteMode::Hard => sql.push_str(" RETURNING t.\"id\""),
            DeleteMode::Toggle(column) => {
                sql.push_str(&format!(" RETURNING t.\"id\", t.{}", quote_identifier(column)?))
            }
        }

        Ok(b.finish(sql))
    }

    /// A client addressing rows nested under someone else is refused
    /// outright instead of getting an empty result.
    fn check_parent(&self, caller: &Caller, grant: &Grant, selector: &Selector) -> Result<(), PolicyError> {
        if grant.scope != Scope::Owned {
            return Ok(());
        }
        if let (OwnerPath::Direct(owner), Some(column), Some(parent)) = (self.owner, self.parent, selector.parent) {
            if owner == column && parent != caller.user_id {
                return Err(PolicyError::NotOwner(self.name));
            }
        }
        Ok(())
    }

    fn row_clauses(
        &self,
        b: &mut StatementBuilder,
        caller: &Caller,
        grant: &Grant,
        selector: &Selector,
    ) -> Result<Vec<String>, PolicyError> {
        let mut clauses = vec![];
        if let Some(id) = selector.id {
            clauses.push(format!("t.\"id\" = {}", b.param(uuid_value(id), Some("uuid"))));
        }
        if let (Some(column), Some(parent)) = (self.parent, selector.parent) {
            clauses.push(format!(
                "t.{} = {}",
                quote_identifier(column)?,
                b.param(uuid_value(parent), Some("uuid"))
            ));
        }
        if grant.scope == Scope::Owned {
            clauses.push(self.owner_predicate(b, caller)?);
        }
        Ok(clauses)
    }

    fn owner_predicate(&self, b: &mut StatementBuilder, caller: &Caller) -> Result<String, PolicyError> {
        let caller_id = uuid_value(caller.user_id);
        match self.owner {
            OwnerPath::Unowned => Ok("FALSE".to_string()),
            OwnerPath::Direct(column) => Ok(format!(
                "t.{} = {}",
                quote_identifier(column)?,
                b.param(caller_id, Some("uuid"))
            )),
            OwnerPath::Through { fk, table, owner, .. } => Ok(format!(
                "EXISTS (SELECT 1 FROM {} o WHERE o.\"id\" = t.{} AND o.{} = {})",
                quote_identifier(table)?,
                quote_identifier(fk)?,
                quote_identifier(owner)?,
                b.param(caller_id, Some("uuid"))
            )),
        }
    }

    /// Present, non-null payload fields the grant may write, validated and in
    /// table order. Anything else is dropped, or refused when configured.
    fn writable_values(
        &self,
        grant: &Grant,
        payload: &Map<String, Value>,
        options: &PolicyConfig,
    ) -> Result<Vec<(&'static FieldDef, Value)>, PolicyError> {
        let mut values = vec![];
        let mut invalid = BTreeMap::new();
        for field in self.fields.iter().filter(|f| grant.writable.contains(f.name)) {
            match payload.get(field.name) {
                None | Some(Value::Null) => {}
                Some(value) => match field.normalize(value) {
                    Ok(v) => values.push((field, v)),
                    Err(msg) => {
                        invalid.insert(field.name.to_string(), msg);
                    }
                },
            }
        }

        let refused: Vec<String> = payload
            .iter()
            .filter(|(key, value)| !value.is_null() && !values.iter().any(|(f, _)| f.name == key.as_str()))
            .filter(|(key, _)| !invalid.contains_key(key.as_str()))
            .map(|(key, _)| key.clone())
            .collect();
        if !refused.is_empty() {
            if options.reject_unwritable_fields {
                return Err(PolicyError::FieldsNotWritable(refused));
            }
            tracing::debug!(resource = self.name, role = %grant.role, fields = ?refused, "ignoring unwritable fields");
        }

        if !invalid.is_empty() {
            return Err(PolicyError::InvalidFields(invalid));
        }
        Ok(values)
    }

    /// The owning parent a create references, when ownership runs through one
    pub fn owner_noun(&self) -> &'static str {
        match self.owner {
            OwnerPath::Through { noun, .. } => noun,
            _ => self.name,
        }
    }
}
