//! The sync planner (C9, §4.4 steps 3–5): turns an unordered [`ChangeOp`]
//! list into an ordered [`SchemaStatement`] script safe to run against a
//! live database — drops of dependents before drops of targets, creates of
//! targets before creates of dependents, foreign keys always layered on
//! last so two new mutually-referencing tables can both exist before either
//! side's `ADD CONSTRAINT` runs (§8 "idempotence": running the same plan
//! twice in a row produces an empty second plan, since the second `diff`
//! finds nothing left to reconcile).

use ento_schema::SchemaStatement;

use crate::diff::{ChangeOp, ConstraintOp};

fn quoted(name: &str) -> String {
    format!("\"{name}\"")
}

fn qualified(schema: &str, name: &str) -> String {
    format!("\"{schema}\".\"{name}\"")
}

/// Render one schema's worth of [`ChangeOp`]s into the fixed category order
/// (§4.4 step 5). `schema` is the single namespace both sides of the diff
/// were scoped to.
pub fn plan(schema: &str, ops: &[ChangeOp]) -> Vec<SchemaStatement> {
    let mut statements = Vec::new();

    for op in ops {
        if let ChangeOp::DropTrigger(trigger) = op {
            let mut s = SchemaStatement::new(format!(
                "DROP TRIGGER {} ON {};",
                quoted(&trigger.name),
                qualified(schema, &trigger.table)
            ));
            s.post_statements.push(format!("DROP FUNCTION {}();", quoted(&trigger.function_name)));
            statements.push(s);
        }
    }
    for op in ops {
        if let ChangeOp::DropIndex(index) = op {
            statements.push(SchemaStatement::new(format!(
                "DROP INDEX {}.{};",
                quoted(schema),
                quoted(&index.name)
            )));
        }
    }
    for op in ops {
        if let ChangeOp::DropConstraint(ConstraintOp::ForeignKey(fk)) = op {
            statements.push(drop_constraint(schema, &fk.table, &fk.name));
        }
    }
    for op in ops {
        match op {
            ChangeOp::DropConstraint(ConstraintOp::Unique(u)) => statements.push(drop_constraint(schema, &u.table, &u.name)),
            ChangeOp::DropConstraint(ConstraintOp::Check(c)) => statements.push(drop_constraint(schema, &c.table, &c.name)),
            _ => {}
        }
    }
    for op in ops {
        if let ChangeOp::DropField { table, column } = op {
            statements.push(SchemaStatement::new(format!(
                "ALTER TABLE {} DROP COLUMN {};",
                qualified(schema, table),
                quoted(column)
            )));
        }
    }
    for op in ops {
        if let ChangeOp::DropEntity(table) = op {
            statements.push(SchemaStatement::new(format!("DROP TABLE {};", qualified(schema, &table.name))));
        }
    }
    for op in ops {
        if let ChangeOp::DropSequence(name) = op {
            statements.push(SchemaStatement::new(format!("DROP SEQUENCE {};", qualified(schema, name))));
        }
    }
    for op in ops {
        if let ChangeOp::DropCompositeType(composite) = op {
            statements.push(SchemaStatement::new(format!("DROP TYPE {};", qualified(schema, &composite.name))));
        }
    }

    for op in ops {
        if let ChangeOp::CreateSequence(name) = op {
            statements.push(SchemaStatement::new(format!("CREATE SEQUENCE {};", qualified(schema, name))));
        }
    }
    for op in ops {
        if let ChangeOp::CreateEntity(table) = op {
            statements.push(create_table_statement(schema, table));
        }
    }
    for op in ops {
        if let ChangeOp::AddField { table, column } = op {
            let not_null = if !column.nullable { " NOT NULL" } else { "" };
            statements.push(SchemaStatement::new(format!(
                "ALTER TABLE {} ADD COLUMN {} {}{not_null};",
                qualified(schema, table),
                quoted(&column.name),
                column.sql_type
            )));
        }
    }
    for op in ops {
        if let ChangeOp::AlterField { table, before, after } = op {
            if !before.sql_type.eq_ignore_ascii_case(&after.sql_type) {
                statements.push(SchemaStatement::new(format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{};",
                    qualified(schema, table),
                    quoted(&after.name),
                    after.sql_type,
                    quoted(&after.name),
                    after.sql_type,
                )));
            }
            if before.nullable != after.nullable {
                let action = if after.nullable { "DROP NOT NULL" } else { "SET NOT NULL" };
                statements.push(SchemaStatement::new(format!(
                    "ALTER TABLE {} ALTER COLUMN {} {action};",
                    qualified(schema, table),
                    quoted(&after.name)
                )));
            }
        }
    }

    for op in ops {
        if let ChangeOp::AddIndex(index) = op {
            let unique = if index.unique { "UNIQUE " } else { "" };
            let columns = index.columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
            statements.push(SchemaStatement::new(format!(
                "CREATE {unique}INDEX {} ON {} ({columns});",
                quoted(&index.name),
                qualified(schema, &index.table)
            )));
        }
    }
    for op in ops {
        if let ChangeOp::AddConstraint(ConstraintOp::Unique(u)) = op {
            let columns = u.columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
            statements.push(SchemaStatement::new(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({columns});",
                qualified(schema, &u.table),
                quoted(&u.name)
            )));
        }
    }
    for op in ops {
        if let ChangeOp::AddConstraint(ConstraintOp::ForeignKey(fk)) = op {
            let columns = fk.columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
            let ref_columns = fk.ref_columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
            statements.push(SchemaStatement::new(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({columns}) REFERENCES {} ({ref_columns});",
                qualified(schema, &fk.table),
                quoted(&fk.name),
                qualified(schema, &fk.ref_table),
            )));
        }
    }

    statements
}

/// Change kinds `plan` deliberately leaves out of its structural script,
/// because rendering them needs the full bound `Entity` — check expressions,
/// trigger bodies, composite-type field lists — none of which survive into
/// the flattened [`crate::reflect::LiveSchema`] a [`ChangeOp`] is built from.
/// [`crate::sync`] renders these straight from the registry via
/// `ento_schema::{add_check, create_trigger, create_composite_type}` for any
/// entity this diff touched.
pub fn needs_entity_render(op: &ChangeOp) -> bool {
    matches!(
        op,
        ChangeOp::AddConstraint(ConstraintOp::Check(_)) | ChangeOp::CreateCompositeType(_) | ChangeOp::AddTrigger(_)
    )
}

fn drop_constraint(schema: &str, table: &str, name: &str) -> SchemaStatement {
    SchemaStatement::new(format!(
        "ALTER TABLE {} DROP CONSTRAINT {};",
        qualified(schema, table),
        quoted(name)
    ))
}

fn create_table_statement(schema: &str, table: &crate::reflect::LiveTable) -> SchemaStatement {
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            let not_null = if !c.nullable { " NOT NULL" } else { "" };
            format!("  {} {}{not_null}", quoted(&c.name), c.sql_type)
        })
        .collect();
    if !table.primary_key.is_empty() {
        let pk = table.primary_key.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
        lines.push(format!("  PRIMARY KEY({pk})"));
    }
    SchemaStatement::new(format!(
        "CREATE TABLE {} (\n{}\n);",
        qualified(schema, &table.name),
        lines.join(",\n")
    ))
}
