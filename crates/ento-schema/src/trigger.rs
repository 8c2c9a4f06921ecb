//! `CREATE OR REPLACE FUNCTION` + `CREATE TRIGGER`, for both user-declared
//! entity triggers (`ento_model::Trigger`) and the four auto-triggers a
//! `ForeignKeyList` field generates on its referrer and referent (§6).

use ento_model::{Entity, Trigger, TriggerEvent, TriggerTiming};

use crate::naming::{qualify, trigger_function_name};
use crate::statement::SchemaStatement;

fn events_clause(events: &[TriggerEvent]) -> String {
    events.iter().map(TriggerEvent::sql_keyword).collect::<Vec<_>>().join(" OR ")
}

fn timing_keyword(timing: TriggerTiming) -> &'static str {
    match timing {
        TriggerTiming::Before => "BEFORE",
        TriggerTiming::After => "AFTER",
    }
}

/// `CREATE OR REPLACE FUNCTION "func_name"() RETURNS trigger ...` plus the
/// `CREATE TRIGGER` that binds it to `entity`. The function name is derived
/// from `when`/`body` (§6), so re-declaring a trigger with an edited body
/// compiles a differently-named function — `sync`'s diff treats the old
/// name as dropped and the new one as created rather than attempting an
/// in-place `CREATE OR REPLACE` onto a stale name.
pub fn create_trigger(entity: &Entity, trigger: &Trigger) -> SchemaStatement {
    let func_name = trigger_function_name(&entity.name, &trigger.name, trigger.when.as_deref(), &trigger.body);
    let table = qualify(entity.schema.as_deref(), &entity.name);

    let function = format!(
        "CREATE OR REPLACE FUNCTION \"{func_name}\"() RETURNS trigger AS $$\n{}\n$$ LANGUAGE plpgsql;",
        trigger.body
    );

    let when_clause = trigger
        .when
        .as_ref()
        .map(|w| format!(" WHEN ({w})"))
        .unwrap_or_default();

    let create = format!(
        "CREATE TRIGGER \"{}\" {} {} ON {table} FOR EACH ROW{when_clause} EXECUTE FUNCTION \"{func_name}\"();",
        trigger.name,
        timing_keyword(trigger.timing),
        events_clause(&trigger.events),
    );

    let mut statement = SchemaStatement::new(create);
    statement.pre_statements.push(function);
    statement
}

pub fn drop_trigger(entity: &Entity, trigger: &Trigger) -> SchemaStatement {
    let func_name = trigger_function_name(&entity.name, &trigger.name, trigger.when.as_deref(), &trigger.body);
    let table = qualify(entity.schema.as_deref(), &entity.name);
    let mut statement = SchemaStatement::new(format!("DROP TRIGGER \"{}\" ON {table};", trigger.name));
    statement.post_statements.push(format!("DROP FUNCTION \"{func_name}\"();"));
    statement
}

/// A `ForeignKeyList` field declares a one-to-many relation the referent
/// side has no column for; it is enforced entirely by triggers rather than
/// a constraint (§3 "ForeignKeyList", §6). Four triggers are generated per
/// (referrer, referent) pair:
/// - `BEFORE INSERT`/`BEFORE UPDATE` on the referrer, validating the listed
///   keys all exist on the referent;
/// - `AFTER UPDATE`/`AFTER DELETE` on the referent, re-validating that no
///   referrer row was left pointing at a key that just disappeared.
pub fn foreign_key_list_triggers(
    referrer: &Entity,
    referrer_column: &str,
    referent: &Entity,
    referent_column: &str,
) -> Vec<SchemaStatement> {
    let pair_tag = format!("{}_{}", referrer.name, referent.name);

    let validate_body = format!(
        "BEGIN\n  IF NOT (SELECT bool_and(key = ANY(NEW.\"{referrer_column}\")) FROM unnest(NEW.\"{referrer_column}\") AS key WHERE NOT EXISTS (SELECT 1 FROM {referent_table} WHERE \"{referent_column}\" = key)) THEN\n    RAISE EXCEPTION 'foreign_key_list violation on {pair_tag}';\n  END IF;\n  RETURN NEW;\nEND;",
        referent_table = qualify(referent.schema.as_deref(), &referent.name),
    );
    let referrer_trigger = Trigger::new(
        format!("fkl_validate_{pair_tag}"),
        TriggerTiming::Before,
        vec![TriggerEvent::Insert, TriggerEvent::Update],
        validate_body,
    );

    let guard_body = format!(
        "BEGIN\n  IF EXISTS (SELECT 1 FROM {referrer_table} WHERE \"{referrer_column}\" @> ARRAY[OLD.\"{referent_column}\"] AND NOT (\"{referent_column}\" = ANY((SELECT \"{referent_column}\" FROM {referent_table} WHERE \"{referent_column}\" = OLD.\"{referent_column}\"))))) THEN\n    RAISE EXCEPTION 'foreign_key_list violation on {pair_tag}';\n  END IF;\n  RETURN OLD;\nEND;",
        referrer_table = qualify(referrer.schema.as_deref(), &referrer.name),
        referent_table = qualify(referent.schema.as_deref(), &referent.name),
    );
    let referent_trigger = Trigger::new(
        format!("fkl_guard_{pair_tag}"),
        TriggerTiming::After,
        vec![TriggerEvent::Update, TriggerEvent::Delete],
        guard_body,
    );

    vec![
        create_trigger(referrer, &referrer_trigger),
        create_trigger(referent, &referent_trigger),
    ]
}
