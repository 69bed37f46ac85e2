//! Example probes: field-equality query templates.
//!
//! A probe is built either from a partially populated entity instance
//! (every populated field becomes an equality predicate) or from a single
//! named field. Text predicates compare case-insensitively; everything
//! else compares exactly. Probes are ephemeral — rendered into a WHERE
//! clause or matched in memory, then discarded.

use finpuls_core::{FieldKind, FieldValue, Persistable};

use crate::error::StorageError;

/// One equality predicate of a probe.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    pub value: FieldValue,
}

/// A set of equality predicates over one entity family.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    predicates: Vec<Predicate>,
}

impl Probe {
    /// Build a probe from an example instance: every field whose accessor
    /// yields a value becomes a predicate; absent and blank-text fields
    /// are ignored.
    pub fn of_example<E: Persistable + 'static>(example: &E) -> Self {
        let predicates = E::fields()
            .iter()
            .filter_map(|d| {
                let value = (d.get)(example)?;
                if value.is_blank_text() {
                    return None;
                }
                Some(Predicate { name: d.name, column: d.column, kind: d.kind, value })
            })
            .collect();
        Self { predicates }
    }

    /// Build a single-field probe. Rejects unknown field names and values
    /// whose type does not match the declared column type.
    pub fn of_field<E: Persistable + 'static>(name: &str, value: FieldValue) -> Result<Self, StorageError> {
        let descriptor = E::descriptor(name).ok_or_else(|| {
            StorageError::invalid("field", format!("unknown field '{name}' for {}", E::TABLE))
        })?;
        if value.kind() != descriptor.kind {
            return Err(StorageError::invalid(
                "value",
                format!(
                    "field '{name}' of {} expects {:?}, got {:?}",
                    E::TABLE,
                    descriptor.kind,
                    value.kind()
                ),
            ));
        }
        Ok(Self {
            predicates: vec![Predicate {
                name: descriptor.name,
                column: descriptor.column,
                kind: descriptor.kind,
                value,
            }],
        })
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Render the probe as a SQL WHERE body with placeholders starting at
    /// `$first_param`. Text columns are wrapped in LOWER on both sides.
    pub fn where_clause(&self, first_param: usize) -> String {
        self.predicates
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let n = first_param + i;
                match p.kind {
                    FieldKind::Text => format!("LOWER({}) = LOWER(${n})", p.column),
                    _ => format!("{} = ${n}", p.column),
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Whether an instance matches every predicate (in-memory twin of
    /// `where_clause`).
    pub fn matches<E: Persistable + 'static>(&self, entity: &E) -> bool {
        self.predicates.iter().all(|p| {
            let Some(descriptor) = E::fields().iter().find(|d| d.column == p.column) else {
                return false;
            };
            match (d_value(descriptor, entity), &p.value) {
                (Some(FieldValue::Text(actual)), FieldValue::Text(expected)) => {
                    actual.eq_ignore_ascii_case(expected)
                }
                (Some(actual), expected) => actual == *expected,
                (None, _) => false,
            }
        })
    }
}

fn d_value<E: Persistable>(
    descriptor: &finpuls_core::FieldDescriptor<E>,
    entity: &E,
) -> Option<FieldValue> {
    (descriptor.get)(entity)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use finpuls_core::{FieldDescriptor, Main, Persistable};
    use uuid::Uuid;

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Sample {
        id: Option<Uuid>,
        name: String,
        active: bool,
        rating: Option<i64>,
    }

    impl Persistable for Sample {
        const TABLE: &'static str = "samples";
        type Unit = Main;

        fn id(&self) -> Option<Uuid> {
            self.id
        }

        fn created_at(&self) -> Option<DateTime<Utc>> {
            None
        }

        fn fields() -> &'static [FieldDescriptor<Self>] {
            const FIELDS: &[FieldDescriptor<Sample>] = &[
                FieldDescriptor {
                    name: "name",
                    column: "name",
                    kind: FieldKind::Text,
                    get: |s| Some(FieldValue::Text(s.name.clone())),
                },
                FieldDescriptor {
                    name: "active",
                    column: "is_active",
                    kind: FieldKind::Bool,
                    get: |s| Some(FieldValue::Bool(s.active)),
                },
                FieldDescriptor {
                    name: "rating",
                    column: "rating",
                    kind: FieldKind::Int,
                    get: |s| s.rating.map(FieldValue::Int),
                },
            ];
            FIELDS
        }

        fn stamp(&mut self, id: Uuid, _created_at: DateTime<Utc>, _updated_at: DateTime<Utc>) {
            self.id = Some(id);
        }
    }

    #[test]
    fn example_probe_skips_blank_and_absent_fields() {
        let example = Sample { name: "Acme".into(), ..Default::default() };
        let probe = Probe::of_example(&example);

        // name populated, rating absent; active is a bool so it always
        // participates.
        let names: Vec<_> = probe.predicates().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["name", "active"]);

        let empty = Sample { name: "   ".into(), ..Default::default() };
        let probe = Probe::of_example(&empty);
        assert_eq!(probe.predicates().len(), 1);
        assert_eq!(probe.predicates()[0].name, "active");
    }

    #[test]
    fn where_clause_lowercases_text_only() {
        let example = Sample { name: "Acme".into(), rating: Some(5), ..Default::default() };
        let probe = Probe::of_example(&example);
        assert_eq!(
            probe.where_clause(1),
            "LOWER(name) = LOWER($1) AND is_active = $2 AND rating = $3"
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Probe::of_field::<Sample>("colour", FieldValue::Text("red".into())).unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { field: "field", .. }));
    }

    #[test]
    fn mismatched_value_type_is_rejected() {
        let err = Probe::of_field::<Sample>("name", FieldValue::Int(7)).unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument { field: "value", .. }));
    }

    #[test]
    fn matching_is_case_insensitive_for_text() {
        let probe = Probe::of_field::<Sample>("name", FieldValue::Text("ACME".into())).unwrap();
        let entity = Sample { name: "acme".into(), ..Default::default() };
        assert!(probe.matches(&entity));

        let other = Sample { name: "globex".into(), ..Default::default() };
        assert!(!probe.matches(&other));
    }

    #[test]
    fn matching_is_exact_for_non_text() {
        let probe = Probe::of_field::<Sample>("rating", FieldValue::Int(5)).unwrap();
        assert!(probe.matches(&Sample { rating: Some(5), ..Default::default() }));
        assert!(!probe.matches(&Sample { rating: Some(4), ..Default::default() }));
        assert!(!probe.matches(&Sample { rating: None, ..Default::default() }));
    }
}
